//! Named binary artifacts on disk.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CbdtError, Result};

/// Serialize a value into an artifact payload.
pub fn encode<T: Serialize>(artifact: &str, value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| CbdtError::persistence(artifact, e))
}

/// Deserialize an artifact payload.
pub fn decode<T: DeserializeOwned>(artifact: &str, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| CbdtError::persistence(artifact, e))
}

/// A directory of bincode artifacts, one `<name>.bin` file per artifact.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `root`. The directory is created on the first save.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        ArtifactStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.bin", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        fs::create_dir_all(&self.root).map_err(|e| CbdtError::persistence(name, e))?;
        let file = File::create(&path).map_err(|e| CbdtError::persistence(name, e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, value).map_err(|e| CbdtError::persistence(name, e))?;
        writer.flush().map_err(|e| CbdtError::persistence(name, e))?;
        log::debug!("Saved artifact '{}' to {}", name, path.display());
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        let file = File::open(&path)
            .map_err(|e| CbdtError::persistence(name, format!("{}: {}", path.display(), e)))?;
        let value = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| CbdtError::persistence(name, e))?;
        log::debug!("Loaded artifact '{}' from {}", name, path.display());
        Ok(value)
    }
}
