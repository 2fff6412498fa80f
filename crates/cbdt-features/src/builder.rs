//! Composition of extractors into a single design matrix.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{FeatureConfig, HarnessConfig};
use crate::data_handling::{train_test_split, SplitOutcome};
use crate::dataset::Dataset;
use crate::error::{CbdtError, Result};
use crate::features::{Feature, FeatureSpec};
use crate::math::{hstack, FeatureMatrix};
use crate::persist::ArtifactStore;

const ARTIFACT_VERSION: u32 = 1;

/// One extractor bound to one dataset field.
pub struct Binding {
    pub feature: Box<dyn Feature>,
    pub field: String,
}

/// Persisted form of a builder. Holds fitted extractor state only, never a
/// built matrix.
#[derive(Serialize, Deserialize)]
struct BuilderArtifact {
    version: u32,
    fingerprint: String,
    config: HarnessConfig,
    bindings: Vec<(FeatureSpec, String)>,
    feature_names: Vec<String>,
}

/// Ordered list of bindings and the result of the last build.
///
/// The combined matrix has the blocks of every binding side by side, in
/// binding order. Each `build` starts from scratch: on failure neither the
/// matrix nor the split of a previous build survive.
pub struct FeatureBuilder {
    bindings: Vec<Binding>,
    config: HarnessConfig,
    build_features: Option<FeatureMatrix>,
    build_features_split: Option<SplitOutcome>,
    feature_names: Vec<String>,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    pub fn with_config(config: HarnessConfig) -> Self {
        FeatureBuilder {
            bindings: Vec::new(),
            config,
            build_features: None,
            build_features_split: None,
            feature_names: Vec::new(),
        }
    }

    /// Builder with one binding per extractor described by `configs`, in order.
    pub fn from_configs(configs: Vec<FeatureConfig>, config: HarnessConfig) -> Result<Self> {
        let mut builder = Self::with_config(config);
        for feature_config in configs {
            for (feature, field) in feature_config.into_features()? {
                builder.add_boxed_feature(feature, &field);
            }
        }
        Ok(builder)
    }

    /// Append a binding of `feature` to the dataset field `field`.
    pub fn add_feature<F: Feature + 'static>(&mut self, feature: F, field: &str) -> &mut Self {
        self.add_boxed_feature(Box::new(feature), field)
    }

    pub fn add_boxed_feature(&mut self, feature: Box<dyn Feature>, field: &str) -> &mut Self {
        self.bindings.push(Binding {
            feature,
            field: field.to_string(),
        });
        self
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn config(&self) -> HarnessConfig {
        self.config
    }

    /// Combined matrix of the last successful build.
    pub fn build_features(&self) -> Option<&FeatureMatrix> {
        self.build_features.as_ref()
    }

    /// Split outcome of the last successful build.
    pub fn build_features_split(&self) -> Option<&SplitOutcome> {
        self.build_features_split.as_ref()
    }

    /// Column names of the last successful build (or of the saved builder
    /// after `load`), in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Transform every binding against `dataset` and concatenate the blocks.
    ///
    /// With `persist_fitted`, unfitted extractors are fitted on the column
    /// they are bound to before transforming; extractors that are already
    /// fitted are reused as they are. Without it every extractor must
    /// already be fitted. Extractors fitted by a failed build are
    /// discarded, leaving the bindings as they were. A train/test split
    /// against `dataset.get_y()` is attempted afterwards; its failure is
    /// recorded, not raised.
    pub fn build(&mut self, dataset: &dyn Dataset, persist_fitted: bool) -> Result<&FeatureMatrix> {
        self.build_features = None;
        self.build_features_split = None;
        self.feature_names.clear();

        let n_rows = dataset.len();
        log::info!(
            "Building features for {} instances from {} bindings",
            n_rows,
            self.bindings.len()
        );

        let columns = self
            .bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| {
                dataset.get_x(&binding.field).ok_or_else(|| CbdtError::MissingField {
                    field: binding.field.clone(),
                    binding: index,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Extractors fitted here stay staged until every block checks out.
        let mut staged: Vec<Option<Box<dyn Feature>>> = Vec::with_capacity(self.bindings.len());
        let mut blocks = Vec::with_capacity(self.bindings.len());
        let mut names = Vec::new();
        for (index, (binding, column)) in self.bindings.iter().zip(&columns).enumerate() {
            let fitted = if persist_fitted && !binding.feature.is_fitted() {
                log::debug!("Fitting {} on '{}'", binding.feature.name(), binding.field);
                let mut feature = binding.feature.clone();
                feature.fit(column)?;
                Some(feature)
            } else {
                None
            };
            let feature = fitted.as_ref().unwrap_or(&binding.feature);
            let block = feature.transform(column)?;
            let block_names = feature.feature_names();
            if block.shape() != (n_rows, block_names.len()) {
                return Err(CbdtError::ColumnMismatch {
                    feature: feature.name(),
                    expected_rows: n_rows,
                    expected_cols: block_names.len(),
                    found_rows: block.nrows(),
                    found_cols: block.ncols(),
                });
            }
            log::debug!(
                "Binding {} ({} on '{}'): {} columns{}",
                index,
                feature.name(),
                binding.field,
                block.ncols(),
                if block.is_sparse() { ", sparse" } else { "" }
            );
            names.extend(block_names);
            blocks.push(block);
            staged.push(fitted);
        }

        let combined = if blocks.is_empty() {
            FeatureMatrix::empty(n_rows)
        } else {
            hstack(&blocks)?
        };
        for (binding, fitted) in self.bindings.iter_mut().zip(staged) {
            if let Some(feature) = fitted {
                binding.feature = feature;
            }
        }

        let split = match dataset.get_y() {
            Some(y) => match train_test_split(&combined, &y, self.config.test_size, self.config.seed) {
                Ok(split) => SplitOutcome::Available(split),
                Err(reason) => SplitOutcome::Unavailable(reason),
            },
            None => SplitOutcome::Unavailable(CbdtError::SplitUnavailable(
                "dataset carries no labels".to_string(),
            )),
        };
        if let Some(reason) = split.reason() {
            log::info!("No train/test split: {}", reason);
        }
        log::info!(
            "Built a {}x{} {} matrix",
            combined.nrows(),
            combined.ncols(),
            if combined.is_sparse() { "sparse" } else { "dense" }
        );

        self.feature_names = names;
        self.build_features_split = Some(split);
        let matrix: &FeatureMatrix = self.build_features.insert(combined);
        Ok(matrix)
    }

    /// SHA-256 over the field, extractor name and column names of every
    /// binding, hex encoded. Identifies the column layout a model was
    /// trained against.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for binding in &self.bindings {
            hasher.update(binding.field.as_bytes());
            hasher.update([0u8]);
            hasher.update(binding.feature.name().as_bytes());
            hasher.update([0u8]);
            for name in binding.feature.feature_names() {
                hasher.update(name.as_bytes());
                hasher.update([0u8]);
            }
            hasher.update([0xffu8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Number of columns the bindings emit in their current state.
    pub fn n_columns(&self) -> usize {
        self.bindings.iter().map(|b| b.feature.feature_names().len()).sum()
    }

    /// Persist the bindings with their fitted state.
    pub fn save(&self, store: &ArtifactStore, name: &str) -> Result<()> {
        let bindings = self
            .bindings
            .iter()
            .map(|b| Ok((b.feature.snapshot()?, b.field.clone())))
            .collect::<Result<Vec<_>>>()?;
        let artifact = BuilderArtifact {
            version: ARTIFACT_VERSION,
            fingerprint: self.fingerprint(),
            config: self.config,
            bindings,
            feature_names: self.feature_names.clone(),
        };
        store.save(name, &artifact)?;
        log::info!("Saved feature builder '{}' ({} bindings)", name, self.bindings.len());
        Ok(())
    }

    /// Restore a builder saved with [`FeatureBuilder::save`].
    ///
    /// The restored extractors are fresh values owned by the returned
    /// builder, and `feature_names` reports the saved column layout. No
    /// matrix is carried over; call `build` to produce one.
    pub fn load(store: &ArtifactStore, name: &str) -> Result<Self> {
        let artifact: BuilderArtifact = store.load(name)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(CbdtError::persistence(
                name,
                format!(
                    "unsupported builder artifact version {} (expected {})",
                    artifact.version, ARTIFACT_VERSION
                ),
            ));
        }
        let mut builder = Self::with_config(artifact.config);
        for (spec, field) in artifact.bindings {
            builder.add_boxed_feature(spec.into_feature(), &field);
        }
        if builder.fingerprint() != artifact.fingerprint {
            return Err(CbdtError::persistence(name, "fingerprint does not match restored bindings"));
        }
        builder.feature_names = artifact.feature_names;
        log::info!("Loaded feature builder '{}' ({} bindings)", name, builder.bindings.len());
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::features::{StatisticKind, TextStatistic};

    #[test]
    fn test_empty_builder_yields_zero_columns() {
        let dataset = InMemoryDataset::with_len(3);
        let mut builder = FeatureBuilder::new();
        let matrix = builder.build(&dataset, true).unwrap();
        assert_eq!(matrix.shape(), (3, 0));
        assert!(builder.feature_names().is_empty());
    }

    #[test]
    fn test_unfitted_without_persist_fails() {
        let dataset = InMemoryDataset::with_len(2).with_field("t", ["a", "b"]);
        let mut builder = FeatureBuilder::new();
        builder.add_feature(TextStatistic::new(StatisticKind::CharacterSum), "t");
        assert!(matches!(builder.build(&dataset, false), Err(CbdtError::NotFitted { .. })));
        assert!(builder.build_features().is_none());
    }

    #[test]
    fn test_fingerprint_depends_on_layout() {
        let mut a = FeatureBuilder::new();
        a.add_feature(TextStatistic::new(StatisticKind::CharacterSum), "t");
        let mut b = FeatureBuilder::new();
        b.add_feature(TextStatistic::new(StatisticKind::CharacterSum), "u");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
        assert_ne!(FeatureBuilder::new().fingerprint(), a.fingerprint());
    }
}
