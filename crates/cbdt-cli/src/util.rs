use anyhow::Result;
use std::path::PathBuf;

pub fn validate_jsonl_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("jsonl") | Some("json") => {}
        _ => anyhow::bail!("File must have a .jsonl or .json extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}
