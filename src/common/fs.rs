use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error if an output file is already present, unless `force` is set.
/// Creates the parent directory when it is missing.
pub fn prepare_output(path: &Path, force: bool) -> Result<()> {
    if path.is_dir() {
        anyhow::bail!("Output path is a directory: {}", path.display());
    }
    if path.exists() && !force {
        anyhow::bail!("Output file already exists (use --force to overwrite): {}", path.display());
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir_exists(parent),
        _ => Ok(()),
    }
}
