pub mod check;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use maestro_config::{load_from_path, Config};

use crate::DEFAULT_FILENAMES;

/// Pick the configuration file: the explicit one, else the first default
/// that exists in the current directory.
pub fn resolve_file(file: Option<String>) -> PathBuf {
    file.map_or_else(
        || {
            DEFAULT_FILENAMES
                .iter()
                .find(|filename| Path::new(filename).exists())
                .map_or_else(|| PathBuf::from(DEFAULT_FILENAMES[0]), PathBuf::from)
        },
        PathBuf::from,
    )
}

pub fn load(file: Option<String>) -> Result<(PathBuf, Config)> {
    let path = resolve_file(file);
    let config = load_from_path(&path)
        .with_context(|| format!("Cannot load config from {}", path.display()))?;
    Ok((path, config))
}
