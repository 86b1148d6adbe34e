//! Directory-backed tuning loader for `--config-dir`.

use holdout_engine::DataLoader;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads `<name>.json` from a directory; a missing file means built-in defaults.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryLoaderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parsing error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path_for(&self, config_name: &str) -> PathBuf {
        self.root.join(format!("{config_name}.json"))
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

impl DataLoader for DirectoryLoader {
    type Error = DirectoryLoaderError;

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let path = self.path_for(config_name);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("{} not found, using built-in tuning", path.display());
                String::from("{}")
            }
            Err(source) => {
                return Err(DirectoryLoaderError::Io {
                    path: display(&path),
                    source,
                });
            }
        };
        log::debug!("loading {config_name} tuning from {}", path.display());
        serde_json::from_str(&json).map_err(|source| DirectoryLoaderError::Json {
            path: display(&path),
            source,
        })
    }
}
