// SPDX-License-Identifier: Apache-2.0
//! Filesystem-backed [`ConfigStore`], one JSON file per key under the
//! platform config directory.

use crate::store::{ConfigError, ConfigStore};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// Stores configs as `<key>.json` files under the user config
/// directory (e.g. `~/.config/fabcelld` on Linux).
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Resolves the platform config directory and creates it if
    /// absent.
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("com", "fabcell", "fabcelld")
            .ok_or_else(|| ConfigError::Other("could not resolve config directory".to_string()))?;
        Self::at(proj.config_dir().to_path_buf())
    }

    /// Rooted at an explicit directory, for tests and non-default
    /// deployments.
    pub fn at(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().to_path_buf()).unwrap();
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn save_then_load_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().to_path_buf()).unwrap();
        store.save_raw("settings", b"{\"a\":1}").unwrap();
        assert_eq!(store.load_raw("settings").unwrap(), b"{\"a\":1}");
    }
}
