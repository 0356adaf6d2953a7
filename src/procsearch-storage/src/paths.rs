//! OS-aware path detection for procsearch storage.
//!
//! - **Windows**: `%APPDATA%\Procsearch\`
//! - **macOS**: `~/Library/Application Support/Procsearch/`
//! - **Linux**: `~/.local/share/Procsearch/`
//!
//! `PROCSEARCH_DATA_DIR` and `PROCSEARCH_CONFIG_DIR` override the data and
//! config locations.

use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, StorageError};

/// Application name used for storage directories.
pub const APP_NAME: &str = "Procsearch";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PROCSEARCH_DATA_DIR";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "PROCSEARCH_CONFIG_DIR";

/// Subdirectory and file names.
pub const CACHE_DIR: &str = "cache";
pub const SESSION_DIR: &str = "session";
pub const LOGS_DIR: &str = "logs";
pub const CATALOG_FILE: &str = "catalog.json";
pub const CONFIG_FILE: &str = "config.toml";

/// Storage paths container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcsearchPaths {
    /// Root data directory (platform-specific).
    pub data_dir: PathBuf,
    /// Persisted record cache.
    pub cache_dir: PathBuf,
    /// Persisted session query state.
    pub session_dir: PathBuf,
    /// Log files.
    pub logs_dir: PathBuf,
    /// The local catalogue.
    pub catalog_path: PathBuf,
}

impl ProcsearchPaths {
    /// Create paths with automatic OS detection.
    pub fn new() -> Result<Self> {
        Ok(Self::from_root(procsearch_data_dir()?))
    }

    /// Create paths under a custom root directory.
    pub fn from_root(data_dir: PathBuf) -> Self {
        Self {
            cache_dir: data_dir.join(CACHE_DIR),
            session_dir: data_dir.join(SESSION_DIR),
            logs_dir: data_dir.join(LOGS_DIR),
            catalog_path: data_dir.join(CATALOG_FILE),
            data_dir,
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.session_dir)?;
        std::fs::create_dir_all(&self.logs_dir)?;
        debug!(data_dir = %self.data_dir.display(), "storage directories initialized");
        Ok(())
    }
}

/// Get the data directory based on the current OS.
pub fn procsearch_data_dir() -> Result<PathBuf> {
    if let Some(path) = env_override(DATA_DIR_ENV) {
        return Ok(path);
    }
    let base = dirs::data_dir().ok_or(StorageError::HomeDirNotFound)?;
    Ok(base.join(APP_NAME))
}

/// Get the config directory based on the current OS.
///
/// - **Windows**: `%APPDATA%\Procsearch\`
/// - **macOS**: `~/Library/Application Support/Procsearch/`
/// - **Linux**: `~/.config/Procsearch/`
pub fn procsearch_config_dir() -> Result<PathBuf> {
    if let Some(path) = env_override(CONFIG_DIR_ENV) {
        return Ok(path);
    }
    let base = dirs::config_dir().ok_or(StorageError::HomeDirNotFound)?;
    Ok(base.join(APP_NAME))
}

/// Path of the default config file.
pub fn config_file() -> Result<PathBuf> {
    Ok(procsearch_config_dir()?.join(CONFIG_FILE))
}

fn env_override(var: &str) -> Option<PathBuf> {
    let val = std::env::var(var).ok().filter(|v| !v.is_empty())?;
    let path = PathBuf::from(val);
    debug!(path = %path.display(), var, "using directory override");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_paths_structure() {
        let paths = ProcsearchPaths::from_root(PathBuf::from("/data/procsearch"));
        assert!(paths.cache_dir.ends_with(CACHE_DIR));
        assert!(paths.session_dir.ends_with(SESSION_DIR));
        assert!(paths.logs_dir.ends_with(LOGS_DIR));
        assert_eq!(paths.catalog_path, PathBuf::from("/data/procsearch/catalog.json"));
    }

    #[test]
    #[serial]
    fn test_data_dir_override() {
        // SAFETY: serialized with the other env tests.
        unsafe { std::env::set_var(DATA_DIR_ENV, "/tmp/procsearch-test") };
        let path = procsearch_data_dir().unwrap();
        unsafe { std::env::remove_var(DATA_DIR_ENV) };
        assert_eq!(path, PathBuf::from("/tmp/procsearch-test"));
    }

    #[test]
    #[serial]
    fn test_empty_override_is_ignored() {
        unsafe { std::env::set_var(CONFIG_DIR_ENV, "") };
        let path = procsearch_config_dir();
        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
        if let Ok(path) = path {
            assert!(path.ends_with(APP_NAME));
        }
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProcsearchPaths::from_root(dir.path().join("root"));
        paths.ensure_dirs().unwrap();
        assert!(paths.cache_dir.is_dir());
        assert!(paths.session_dir.is_dir());
        assert!(paths.logs_dir.is_dir());
    }
}
