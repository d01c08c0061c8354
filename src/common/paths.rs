//! Configuration and log locations
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/devicefarm-smoke/`
//! - macOS: `~/Library/Application Support/devicefarm-smoke/`
//! - Windows: `%APPDATA%\devicefarm-smoke\`

use std::io;
use std::path::{Path, PathBuf};

/// Application name used for directory lookup
const APP_NAME: &str = "devicefarm-smoke";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Ensure an artifacts directory exists and return it
pub fn ensure_artifacts_dir(dir: &Path) -> io::Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.toml"));
        }
    }

    #[test]
    fn test_ensure_artifacts_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let created = ensure_artifacts_dir(&nested).unwrap();
        assert!(created.is_dir());
        // Idempotent
        ensure_artifacts_dir(&nested).unwrap();
    }
}
