/*!
 * Key store configuration
 *
 * Configuration can be built in code or loaded from a JSON file. Paths
 * default to the conventional locations under `~/.gnupg`.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::KeyringResult;
use crate::key_store::KeyStoreFormat;
use crate::protection::ProtectionParams;

/// Settings for opening a key store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStoreConfig {
    pub format: KeyStoreFormat,
    pub path: PathBuf,
    /// Skip validation when keys are added
    #[serde(default)]
    pub disable_validation: bool,
    /// Parameters used when protecting keys of this store
    #[serde(default)]
    pub protection: ProtectionParams,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self::for_format(KeyStoreFormat::Gpg)
    }
}

impl KeyStoreConfig {
    /// Configuration for `format` at its default location
    pub fn for_format(format: KeyStoreFormat) -> Self {
        Self {
            format,
            path: default_keyring_path(format),
            disable_validation: false,
            protection: ProtectionParams::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> KeyringResult<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&data)?;
        log::debug!("Loaded key store configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn to_file(&self, path: impl AsRef<Path>) -> KeyringResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Keyring home directory: `~/.gnupg`, or `./.gnupg` without a home
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gnupg")
}

/// Default keyring location for a format
pub fn default_keyring_path(format: KeyStoreFormat) -> PathBuf {
    let home = default_home();
    match format {
        KeyStoreFormat::Gpg => home.join("pubring.gpg"),
        KeyStoreFormat::Kbx => home.join("pubring.kbx"),
        KeyStoreFormat::G10 => home.join("private-keys-v1.d"),
        KeyStoreFormat::Unknown => home,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_paths() {
        let config = KeyStoreConfig::for_format(KeyStoreFormat::G10);
        assert!(config.path.ends_with("private-keys-v1.d"));
        assert!(KeyStoreConfig::default().path.ends_with("pubring.gpg"));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("keyring.json");
        let mut config = KeyStoreConfig::for_format(KeyStoreFormat::Kbx);
        config.disable_validation = true;
        config.protection = ProtectionParams::low_resource_params();

        config.to_file(&file).unwrap();
        let loaded = KeyStoreConfig::from_file(&file).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("keyring.json");
        std::fs::write(&file, r#"{"format":"G10","path":"/tmp/keys"}"#).unwrap();

        let loaded = KeyStoreConfig::from_file(&file).unwrap();
        assert_eq!(loaded.format, KeyStoreFormat::G10);
        assert!(!loaded.disable_validation);
        assert_eq!(loaded.protection, ProtectionParams::default());
    }
}
