use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JksKitError, Result};

/// Where the binary looks for its configuration by default.
pub const DEFAULT_CONFIG_PATH: &str = "build/config.json";

fn default_key_size() -> usize {
    2048
}

/// Issuance settings, read from a JSON document with camelCase keys.
///
/// ```json
/// {
///   "keystore": { "filePath": "build/release.jks", "password": "pw1",
///                 "keyAlias": "testkey", "keyPass": "pw2" },
///   "ca": { "country": "CN", "province": "Yunnan", "organization": "Test",
///           "organizationalUnit": "Build", "commonName": "Test CA",
///           "validityYears": 10 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub keystore: KeystoreConfig,
    pub ca: CaConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreConfig {
    /// Base path; the written file gets a timestamp before its extension.
    pub file_path: PathBuf,
    /// Container password.
    pub password: String,
    pub key_alias: String,
    /// Entry password.
    pub key_pass: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaConfig {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub organizational_unit: String,
    pub common_name: String,
    pub validity_years: i64,
    /// RSA modulus size in bits.
    #[serde(default = "default_key_size")]
    pub key_size: usize,
}

impl Config {
    /// Built-in settings used when no configuration can be loaded.
    pub fn default_config() -> Self {
        Config {
            keystore: KeystoreConfig {
                file_path: PathBuf::from("build/my-release-key.jks"),
                password: "chrelyonly".to_string(),
                key_alias: "chrelyonly".to_string(),
                key_pass: "chrelyonly".to_string(),
            },
            ca: CaConfig {
                country: "CN".to_string(),
                province: "Yunnan".to_string(),
                organization: "chrelyonly".to_string(),
                organizational_unit: "chrelyonly".to_string(),
                common_name: "chrelyonly CA".to_string(),
                validity_years: 100,
                key_size: default_key_size(),
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| JksKitError::ConfigLoad(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| JksKitError::ConfigLoad(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| JksKitError::ConfigLoad(format!("{}: {e}", path.display())))
    }

    /// Loads `path`, falling back to [`Config::default_config`] on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using built-in default configuration");
                Self::default_config()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "keystore": {
            "filePath": "out/test.jks",
            "password": "pw1",
            "keyAlias": "testkey",
            "keyPass": "pw2"
        },
        "ca": {
            "country": "CN",
            "organization": "Test",
            "commonName": "Test CA",
            "validityYears": 10
        }
    }"#;

    #[test]
    fn test_parses_camel_case_document() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.keystore.file_path, PathBuf::from("out/test.jks"));
        assert_eq!(config.keystore.password, "pw1");
        assert_eq!(config.keystore.key_alias, "testkey");
        assert_eq!(config.keystore.key_pass, "pw2");
        assert_eq!(config.ca.country, "CN");
        assert_eq!(config.ca.province, "");
        assert_eq!(config.ca.common_name, "Test CA");
        assert_eq!(config.ca.validity_years, 10);
        assert_eq!(config.ca.key_size, 2048);
    }

    #[test]
    fn test_rejects_incomplete_document() {
        let err = Config::from_json(r#"{"keystore": {}}"#).unwrap_err();
        assert!(matches!(err, JksKitError::ConfigLoad(_)));
    }

    #[test]
    fn test_missing_file_is_config_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, JksKitError::ConfigLoad(_)));
    }

    #[test]
    fn test_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("config.json");
        fs::write(&broken, "{ not json").unwrap();

        assert_eq!(Config::load_or_default(&broken), Config::default_config());
        assert_eq!(
            Config::load_or_default(dir.path().join("missing.json")),
            Config::default_config()
        );
    }

    #[test]
    fn test_default_config_is_stable() {
        let config = Config::default_config();
        assert_eq!(config, Config::default_config());
        assert_eq!(config.ca.validity_years, 100);
        assert_eq!(config.ca.common_name, "chrelyonly CA");
        assert_eq!(
            config.keystore.file_path,
            PathBuf::from("build/my-release-key.jks")
        );
    }

    #[test]
    fn test_serializes_back_to_same_keys() {
        let json = serde_json::to_value(Config::default_config()).unwrap();
        assert_eq!(json["keystore"]["keyAlias"], "chrelyonly");
        assert_eq!(json["ca"]["organizationalUnit"], "chrelyonly");
        assert_eq!(json["ca"]["validityYears"], 100);
    }
}
