//! Startup configuration for the security subsystem. The cipher key is
//! never hard-coded: the JSON config file declares where it comes from
//! (an environment variable, a key file, or a passphrase-derived key),
//! and a configuration that yields no usable key refuses to load.

use std::fs;
use std::path::{Path, PathBuf};

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroize;

use crate::crypto::cipher::{CipherKey, KEY_LEN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("cipher key unusable: {0}")]
    Key(String),
    #[error("no usable cipher key source configured")]
    MissingKeySource,
}

/// Where the process finds its cipher key. Exactly one source is used,
/// tried in the order the fields are listed here.
#[derive(Debug, Deserialize)]
pub struct KeyConfig {
    /// Base64-encoded 16 byte key stored in an environment variable.
    pub key_env: Option<String>,
    /// Path to a file that contains the base64-encoded key.
    pub key_path: Option<PathBuf>,
    /// Environment variable that stores a local passphrase (for Argon2id KDF).
    pub passphrase_env: Option<String>,
    /// Base64-encoded salt used alongside the passphrase.
    pub salt_b64: Option<String>,
}

impl KeyConfig {
    fn load_key(&self) -> Result<CipherKey, ConfigError> {
        if let Some(var) = &self.key_env {
            let encoded = std::env::var(var).map_err(|e| ConfigError::Key(format!("{e}")))?;
            return decode_key(&encoded);
        }
        if let Some(path) = &self.key_path {
            let content =
                fs::read_to_string(path).map_err(|e| ConfigError::Key(format!("{e}")))?;
            return decode_key(content.trim());
        }
        if let (Some(pass_env), Some(salt_b64)) = (&self.passphrase_env, &self.salt_b64) {
            let passphrase =
                std::env::var(pass_env).map_err(|e| ConfigError::Key(format!("{e}")))?;
            let salt = STANDARD_NO_PAD
                .decode(salt_b64.as_bytes())
                .map_err(|e| ConfigError::Key(format!("{e}")))?;
            return derive_key(&passphrase, &salt);
        }
        Err(ConfigError::MissingKeySource)
    }
}

fn decode_key(encoded: &str) -> Result<CipherKey, ConfigError> {
    let decoded = STANDARD_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| ConfigError::Key(format!("{e}")))?;
    CipherKey::from_bytes(&decoded).map_err(|e| ConfigError::Key(format!("{e}")))
}

/// Derives the cipher key from a local passphrase using Argon2id. The salt
/// must be random and unique per deployment; store it in the config next
/// to the source declaration, never the passphrase itself.
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<CipherKey, ConfigError> {
    let params =
        Params::new(19 * 1024, 3, 1, Some(KEY_LEN)).map_err(|e| ConfigError::Key(format!("{e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut output)
        .map_err(|e| ConfigError::Key(format!("{e}")))?;

    let key = CipherKey::from_bytes(&output).map_err(|e| ConfigError::Key(format!("{e}")))?;
    output.zeroize();
    Ok(key)
}

#[derive(Debug, Deserialize)]
pub struct RawSecurityConfig {
    pub cipher: KeyConfig,
    #[serde(rename = "debugLevel")]
    pub debug_level: Option<String>,
}

/// Resolved startup state: the key is loaded and ready to inject into the
/// cipher; the raw source declaration is no longer needed.
pub struct RuntimeConfig {
    pub cipher_key: CipherKey,
    pub debug_level: Option<String>,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("cipher_key", &"<redacted>")
            .field("debug_level", &self.debug_level)
            .finish()
    }
}

/// Loads the JSON configuration and resolves the cipher key. A broken or
/// absent key source fails here, before any entity is touched.
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig, ConfigError> {
    let raw_json = fs::read_to_string(&path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let raw: RawSecurityConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;

    let cipher_key = raw.cipher.load_key()?;
    Ok(RuntimeConfig {
        cipher_key,
        debug_level: raw.debug_level,
    })
}

#[cfg(test)]
mod tests {
    use super::{load_config, ConfigError};
    use crate::crypto::cipher::FieldCipher;
    use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
    use serde_json::json;
    use std::fs;
    use tempfile::NamedTempFile;

    fn write_config(payload: serde_json::Value) -> NamedTempFile {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), serde_json::to_vec(&payload).unwrap()).unwrap();
        file
    }

    #[test]
    fn loads_key_from_env_var() {
        let var = "ECOTECH_TEST_KEY_FROM_ENV";
        std::env::set_var(var, STANDARD_NO_PAD.encode(b"unit-test-key-16"));

        let file = write_config(json!({
            "cipher": {
                "key_env": var,
                "key_path": null,
                "passphrase_env": null,
                "salt_b64": null
            },
            "debugLevel": "info"
        }));

        let config = load_config(file.path()).expect("config should load");
        assert_eq!(config.debug_level.as_deref(), Some("info"));

        let cipher = FieldCipher::new(config.cipher_key);
        assert_eq!(cipher.decrypt(&cipher.encrypt("probe")).unwrap(), "probe");
    }

    #[test]
    fn loads_key_from_file() {
        let key_file = NamedTempFile::new().expect("temp file");
        fs::write(
            key_file.path(),
            format!("{}\n", STANDARD_NO_PAD.encode(b"unit-test-key-16")),
        )
        .unwrap();

        let file = write_config(json!({
            "cipher": {
                "key_env": null,
                "key_path": key_file.path(),
                "passphrase_env": null,
                "salt_b64": null
            }
        }));

        let config = load_config(file.path()).expect("config should load");
        let cipher = FieldCipher::new(config.cipher_key);
        assert_eq!(cipher.decrypt(&cipher.encrypt("probe")).unwrap(), "probe");
    }

    #[test]
    fn derives_key_from_passphrase() {
        let var = "ECOTECH_TEST_PASSPHRASE";
        std::env::set_var(var, "pa55phrase");

        let payload = json!({
            "cipher": {
                "key_env": null,
                "key_path": null,
                "passphrase_env": var,
                "salt_b64": STANDARD_NO_PAD.encode(b"static-test-salt-123")
            }
        });

        // The derivation is deterministic: two loads must yield the same key.
        let first = load_config(write_config(payload.clone()).path()).expect("config should load");
        let second = load_config(write_config(payload).path()).expect("config should load");

        let first = FieldCipher::new(first.cipher_key);
        let second = FieldCipher::new(second.cipher_key);
        assert_eq!(first.encrypt("probe"), second.encrypt("probe"));
        assert_eq!(first.decrypt(&first.encrypt("probe")).unwrap(), "probe");
    }

    #[test]
    fn refuses_to_load_without_key_source() {
        let file = write_config(json!({
            "cipher": {
                "key_env": null,
                "key_path": null,
                "passphrase_env": null,
                "salt_b64": null
            }
        }));

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKeySource));
    }

    #[test]
    fn rejects_wrong_key_length() {
        let var = "ECOTECH_TEST_SHORT_KEY";
        std::env::set_var(var, STANDARD_NO_PAD.encode(b"too-short"));

        let file = write_config(json!({
            "cipher": {
                "key_env": var,
                "key_path": null,
                "passphrase_env": null,
                "salt_b64": null
            }
        }));

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Key(_)));
    }
}
