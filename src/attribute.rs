//! Typed wrapper that keeps a confidential field encrypted at rest.
//! Entities hold one `EncryptedAttribute` per protected column (address,
//! phone, email); plaintext exists only in the accessors, and only the
//! ciphertext ever crosses the persistence boundary.

use tracing::warn;

use crate::crypto::cipher::FieldCipher;

/// One logical confidential field. "No data" is its own state: it is
/// stored as absence, never as an encrypted empty string, so rewriting an
/// empty value is idempotent and leaks no cipher artifact.
#[derive(Debug, Clone)]
pub struct EncryptedAttribute {
    field: &'static str,
    ciphertext: Option<Vec<u8>>,
}

impl EncryptedAttribute {
    /// A fresh attribute with no stored value.
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            ciphertext: None,
        }
    }

    /// Rebuilds an attribute from a persisted column. Empty blobs are
    /// normalized to the absent state.
    pub fn from_stored(field: &'static str, stored: Option<Vec<u8>>) -> Self {
        Self {
            field,
            ciphertext: stored.filter(|blob| !blob.is_empty()),
        }
    }

    /// Decrypts and returns the field value, or `""` when nothing is
    /// stored. A blob that fails to decode is logged and degraded to `""`
    /// so record listings keep working over corrupted legacy columns.
    pub fn read(&self, cipher: &FieldCipher) -> String {
        let ciphertext = match &self.ciphertext {
            Some(ciphertext) => ciphertext,
            None => return String::new(),
        };
        match cipher.decrypt(ciphertext) {
            Ok(plaintext) => plaintext,
            Err(error) => {
                warn!(field = self.field, error = %error, "stored ciphertext failed to decode");
                String::new()
            }
        }
    }

    /// Encrypts and stores a new field value, replacing the previous one.
    /// An empty plaintext clears the stored value instead of producing a
    /// pad-only block.
    pub fn write(&mut self, cipher: &FieldCipher, plaintext: &str) {
        self.ciphertext = if plaintext.is_empty() {
            None
        } else {
            Some(cipher.encrypt(plaintext))
        };
    }

    /// Ciphertext to hand to the persistence collaborator, if any.
    pub fn stored(&self) -> Option<&[u8]> {
        self.ciphertext.as_deref()
    }
}
