//! Deterministic field encryption built on AES-128-ECB with PKCS#7 padding.
//!
//! The stored-column format predates this crate: fixed 16-byte blocks, no
//! nonce, no inter-block chaining. Identical plaintexts under the same key
//! therefore always produce identical ciphertext, which makes equal values
//! distinguishable at rest. That weakness is inherited knowingly; columns
//! written by the previous implementation must keep decrypting byte for
//! byte. A migration to an authenticated mode requires rewriting every
//! stored column first.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::Aes128;
use thiserror::Error;
use zeroize::Zeroize;

/// Byte length of an AES-128 key.
pub const KEY_LEN: usize = 16;

/// Cipher block size; every non-empty ciphertext is a multiple of this.
pub const BLOCK_LEN: usize = 16;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid key length; expected {KEY_LEN} bytes")]
    InvalidKeyLength,
}

/// Structural failures while decoding a stored ciphertext. These are
/// recoverable: the attribute layer degrades them to an empty value and
/// the surrounding record flow keeps working.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("ciphertext length {0} is not a multiple of {BLOCK_LEN} bytes")]
    BlockAlignment(usize),
    #[error("padding bytes are inconsistent")]
    InvalidPadding,
    #[error("decrypted bytes are not valid UTF-8")]
    InvalidUtf8,
}

/// Process-wide symmetric key. Built once from configuration, injected
/// into [`FieldCipher`], never persisted. Rotating it invalidates every
/// previously stored ciphertext; there is no key versioning.
pub struct CipherKey([u8; KEY_LEN]);

impl CipherKey {
    /// Builds a key from raw bytes. The key must be 16 bytes for AES-128.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength);
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        // Zero the key material on drop to reduce its lifetime in memory.
        self.0.zeroize();
    }
}

/// Stateless codec for confidential field values. Encryption is a pure
/// function of plaintext and key; safe to share across threads.
pub struct FieldCipher {
    key: CipherKey,
}

impl FieldCipher {
    pub fn new(key: CipherKey) -> Self {
        Self { key }
    }

    /// Encrypts a field value. The plaintext is PKCS#7-padded to a
    /// multiple of [`BLOCK_LEN`] (an empty string still yields one full
    /// pad block) and each block is transformed independently.
    pub fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        Aes128EcbEnc::new(&self.key.0.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes())
    }

    /// Decrypts a stored ciphertext back to the original field value.
    /// An empty input is the "no data" state and yields `Ok("")`.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<String, DecodeError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(DecodeError::BlockAlignment(ciphertext.len()));
        }
        let plaintext = Aes128EcbDec::new(&self.key.0.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| DecodeError::InvalidPadding)?;
        String::from_utf8(plaintext).map_err(|_| DecodeError::InvalidUtf8)
    }
}
