//! Field-level encryption.
//!
//! Sensitive fields are encrypted with AES-256 in CFB mode. Every call
//! draws a fresh random IV, and the stored form is `hex(iv) + hex(ciphertext)`,
//! so encrypting the same value twice yields different strings.
//!
//! CFB carries no integrity check: decrypting with the wrong key is only
//! detected when the output is not valid UTF-8.

use crate::error::CryptoError;
use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::RngCore;
use std::fmt;
use tracing::debug;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// IV length in bytes.
pub const IV_LEN: usize = 16;

/// Encrypts and decrypts individual record fields with one fixed key.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; KEY_LEN],
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Creates a cipher from raw key bytes.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Parses a 64-character hex key.
    pub fn from_hex(key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(key.trim()).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self::new(key))
    }

    /// Creates a cipher with a freshly generated random key.
    pub fn random() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(key)
    }

    /// The key as lowercase hex.
    pub fn key_hex(&self) -> String {
        hex::encode(self.key)
    }

    /// Encrypts a field. Empty input yields `None`.
    pub fn encrypt(&self, plaintext: &str) -> Option<String> {
        if plaintext.is_empty() {
            return None;
        }

        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut buf = plaintext.as_bytes().to_vec();
        Aes256CfbEnc::new(&self.key.into(), &iv.into()).encrypt(&mut buf);

        debug!("Encrypted field of {} bytes", buf.len());
        Some(format!("{}{}", hex::encode(iv), hex::encode(buf)))
    }

    /// Decrypts a value produced by [`FieldCipher::encrypt`].
    pub fn decrypt(&self, stored: &str) -> Result<String, CryptoError> {
        let stored = stored.trim();
        if stored.len() <= IV_LEN * 2 {
            return Err(CryptoError::MalformedCiphertext(format!(
                "expected more than {} hex characters, got {}",
                IV_LEN * 2,
                stored.len()
            )));
        }
        if !stored.is_ascii() {
            return Err(malformed("non-hex characters"));
        }

        let (iv_hex, body_hex) = stored.split_at(IV_LEN * 2);
        let mut iv = [0u8; IV_LEN];
        hex::decode_to_slice(iv_hex, &mut iv).map_err(malformed)?;
        let mut buf = hex::decode(body_hex).map_err(malformed)?;

        Aes256CfbDec::new(&self.key.into(), &iv.into()).decrypt(&mut buf);

        String::from_utf8(buf).map_err(|_| CryptoError::InvalidUtf8)
    }
}

fn malformed(reason: impl fmt::Display) -> CryptoError {
    CryptoError::MalformedCiphertext(reason.to_string())
}
