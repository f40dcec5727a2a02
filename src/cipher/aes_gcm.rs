use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::config::{KEY_SIZE, NONCE_SIZE};
use crate::error::{Error, Result};

/// AES-256-GCM with a caller-supplied nonce and no associated data.
///
/// The expanded key schedule and the GHASH key are wiped when this is dropped.
pub struct AesGcm {
    inner: Aes256Gcm,
}

impl AesGcm {
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] unless `key` is exactly 32 bytes.
    #[inline]
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(Error::InvalidParameters("aes-256-gcm key must be 32 bytes"));
        }

        let inner = Aes256Gcm::new_from_slice(key).map_err(|_| Error::InvalidParameters("aes-256-gcm key must be 32 bytes"))?;
        Ok(Self { inner })
    }

    /// Returns `ciphertext || tag`. Empty plaintext yields just the tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] for a nonce that is not 12 bytes.
    #[inline]
    pub fn encrypt(&self, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        Self::check_nonce(nonce)?;
        self.inner.encrypt(Nonce::from_slice(nonce), plaintext).map_err(|e| Error::CryptoUnavailable(format!("aes-gcm encryption failed: {e}")))
    }

    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] when the tag does not verify,
    /// whatever the reason, and [`Error::InvalidParameters`] for a bad nonce.
    #[inline]
    pub fn decrypt(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        Self::check_nonce(nonce)?;
        self.inner.decrypt(Nonce::from_slice(nonce), ciphertext).map_err(|_| Error::AuthenticationFailed)
    }

    fn check_nonce(nonce: &[u8]) -> Result<()> {
        if nonce.len() != NONCE_SIZE {
            return Err(Error::InvalidParameters("aes-gcm nonce must be 12 bytes"));
        }
        Ok(())
    }
}
