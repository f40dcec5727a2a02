//! # Key Derivation with PBKDF2
//!
//! Turns a passphrase and a per-file salt into a 256-bit AES key using
//! PBKDF2 with HMAC-SHA256. The iteration count is caller-supplied and is not
//! recorded anywhere in the output, so decryption must be given the same
//! count that encryption used.
//!
//! Salts come from the operating system RNG and are never reused: every
//! encryption draws a fresh one.

use hmac::Hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use tracing::debug;

use crate::config::KEY_SIZE;
use crate::error::{Error, Result};
use crate::secret::{DerivedKey, Passphrase};
use crate::types::Iterations;

/// Passphrase-bound key derivation.
///
/// Holds only a borrow of the passphrase; the derived key is handed out as a
/// [`DerivedKey`] that wipes itself on drop.
pub struct Derive<'a> {
    passphrase: &'a Passphrase,
}

impl<'a> Derive<'a> {
    /// # Errors
    ///
    /// Returns [`Error::EmptyPassphrase`] for an empty passphrase.
    pub fn new(passphrase: &'a Passphrase) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(Error::EmptyPassphrase);
        }
        Ok(Self { passphrase })
    }

    /// Derives a 32-byte key.
    ///
    /// Deterministic: the same passphrase, salt and iteration count always
    /// produce the same key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CryptoUnavailable`] if the HMAC backend rejects the
    /// passphrase as a key, which HMAC-SHA256 never does in practice.
    pub fn derive_key(&self, salt: &[u8], iterations: Iterations) -> Result<DerivedKey> {
        debug!(iterations = iterations.get(), salt_len = salt.len(), "deriving key via pbkdf2-hmac-sha256");

        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(self.passphrase.expose_secret().as_bytes(), salt, iterations.get(), &mut key).map_err(|e| Error::CryptoUnavailable(format!("pbkdf2 failed: {e}")))?;

        let derived = DerivedKey::from_bytes(key);
        zeroize::Zeroize::zeroize(&mut key);

        Ok(derived)
    }
}

/// Fills `dest` from the operating system RNG.
///
/// # Errors
///
/// Returns [`Error::CryptoUnavailable`] if the OS RNG cannot be read.
pub fn fill_random(dest: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(dest).map_err(|e| Error::CryptoUnavailable(format!("rng failed: {e}")))
}
