//! # Cryptographic Operations Module
//!
//! Key derivation (PBKDF2-HMAC-SHA256), authenticated encryption
//! (AES-256-GCM) and randomness, bundled behind [`CryptoProvider`] so the
//! pipeline receives its crypto as an injected capability.
//!
//! [`SystemProvider`] is the production implementation. Tests substitute
//! providers with fixed salts and nonces to get reproducible containers.

mod aes_gcm;
mod derive;

pub use aes_gcm::AesGcm;
pub use derive::{Derive, fill_random};

use crate::error::Result;
use crate::secret::{DerivedKey, Passphrase};
use crate::types::Iterations;

/// KDF, AEAD and RNG used by one encrypt or decrypt operation.
///
/// Implementations must be stateless or internally synchronised: a single
/// provider may serve independent operations on several threads.
pub trait CryptoProvider: Send + Sync {
    /// Fills `dest` with cryptographically secure random bytes.
    ///
    /// # Errors
    ///
    /// [`crate::Error::CryptoUnavailable`] if no secure randomness is available.
    fn fill_random(&self, dest: &mut [u8]) -> Result<()>;

    /// Stretches `passphrase` with `salt` into a 256-bit key.
    ///
    /// # Errors
    ///
    /// [`crate::Error::EmptyPassphrase`] or [`crate::Error::CryptoUnavailable`].
    fn derive_key(&self, passphrase: &Passphrase, salt: &[u8], iterations: Iterations) -> Result<DerivedKey>;

    /// Returns `ciphertext || tag` for `plaintext`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidParameters`] for a malformed nonce.
    fn seal(&self, key: &DerivedKey, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Verifies the tag and returns the plaintext.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AuthenticationFailed`] on any verification failure.
    fn open(&self, key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// OS randomness, `pbkdf2` and `aes-gcm`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProvider;

impl CryptoProvider for SystemProvider {
    #[inline]
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        fill_random(dest)
    }

    #[inline]
    fn derive_key(&self, passphrase: &Passphrase, salt: &[u8], iterations: Iterations) -> Result<DerivedKey> {
        Derive::new(passphrase)?.derive_key(salt, iterations)
    }

    #[inline]
    fn seal(&self, key: &DerivedKey, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        AesGcm::new(key.expose())?.encrypt(nonce, plaintext)
    }

    #[inline]
    fn open(&self, key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        AesGcm::new(key.expose())?.decrypt(nonce, ciphertext)
    }
}

impl<P: CryptoProvider + ?Sized> CryptoProvider for &P {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        (**self).fill_random(dest)
    }

    fn derive_key(&self, passphrase: &Passphrase, salt: &[u8], iterations: Iterations) -> Result<DerivedKey> {
        (**self).derive_key(passphrase, salt, iterations)
    }

    fn seal(&self, key: &DerivedKey, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        (**self).seal(key, nonce, plaintext)
    }

    fn open(&self, key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        (**self).open(key, nonce, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NONCE_SIZE, SALT_SIZE};
    use crate::error::Error;

    #[test]
    fn test_system_provider_roundtrip() {
        let provider = SystemProvider;
        let pass = Passphrase::new("correct");

        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        provider.fill_random(&mut salt).unwrap();
        provider.fill_random(&mut nonce).unwrap();

        let key = provider.derive_key(&pass, &salt, Iterations::new(1000)).unwrap();
        let sealed = provider.seal(&key, &nonce, b"payload").unwrap();
        assert_eq!(provider.open(&key, &nonce, &sealed).unwrap(), b"payload");
    }

    #[test]
    fn test_system_provider_wrong_key() {
        let provider = SystemProvider;
        let salt = [9u8; SALT_SIZE];
        let nonce = [1u8; NONCE_SIZE];

        let right = provider.derive_key(&Passphrase::new("correct"), &salt, Iterations::new(1000)).unwrap();
        let wrong = provider.derive_key(&Passphrase::new("wrong"), &salt, Iterations::new(1000)).unwrap();

        let sealed = provider.seal(&right, &nonce, b"payload").unwrap();
        assert!(matches!(provider.open(&wrong, &nonce, &sealed), Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_provider_by_reference() {
        fn use_provider<P: CryptoProvider>(p: P) -> Result<()> {
            let mut buf = [0u8; 4];
            p.fill_random(&mut buf)
        }

        let provider = SystemProvider;
        assert!(use_provider(&provider).is_ok());
    }
}
