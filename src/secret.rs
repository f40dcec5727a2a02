use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::KEY_SIZE;

/// User passphrase, wiped from memory when dropped.
pub struct Passphrase {
    inner: SecretString,
}

impl Passphrase {
    pub fn new(passphrase: &str) -> Self {
        Self { inner: SecretString::from(passphrase.to_owned()) }
    }

    pub fn from_string(passphrase: String) -> Self {
        Self { inner: SecretString::from(passphrase) }
    }

    pub fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl From<SecretString> for Passphrase {
    fn from(secret: SecretString) -> Self {
        Self { inner: secret }
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase([REDACTED])")
    }
}

/// 256-bit key produced by the KDF for exactly one operation.
///
/// Zeroed on drop. Deliberately neither `Clone` nor `Copy`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn expose(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}
