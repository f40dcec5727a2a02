//! sealfile - passphrase file encryption.
//!
//! A file's bytes and its original name are sealed into a single container:
//!
//! - PBKDF2-HMAC-SHA256 stretches the passphrase with a random 16-byte salt
//! - AES-256-GCM encrypts and authenticates the contents with a random 96-bit nonce
//! - the container frames salt, nonce and filename in front of the ciphertext
//!
//! The iteration count is not stored; both sides must agree on it.
//!
//! ```no_run
//! use sealfile::{Iterations, Passphrase};
//!
//! let pass = Passphrase::new("correct horse");
//! let sealed = sealfile::encrypt(b"hello", "a.txt", &pass, Iterations::default())?;
//! let opened = sealfile::decrypt(&sealed.container, &pass, Iterations::default())?;
//! assert_eq!(opened.plaintext, b"hello");
//! # Ok::<(), sealfile::Error>(())
//! ```

pub mod cipher;
pub mod config;
pub mod container;
pub mod error;
pub mod file;
pub mod pipeline;
pub mod secret;
pub mod types;
pub mod ui;

pub use cipher::{CryptoProvider, SystemProvider};
pub use error::{Error, Result};
pub use pipeline::{Opened, Pipeline, Progress, Sealed, Stage};
pub use secret::Passphrase;
pub use types::Iterations;

/// Encrypts with the system provider and no progress reporting.
///
/// # Errors
///
/// See [`Pipeline::encrypt`].
pub fn encrypt(plaintext: &[u8], filename: &str, passphrase: &Passphrase, iterations: Iterations) -> Result<Sealed> {
    Pipeline::new(SystemProvider).encrypt(plaintext, filename, passphrase, iterations)
}

/// Decrypts with the system provider and no progress reporting.
///
/// # Errors
///
/// See [`Pipeline::decrypt`].
pub fn decrypt(container: &[u8], passphrase: &Passphrase, iterations: Iterations) -> Result<Opened> {
    Pipeline::new(SystemProvider).decrypt(container, passphrase, iterations)
}
