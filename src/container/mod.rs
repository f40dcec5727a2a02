//! Binary container framing.
//!
//! ```text
//! offset  size   field
//! 0       16     salt
//! 16      12     nonce (AES-GCM IV)
//! 28      2      filename length L (u16, big-endian)
//! 30      L      filename (UTF-8, no terminator)
//! 30+L    rest   ciphertext || tag
//! ```
//!
//! The codec is pure: it never touches cryptography and never allocates a
//! copy of the ciphertext when parsing. The PBKDF2 iteration count is not
//! part of the format.

use std::borrow::Cow;

use crate::config::{NONCE_SIZE, SALT_SIZE};
use crate::error::Result;

mod deserializer;
mod serializer;

/// A parsed or to-be-serialized container borrowing its variable parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container<'a> {
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
    filename: Cow<'a, str>,
    ciphertext: &'a [u8],
}

impl<'a> Container<'a> {
    /// # Errors
    ///
    /// [`crate::Error::FilenameTooLong`] if `filename` exceeds 65535 UTF-8 bytes.
    pub fn new(salt: [u8; SALT_SIZE], nonce: [u8; NONCE_SIZE], filename: &'a str, ciphertext: &'a [u8]) -> Result<Self> {
        serializer::filename_len(filename)?;
        Ok(Self { salt, nonce, filename: Cow::Borrowed(filename), ciphertext })
    }

    #[inline]
    pub const fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    #[inline]
    pub const fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Advisory only: invalid UTF-8 in a parsed container shows up as U+FFFD.
    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[inline]
    pub const fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    /// Length of the serialized form.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        crate::config::HEADER_SIZE + self.filename.len() + self.ciphertext.len()
    }
}

/// Frames the parts into container bytes.
///
/// # Errors
///
/// [`crate::Error::FilenameTooLong`] if `filename` exceeds 65535 UTF-8 bytes.
pub fn serialize(salt: &[u8; SALT_SIZE], nonce: &[u8; NONCE_SIZE], filename: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
    Container::new(*salt, *nonce, filename, ciphertext)?.to_bytes()
}

/// Checks that `filename` fits the 16-bit length field.
///
/// # Errors
///
/// [`crate::Error::FilenameTooLong`] if `filename` exceeds 65535 UTF-8 bytes.
pub fn validate_filename(filename: &str) -> Result<()> {
    serializer::filename_len(filename).map(|_| ())
}

/// Splits container bytes into their parts.
///
/// # Errors
///
/// [`crate::Error::TruncatedHeader`] below 30 bytes,
/// [`crate::Error::TruncatedFilename`] when the filename runs past the end.
pub fn parse(bytes: &[u8]) -> Result<Container<'_>> {
    Container::parse(bytes)
}
