//! Error taxonomy shared by the codec, the crypto layer and the pipeline.
//!
//! None of these errors are transient, so nothing is retried. The binary
//! wraps them in `anyhow` and adds path context.

use thiserror::Error;

use crate::config::MAX_FILENAME_LENGTH;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// The UTF-8 filename does not fit the 16-bit length field.
    #[error("filename is too long: {len} bytes (maximum {max})", max = MAX_FILENAME_LENGTH)]
    FilenameTooLong { len: usize },

    /// Fewer bytes than the fixed salt/nonce/length prefix.
    #[error("file is too short or is not a valid encrypted file")]
    TruncatedHeader,

    /// The length field points past the end of the input.
    #[error("filename metadata is corrupted")]
    TruncatedFilename,

    /// Tag verification failed. Deliberately does not say why.
    #[error("decryption failed: wrong passphrase or corrupted file")]
    AuthenticationFailed,

    /// The platform cannot perform the requested cryptography at all.
    #[error("cryptography is unavailable: {0}")]
    CryptoUnavailable(String),

    /// A key or nonce of the wrong size reached the AEAD layer.
    #[error("invalid cryptographic parameters: {0}")]
    InvalidParameters(&'static str),

    #[error("passphrase cannot be empty")]
    EmptyPassphrase,

    #[error("no input file selected")]
    NoInputSelected,

    #[error("operation cancelled")]
    Cancelled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the process should give up entirely rather than let the user retry.
    #[inline]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CryptoUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_message_is_generic() {
        let msg = Error::AuthenticationFailed.to_string();
        assert!(msg.contains("wrong passphrase"));
        assert!(msg.contains("corrupted"));
    }

    #[test]
    fn test_only_crypto_unavailable_is_fatal() {
        assert!(Error::CryptoUnavailable("rng".into()).is_fatal());
        assert!(!Error::AuthenticationFailed.is_fatal());
        assert!(!Error::TruncatedHeader.is_fatal());
        assert!(!Error::Cancelled.is_fatal());
    }

    #[test]
    fn test_filename_too_long_reports_length() {
        let msg = Error::FilenameTooLong { len: 70_000 }.to_string();
        assert!(msg.contains("70000"));
        assert!(msg.contains("65535"));
    }
}
