//! Common type definitions.
//!
//! - [`ProcessorMode`]: encryption or decryption, as chosen by the user
//! - [`Processing`]: progress-bar label for a running operation
//! - [`Iterations`]: validated PBKDF2 iteration count

use std::fmt::{Display, Formatter, Result};

use strum::{Display as StrumDisplay, EnumIter};

use crate::config::DEFAULT_ITERATIONS;

/// Represents the type of file operation to perform.
///
/// Used to filter files during discovery and determine output path generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, StrumDisplay, EnumIter)]
pub enum ProcessorMode {
    /// Encrypt the file, producing a `.enc` output.
    Encrypt,

    /// Decrypt the file, restoring the name stored in the container.
    Decrypt,
}

impl ProcessorMode {
    #[inline]
    pub const fn processing(self) -> Processing {
        match self {
            Self::Encrypt => Processing::Encryption,
            Self::Decrypt => Processing::Decryption,
        }
    }
}

/// Represents a processing operation in progress.
#[derive(Clone, Copy, Debug)]
pub enum Processing {
    Encryption,
    Decryption,
}

impl Processing {
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Encryption => "Encrypting...",
            Self::Decryption => "Decrypting...",
        }
    }

    #[inline]
    pub const fn mode(self) -> ProcessorMode {
        match self {
            Self::Encryption => ProcessorMode::Encrypt,
            Self::Decryption => ProcessorMode::Decrypt,
        }
    }
}

impl Display for Processing {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// PBKDF2 iteration count. Always positive.
///
/// The count is not stored in the container, so the decrypting side has to
/// supply the same value that was used to encrypt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iterations(u32);

impl Iterations {
    /// Zero falls back to [`DEFAULT_ITERATIONS`].
    #[inline]
    pub const fn new(count: u32) -> Self {
        if count == 0 { Self(DEFAULT_ITERATIONS) } else { Self(count) }
    }

    /// Lenient parse of user input.
    ///
    /// Leading whitespace and an optional sign are accepted, then as many
    /// digits as follow (`"2000 rounds"` is 2000). A `0x`/`0X` prefix switches
    /// to hexadecimal (`"0x10"` is 16). Missing input, input without leading
    /// digits, non-positive values and values above `u32::MAX` all resolve to
    /// the default.
    pub fn parse_lenient(input: Option<&str>) -> Self {
        let Some(input) = input.map(str::trim_start) else {
            return Self::default();
        };

        let (negative, rest) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };

        let (radix, rest) = match rest.get(..2) {
            Some("0x" | "0X") => (16, &rest[2..]),
            _ => (10, rest),
        };

        let digits_end = rest.bytes().position(|b| !char::from(b).is_digit(radix)).unwrap_or(rest.len());
        let digits = &rest[..digits_end];

        if negative || digits.is_empty() {
            return Self::default();
        }

        u32::from_str_radix(digits, radix).map_or_else(|_| Self::default(), Self::new)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Iterations {
    #[inline]
    fn default() -> Self {
        Self(DEFAULT_ITERATIONS)
    }
}

impl Display for Iterations {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.0)
    }
}
