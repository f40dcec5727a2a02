//! Global Configuration Constants
//!
//! Every size, default and label used by the container format, the crypto
//! layer and the CLI lives here. Nothing is read from disk or the
//! environment; runtime choices arrive through command-line flags.

/// Application name used in user interfaces.
pub const APP_NAME: &str = "sealfile";

/// Suffix appended to encrypted files and stripped again on decryption.
pub const FILE_EXTENSION: &str = ".enc";

/// Name used when a container carries an empty filename.
pub const FALLBACK_FILENAME: &str = "decrypted.bin";

// === Key Derivation Parameters ===

/// PBKDF2 iteration count used when the caller supplies none, or supplies
/// something that does not parse to a positive number.
///
/// The count is not stored in the container. Whoever decrypts must pass the
/// same value that was used for encryption.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Length of the PBKDF2 salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

// === AEAD Parameters ===

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

// === Container Layout ===

/// Width of the big-endian filename length field.
pub const FILENAME_LEN_SIZE: usize = 2;

/// Fixed prefix of every container: salt, nonce and filename length.
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE + FILENAME_LEN_SIZE;

/// Largest filename, in UTF-8 bytes, the length field can describe.
pub const MAX_FILENAME_LENGTH: usize = u16::MAX as usize;

// === Progress Weights ===
// Percentages reported when a stage completes. Reading always spans 0..=30.

/// Upper bound of the reading stage.
pub const PROGRESS_READ_END: u8 = 30;

/// Encryption: key derived.
pub const PROGRESS_ENC_DERIVED: u8 = 55;

/// Encryption: plaintext sealed.
pub const PROGRESS_ENC_SEALED: u8 = 85;

/// Decryption: container header parsed.
pub const PROGRESS_DEC_UNFRAMED: u8 = 35;

/// Decryption: key derived.
pub const PROGRESS_DEC_DERIVED: u8 = 60;

/// Decryption: ciphertext opened.
pub const PROGRESS_DEC_OPENED: u8 = 95;

/// Every finished operation ends here.
pub const PROGRESS_DONE: u8 = 100;

// === File I/O ===

/// Read buffer used while loading the input file.
pub const CHUNK_SIZE: usize = 256 * 1024;

// === File Discovery ===

/// Patterns skipped by the interactive file browser.
pub const EXCLUDED_PATTERNS: &[&str] = &[
    "target",       // Rust build artifacts
    "vendor",       // Go/Cargo dependencies
    "node_modules", // Node.js dependencies
    ".git",         // Git repository metadata
    ".github",      // GitHub workflows and metadata
    ".config",      // User configuration files
    ".local",       // Local user data
    ".cache",       // Application cache files
    ".ssh",         // SSH keys and configuration
    ".gnupg",       // GPG keys and configuration
    "*.rs",         // Rust source files
    "*.go",         // Go source files
];
