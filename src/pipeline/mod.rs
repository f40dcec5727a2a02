//! Encrypt/decrypt orchestration.
//!
//! A [`Pipeline`] composes the injected [`CryptoProvider`] with the container
//! codec. Each operation is strictly sequential; the cancellation token is
//! checked before every stage and the progress reporter is told about every
//! stage transition. Nothing is returned unless the whole operation succeeds.

use std::path::Path;

use flume::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cipher::{CryptoProvider, SystemProvider};
use crate::config::{
    FALLBACK_FILENAME, FILE_EXTENSION, NONCE_SIZE, PROGRESS_DEC_DERIVED, PROGRESS_DEC_OPENED, PROGRESS_DEC_UNFRAMED, PROGRESS_DONE, PROGRESS_ENC_DERIVED, PROGRESS_ENC_SEALED, PROGRESS_READ_END, SALT_SIZE,
};
use crate::container::{self, Container};
use crate::error::{Error, Result};
use crate::secret::Passphrase;
use crate::types::Iterations;

pub mod progress;
mod reader;

pub use progress::{Progress, Stage};
use progress::Reporter;

/// Result of a successful encryption.
#[derive(Debug)]
pub struct Sealed {
    /// Serialized container, ready to be written out.
    pub container: Vec<u8>,

    /// `filename + ".enc"`.
    pub suggested_name: String,
}

/// Result of a successful decryption.
#[derive(Debug)]
pub struct Opened {
    pub plaintext: Vec<u8>,

    /// Filename exactly as stored in the container (lossily decoded).
    pub original_name: String,

    /// `original_name` minus a trailing `.enc`, or `decrypted.bin` if empty.
    pub suggested_name: String,
}

/// Sequential encrypt/decrypt orchestrator.
pub struct Pipeline<P = SystemProvider> {
    provider: P,
    reporter: Reporter,
    cancel: CancellationToken,
}

impl Default for Pipeline<SystemProvider> {
    fn default() -> Self {
        Self::new(SystemProvider)
    }
}

impl<P: CryptoProvider> Pipeline<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, reporter: Reporter::default(), cancel: CancellationToken::new() }
    }

    /// Sends a [`Progress`] event to `sender` on every stage transition.
    #[must_use]
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.reporter = Reporter::new(Some(sender));
        self
    }

    /// Aborts with [`Error::Cancelled`] at the next stage boundary once `token` fires.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Seals `plaintext` into a container carrying `filename`.
    ///
    /// A fresh salt and nonce are drawn from the provider for every call.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyPassphrase`], [`Error::FilenameTooLong`],
    /// [`Error::Cancelled`], or whatever the provider reports.
    pub fn encrypt(&self, plaintext: &[u8], filename: &str, passphrase: &Passphrase, iterations: Iterations) -> Result<Sealed> {
        let result = self.run_encrypt(plaintext, filename, passphrase, iterations);
        self.finish(result)
    }

    /// Opens a container produced by [`Pipeline::encrypt`].
    ///
    /// The header is parsed before any key derivation so malformed input
    /// fails fast. `iterations` must match the value used for encryption;
    /// a mismatch is indistinguishable from a wrong passphrase.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyPassphrase`], [`Error::TruncatedHeader`],
    /// [`Error::TruncatedFilename`], [`Error::AuthenticationFailed`],
    /// [`Error::Cancelled`].
    pub fn decrypt(&self, container: &[u8], passphrase: &Passphrase, iterations: Iterations) -> Result<Opened> {
        let result = self.run_decrypt(container, passphrase, iterations);
        self.finish(result)
    }

    /// Reads `input` and encrypts it under its own file name.
    ///
    /// # Errors
    ///
    /// [`Error::NoInputSelected`] when `input` is `None`, [`Error::Io`] on
    /// read failure, plus everything [`Pipeline::encrypt`] returns.
    pub async fn encrypt_file(&self, input: Option<&Path>, passphrase: &Passphrase, iterations: Iterations) -> Result<Sealed> {
        let result = self.run_encrypt_file(input, passphrase, iterations).await;
        self.finish(result)
    }

    /// Reads the container at `input` and decrypts it.
    ///
    /// # Errors
    ///
    /// [`Error::NoInputSelected`] when `input` is `None`, [`Error::Io`] on
    /// read failure, plus everything [`Pipeline::decrypt`] returns.
    pub async fn decrypt_file(&self, input: Option<&Path>, passphrase: &Passphrase, iterations: Iterations) -> Result<Opened> {
        let result = self.run_decrypt_file(input, passphrase, iterations).await;
        self.finish(result)
    }

    async fn run_encrypt_file(&self, input: Option<&Path>, passphrase: &Passphrase, iterations: Iterations) -> Result<Sealed> {
        let path = input.ok_or(Error::NoInputSelected)?;
        if passphrase.is_empty() {
            return Err(Error::EmptyPassphrase);
        }

        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        container::validate_filename(&filename)?;

        let plaintext = self.read_input(path).await?;
        self.run_encrypt(&plaintext, &filename, passphrase, iterations)
    }

    async fn run_decrypt_file(&self, input: Option<&Path>, passphrase: &Passphrase, iterations: Iterations) -> Result<Opened> {
        let path = input.ok_or(Error::NoInputSelected)?;
        if passphrase.is_empty() {
            return Err(Error::EmptyPassphrase);
        }

        let bytes = self.read_input(path).await?;
        self.run_decrypt(&bytes, passphrase, iterations)
    }

    fn run_encrypt(&self, plaintext: &[u8], filename: &str, passphrase: &Passphrase, iterations: Iterations) -> Result<Sealed> {
        if passphrase.is_empty() {
            return Err(Error::EmptyPassphrase);
        }
        container::validate_filename(filename)?;

        self.enter(Stage::DerivingKey, PROGRESS_READ_END)?;
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        self.provider.fill_random(&mut salt)?;
        self.provider.fill_random(&mut nonce)?;
        debug!(salt = %hex::encode(salt), nonce = %hex::encode(nonce), %iterations, "generated salt and nonce");

        let key = self.provider.derive_key(passphrase, &salt, iterations)?;

        self.enter(Stage::Transforming, PROGRESS_ENC_DERIVED)?;
        let ciphertext = self.provider.seal(&key, &nonce, plaintext)?;
        drop(key);
        debug!(plaintext = plaintext.len(), ciphertext = ciphertext.len(), "sealed payload");

        self.enter(Stage::Framing, PROGRESS_ENC_SEALED)?;
        let container = container::serialize(&salt, &nonce, filename, &ciphertext)?;

        self.enter(Stage::Emitting, PROGRESS_DONE)?;
        let suggested_name = encrypted_name(filename);
        info!(bytes = container.len(), output = %suggested_name, "encryption complete");

        self.reporter.emit(Stage::Done, PROGRESS_DONE);
        Ok(Sealed { container, suggested_name })
    }

    fn run_decrypt(&self, bytes: &[u8], passphrase: &Passphrase, iterations: Iterations) -> Result<Opened> {
        if passphrase.is_empty() {
            return Err(Error::EmptyPassphrase);
        }

        self.enter(Stage::Unframing, PROGRESS_READ_END)?;
        let parsed = Container::parse(bytes)?;
        debug!(filename = parsed.filename(), ciphertext = parsed.ciphertext().len(), "parsed container header");

        self.enter(Stage::DerivingKey, PROGRESS_DEC_UNFRAMED)?;
        let key = self.provider.derive_key(passphrase, parsed.salt(), iterations)?;

        self.enter(Stage::Transforming, PROGRESS_DEC_DERIVED)?;
        let plaintext = self.provider.open(&key, parsed.nonce(), parsed.ciphertext()).inspect_err(|e| {
            if matches!(e, Error::AuthenticationFailed) {
                warn!("authentication tag did not verify");
            }
        })?;
        drop(key);

        self.enter(Stage::Emitting, PROGRESS_DEC_OPENED)?;
        let original_name = parsed.filename().to_owned();
        let suggested_name = decrypted_name(&original_name);
        info!(bytes = plaintext.len(), output = %suggested_name, "decryption complete");

        self.reporter.emit(Stage::Done, PROGRESS_DONE);
        Ok(Opened { plaintext, original_name, suggested_name })
    }

    async fn read_input(&self, path: &Path) -> Result<Vec<u8>> {
        self.enter(Stage::Reading, 0)?;

        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        info!(path = %path.display(), size, "reading input");

        reader::read_all(file, size, &self.cancel, |percent| self.reporter.emit(Stage::Reading, percent)).await
    }

    /// Checks for cancellation, then announces `stage`.
    fn enter(&self, stage: Stage, percent: u8) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        debug!(%stage, percent, "entering stage");
        self.reporter.emit(stage, percent);
        Ok(())
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            debug!(error = %e, "operation failed");
            self.reporter.emit(Stage::Failed, 0);
        }
        result
    }
}

/// Output name proposed after encryption.
pub fn encrypted_name(filename: &str) -> String {
    format!("{filename}{FILE_EXTENSION}")
}

/// Output name proposed after decryption.
pub fn decrypted_name(original: &str) -> String {
    let name = original.strip_suffix(FILE_EXTENSION).unwrap_or(original);
    if name.is_empty() { FALLBACK_FILENAME.to_owned() } else { name.to_owned() }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU8, Ordering};

    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;
    use crate::config::{HEADER_SIZE, MAX_FILENAME_LENGTH, TAG_SIZE};
    use crate::secret::DerivedKey;

    /// Real crypto with a predictable salt/nonce sequence.
    struct FixedRandom {
        counter: AtomicU8,
    }

    impl FixedRandom {
        fn new() -> Self {
            Self { counter: AtomicU8::new(1) }
        }
    }

    impl CryptoProvider for FixedRandom {
        fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
            dest.fill(self.counter.fetch_add(1, Ordering::SeqCst));
            Ok(())
        }

        fn derive_key(&self, passphrase: &Passphrase, salt: &[u8], iterations: Iterations) -> Result<DerivedKey> {
            SystemProvider.derive_key(passphrase, salt, iterations)
        }

        fn seal(&self, key: &DerivedKey, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
            SystemProvider.seal(key, nonce, plaintext)
        }

        fn open(&self, key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
            SystemProvider.open(key, nonce, ciphertext)
        }
    }

    /// Provider whose randomness source is broken.
    struct NoRandom;

    impl CryptoProvider for NoRandom {
        fn fill_random(&self, _dest: &mut [u8]) -> Result<()> {
            Err(Error::CryptoUnavailable("no entropy".into()))
        }

        fn derive_key(&self, passphrase: &Passphrase, salt: &[u8], iterations: Iterations) -> Result<DerivedKey> {
            SystemProvider.derive_key(passphrase, salt, iterations)
        }

        fn seal(&self, key: &DerivedKey, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
            SystemProvider.seal(key, nonce, plaintext)
        }

        fn open(&self, key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
            SystemProvider.open(key, nonce, ciphertext)
        }
    }

    const ITERS: Iterations = Iterations::new(1000);

    fn pass(s: &str) -> Passphrase {
        Passphrase::new(s)
    }

    #[test]
    fn test_hello_scenario() {
        let pipeline = Pipeline::new(SystemProvider);
        let sealed = pipeline.encrypt(b"hello", "a.txt", &pass("correct"), ITERS).unwrap();

        assert_eq!(sealed.container.len(), HEADER_SIZE + 5 + 5 + TAG_SIZE);
        assert_eq!(sealed.suggested_name, "a.txt.enc");

        let opened = pipeline.decrypt(&sealed.container, &pass("correct"), ITERS).unwrap();
        assert_eq!(opened.plaintext, b"hello");
        assert_eq!(opened.suggested_name, "a.txt");
        assert_eq!(opened.original_name, "a.txt");

        assert!(matches!(pipeline.decrypt(&sealed.container, &pass("wrong"), ITERS), Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_wrong_iterations_fails_authentication() {
        let pipeline = Pipeline::new(SystemProvider);
        let sealed = pipeline.encrypt(b"hello", "a.txt", &pass("correct"), ITERS).unwrap();

        let result = pipeline.decrypt(&sealed.container, &pass("correct"), Iterations::new(1001));
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_every_ciphertext_bit_is_authenticated() {
        let pipeline = Pipeline::new(SystemProvider);
        let sealed = pipeline.encrypt(b"tamper me", "t.bin", &pass("k"), Iterations::new(1)).unwrap();
        let start = HEADER_SIZE + "t.bin".len();

        for byte in start..sealed.container.len() {
            for bit in 0..8 {
                let mut tampered = sealed.container.clone();
                tampered[byte] ^= 1 << bit;
                assert!(matches!(pipeline.decrypt(&tampered, &pass("k"), Iterations::new(1)), Err(Error::AuthenticationFailed)), "byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn test_tampered_salt_or_nonce_fails_authentication() {
        let pipeline = Pipeline::new(SystemProvider);
        let sealed = pipeline.encrypt(b"data", "n", &pass("k"), Iterations::new(1)).unwrap();

        for offset in [0, SALT_SIZE] {
            let mut tampered = sealed.container.clone();
            tampered[offset] ^= 0x80;
            assert!(matches!(pipeline.decrypt(&tampered, &pass("k"), Iterations::new(1)), Err(Error::AuthenticationFailed)));
        }
    }

    #[test]
    fn test_fixed_provider_is_reproducible() {
        let a = Pipeline::new(FixedRandom::new()).encrypt(b"same", "f", &pass("k"), ITERS).unwrap();
        let b = Pipeline::new(FixedRandom::new()).encrypt(b"same", "f", &pass("k"), ITERS).unwrap();
        assert_eq!(a.container, b.container);

        let parsed = Container::parse(&a.container).unwrap();
        assert_eq!(parsed.salt(), &[1u8; SALT_SIZE]);
        assert_eq!(parsed.nonce(), &[2u8; NONCE_SIZE]);
    }

    #[test]
    fn test_fresh_salt_per_encryption() {
        let pipeline = Pipeline::new(SystemProvider);
        let a = pipeline.encrypt(b"same", "f", &pass("k"), Iterations::new(1)).unwrap();
        let b = pipeline.encrypt(b"same", "f", &pass("k"), Iterations::new(1)).unwrap();

        assert_ne!(Container::parse(&a.container).unwrap().salt(), Container::parse(&b.container).unwrap().salt());
        assert_ne!(a.container, b.container);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let pipeline = Pipeline::new(SystemProvider);
        let sealed = pipeline.encrypt(b"", "empty", &pass("k"), Iterations::new(1)).unwrap();
        let opened = pipeline.decrypt(&sealed.container, &pass("k"), Iterations::new(1)).unwrap();
        assert!(opened.plaintext.is_empty());
    }

    #[test]
    fn test_empty_passphrase() {
        let pipeline = Pipeline::new(SystemProvider);
        assert!(matches!(pipeline.encrypt(b"x", "f", &pass(""), ITERS), Err(Error::EmptyPassphrase)));
        assert!(matches!(pipeline.decrypt(&[0u8; 64], &pass(""), ITERS), Err(Error::EmptyPassphrase)));
    }

    #[test]
    fn test_malformed_header_fails_before_crypto() {
        let pipeline = Pipeline::new(NoRandom);
        assert!(matches!(pipeline.decrypt(&[0u8; 10], &pass("k"), ITERS), Err(Error::TruncatedHeader)));

        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[29] = 9;
        assert!(matches!(pipeline.decrypt(&bytes, &pass("k"), ITERS), Err(Error::TruncatedFilename)));
    }

    #[test]
    fn test_empty_ciphertext_fails_authentication() {
        let bytes = vec![0u8; HEADER_SIZE];
        assert!(matches!(Pipeline::new(SystemProvider).decrypt(&bytes, &pass("k"), Iterations::new(1)), Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_filename_boundary() {
        let pipeline = Pipeline::new(SystemProvider);
        let max = "a".repeat(MAX_FILENAME_LENGTH);
        let sealed = pipeline.encrypt(b"x", &max, &pass("k"), Iterations::new(1)).unwrap();
        assert_eq!(pipeline.decrypt(&sealed.container, &pass("k"), Iterations::new(1)).unwrap().original_name, max);

        let over = "a".repeat(MAX_FILENAME_LENGTH + 1);
        assert!(matches!(pipeline.encrypt(b"x", &over, &pass("k"), Iterations::new(1)), Err(Error::FilenameTooLong { .. })));
    }

    #[test]
    fn test_crypto_unavailable_is_surfaced() {
        let result = Pipeline::new(NoRandom).encrypt(b"x", "f", &pass("k"), ITERS);
        assert!(matches!(result, Err(ref e @ Error::CryptoUnavailable(_)) if e.is_fatal()));
    }

    #[test]
    fn test_progress_events() {
        let (tx, rx) = flume::unbounded();
        let pipeline = Pipeline::new(SystemProvider).with_progress(tx);
        let sealed = pipeline.encrypt(b"hello", "a.txt", &pass("k"), Iterations::new(1)).unwrap();

        let events: Vec<Progress> = rx.drain().collect();
        let stages: Vec<Stage> = events.iter().map(|p| p.stage).collect();
        assert_eq!(stages, vec![Stage::DerivingKey, Stage::Transforming, Stage::Framing, Stage::Emitting, Stage::Done]);
        assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(events.last().map(|p| p.percent), Some(PROGRESS_DONE));

        pipeline.decrypt(&sealed.container, &pass("k"), Iterations::new(1)).unwrap();
        let stages: Vec<Stage> = rx.drain().map(|p| p.stage).collect();
        assert_eq!(stages, vec![Stage::Unframing, Stage::DerivingKey, Stage::Transforming, Stage::Emitting, Stage::Done]);
    }

    #[test]
    fn test_failure_ends_in_failed_stage() {
        let (tx, rx) = flume::unbounded();
        let pipeline = Pipeline::new(SystemProvider).with_progress(tx);
        let sealed = pipeline.encrypt(b"hello", "a.txt", &pass("k"), Iterations::new(1)).unwrap();
        rx.drain().for_each(drop);

        assert!(pipeline.decrypt(&sealed.container, &pass("nope"), Iterations::new(1)).is_err());
        let events: Vec<Progress> = rx.drain().collect();
        assert_eq!(events.last().map(|p| p.stage), Some(Stage::Failed));
        assert!(!events.iter().any(|p| p.stage == Stage::Emitting || p.stage == Stage::Done));
    }

    #[test]
    fn test_cancelled_token_aborts() {
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = Pipeline::new(SystemProvider).with_cancellation(token);

        assert!(matches!(pipeline.encrypt(b"x", "f", &pass("k"), ITERS), Err(Error::Cancelled)));
        assert!(matches!(pipeline.decrypt(&[0u8; 64], &pass("k"), ITERS), Err(Error::Cancelled)));
    }

    #[test]
    fn test_suggested_names() {
        assert_eq!(encrypted_name("a.txt"), "a.txt.enc");
        assert_eq!(encrypted_name("a.enc"), "a.enc.enc");
        assert_eq!(decrypted_name("a.txt"), "a.txt");
        assert_eq!(decrypted_name("archive.tar.enc"), "archive.tar");
        assert_eq!(decrypted_name("x.enc.enc"), "x.enc");
        assert_eq!(decrypted_name(".enc"), FALLBACK_FILENAME);
        assert_eq!(decrypted_name(""), FALLBACK_FILENAME);
    }

    #[tokio::test]
    async fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("report.pdf");
        tokio::fs::write(&src, b"%PDF-1.7 content").await.unwrap();

        let (tx, rx) = flume::unbounded();
        let pipeline = Pipeline::new(SystemProvider).with_progress(tx);
        let sealed = pipeline.encrypt_file(Some(src.as_path()), &pass("k"), Iterations::new(1)).await.unwrap();
        assert_eq!(sealed.suggested_name, "report.pdf.enc");
        assert_eq!(rx.drain().next().map(|p| p.stage), Some(Stage::Reading));

        let enc = dir.path().join(&sealed.suggested_name);
        tokio::fs::write(&enc, &sealed.container).await.unwrap();

        let opened = pipeline.decrypt_file(Some(enc.as_path()), &pass("k"), Iterations::new(1)).await.unwrap();
        assert_eq!(opened.plaintext, b"%PDF-1.7 content");
        assert_eq!(opened.suggested_name, "report.pdf");
    }

    #[tokio::test]
    async fn test_file_errors() {
        let pipeline = Pipeline::new(SystemProvider);
        assert!(matches!(pipeline.encrypt_file(None, &pass("k"), ITERS).await, Err(Error::NoInputSelected)));
        assert!(matches!(pipeline.decrypt_file(None, &pass("k"), ITERS).await, Err(Error::NoInputSelected)));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(pipeline.encrypt_file(Some(missing.as_path()), &pass("k"), ITERS).await, Err(Error::Io(_))));
        assert!(matches!(pipeline.encrypt_file(Some(missing.as_path()), &pass(""), ITERS).await, Err(Error::EmptyPassphrase)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn encrypt_then_decrypt_restores_contents_and_name(plaintext in vec(any::<u8>(), 0..1024), name in "\\PC{0,64}", passphrase in "\\PC{1,32}") {
            let key = Passphrase::new(&passphrase);
            let pipeline = Pipeline::new(SystemProvider);

            let sealed = pipeline.encrypt(&plaintext, &name, &key, Iterations::new(1)).unwrap();
            prop_assert_eq!(sealed.container.len(), HEADER_SIZE + name.len() + plaintext.len() + TAG_SIZE);

            let opened = pipeline.decrypt(&sealed.container, &key, Iterations::new(1)).unwrap();
            prop_assert_eq!(opened.plaintext, plaintext);
            prop_assert_eq!(opened.original_name, name);
        }

        #[test]
        fn any_bit_flip_after_the_name_fails_authentication(plaintext in vec(any::<u8>(), 0..256), name in "\\PC{0,16}", position in any::<prop::sample::Index>(), bit in 0u8..8) {
            let key = pass("k");
            let pipeline = Pipeline::new(SystemProvider);
            let mut bytes = pipeline.encrypt(&plaintext, &name, &key, Iterations::new(1)).unwrap().container;

            let start = HEADER_SIZE + name.len();
            let target = start + position.index(bytes.len() - start);
            bytes[target] ^= 1 << bit;

            prop_assert!(matches!(pipeline.decrypt(&bytes, &key, Iterations::new(1)), Err(Error::AuthenticationFailed)));
        }
    }
}
