//! Filesystem side of the CLI.
//!
//! [`File`] wraps a path with the checks the interactive flow needs: whether
//! it is eligible for a mode, where its output should go, and async
//! write/delete helpers. Nothing in here touches cryptography.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, ensure};
use fast_glob::glob_match;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{EXCLUDED_PATTERNS, FILE_EXTENSION};
use crate::types::ProcessorMode;

static EXCLUSION_MATCHERS: LazyLock<Vec<String>> = LazyLock::new(|| EXCLUDED_PATTERNS.iter().map(|s| (*s).to_owned()).collect());

/// A candidate input or output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,

    /// Cached on first [`File::size`] call.
    size: Option<u64>,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), size: None }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, lossily decoded.
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(|| "unknown".to_owned(), |s| s.to_string_lossy().into_owned())
    }

    pub async fn size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }

        let meta = tokio::fs::metadata(&self.path).await.with_context(|| format!("failed to get metadata: {}", self.path.display()))?;
        self.size = Some(meta.len());

        Ok(meta.len())
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.path.as_os_str().to_string_lossy().ends_with(FILE_EXTENSION)
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.path.file_name().is_some_and(|name| name.to_string_lossy().starts_with('.'))
    }

    /// Matches the full path or any single component against the exclusion globs.
    pub fn is_excluded(&self) -> bool {
        let path_str = self.path.to_string_lossy();

        EXCLUSION_MATCHERS.iter().any(|pattern| {
            if glob_match(pattern, path_str.as_ref()) {
                return true;
            }
            self.path.components().any(|comp| glob_match(pattern, comp.as_os_str().to_string_lossy().as_ref()))
        })
    }

    pub fn is_eligible(&self, mode: ProcessorMode) -> bool {
        if self.is_hidden() || self.is_excluded() {
            return false;
        }

        match mode {
            ProcessorMode::Encrypt => !self.is_encrypted(),
            ProcessorMode::Decrypt => self.is_encrypted(),
        }
    }

    /// Default output for encryption: the input path with `.enc` appended.
    pub fn encrypted_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(FILE_EXTENSION);
        PathBuf::from(name)
    }

    /// Default output for decryption: `suggested_name` next to the input.
    ///
    /// Only the final component of `suggested_name` is used, so a stored
    /// name like `../../etc/passwd` cannot escape the input's directory.
    pub fn decrypted_path(&self, suggested_name: &str) -> PathBuf {
        let name = Path::new(suggested_name).file_name().map_or_else(|| PathBuf::from(crate::config::FALLBACK_FILENAME), PathBuf::from);
        self.path.parent().map_or_else(|| name.clone(), |parent| parent.join(&name))
    }

    /// Output the interactive flow shows before decrypting, based on the
    /// container's extension alone.
    pub fn predicted_path(&self, mode: ProcessorMode) -> PathBuf {
        match mode {
            ProcessorMode::Encrypt => self.encrypted_path(),
            ProcessorMode::Decrypt => self.path.to_string_lossy().strip_suffix(FILE_EXTENSION).map_or_else(|| self.path.clone(), PathBuf::from),
        }
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }

    /// Writes `contents`, creating parent directories and truncating any existing file.
    pub async fn write(&self, contents: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        tokio::fs::write(&self.path, contents).await.with_context(|| format!("failed to write file: {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = contents.len(), "wrote output");

        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        ensure!(self.exists(), "file not found: {}", self.path.display());

        tokio::fs::remove_file(&self.path).await.with_context(|| format!("failed to delete file: {}", self.path.display()))
    }

    /// Input must exist and be a regular file. Empty files are fine.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.exists(), "file not found: {}", self.path.display());
        ensure!(!self.is_dir(), "path is a directory: {}", self.path.display());
        Ok(())
    }

    /// Output must not clobber an existing file unless `allow_overwrite` is set.
    pub fn ensure_writable(&self, allow_overwrite: bool) -> Result<()> {
        ensure!(!self.is_dir(), "output path is a directory: {}", self.path.display());
        ensure!(allow_overwrite || !self.exists(), "file already exists: {} (use --output or --force to overwrite)", self.path.display());
        Ok(())
    }

    /// Walks `root` for regular files eligible for `mode`, in path order.
    pub fn discover(root: impl AsRef<Path>, mode: ProcessorMode) -> Vec<Self> {
        let mut files: Vec<Self> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| Self::new(entry.into_path()))
            .filter(|file| file.is_eligible(mode))
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }
}
