//! Interactive prompts built on `inquire`.

use std::path::Path;

use anyhow::{Result, ensure};
use inquire::validator::Validation;
use inquire::{Confirm, CustomUserError, Password, PasswordDisplayMode, Select, Text};
use strum::IntoEnumIterator;

use crate::config::DEFAULT_ITERATIONS;
use crate::file::File;
use crate::secret::Passphrase;
use crate::types::{Iterations, Processing, ProcessorMode};

pub struct Prompt;

impl Prompt {
    /// Asks for the passphrase; encryption asks twice.
    pub fn passphrase(processing: Processing) -> Result<Passphrase> {
        let prompt = Password::new("Passphrase:").with_display_mode(PasswordDisplayMode::Masked).with_validator(|input: &str| -> Result<Validation, CustomUserError> {
            if input.is_empty() { Ok(Validation::Invalid("passphrase cannot be empty".into())) } else { Ok(Validation::Valid) }
        });

        let prompt = match processing {
            Processing::Encryption => prompt.with_custom_confirmation_message("Confirm passphrase:").with_custom_confirmation_error_message("passphrases do not match"),
            Processing::Decryption => prompt.without_confirmation(),
        };

        Ok(Passphrase::from_string(prompt.prompt()?))
    }

    /// Free-form iteration count, parsed leniently.
    pub fn iterations() -> Result<Iterations> {
        let default = DEFAULT_ITERATIONS.to_string();
        let input = Text::new("PBKDF2 iterations:").with_default(&default).with_help_message("must match the value used to encrypt").prompt()?;

        Ok(Iterations::parse_lenient(Some(&input)))
    }

    pub fn select_processing_mode() -> Result<ProcessorMode> {
        Ok(Select::new("Select operation:", ProcessorMode::iter().collect()).prompt()?)
    }

    pub fn select_file(files: &[File]) -> Result<File> {
        ensure!(!files.is_empty(), "no files available for selection");

        let names: Vec<String> = files.iter().map(|f| f.path().display().to_string()).collect();
        let choice = Select::new("Select file:", names).raw_prompt()?;

        Ok(files[choice.index].clone())
    }

    pub fn confirm_file_overwrite(path: &Path) -> Result<bool> {
        Self::confirm(&format!("Output file {} already exists. Overwrite?", display_name(path)))
    }

    pub fn confirm_file_deletion(path: &Path, label: &str) -> Result<bool> {
        Self::confirm(&format!("Delete {label} file {}?", display_name(path)))
    }

    pub fn confirm_retry() -> Result<bool> {
        Self::confirm("Try another passphrase?")
    }

    fn confirm(message: &str) -> Result<bool> {
        Ok(Confirm::new(message).with_default(false).prompt()?)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
