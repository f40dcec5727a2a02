use std::future::Future;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flume::Receiver;
use sealfile::config::APP_NAME;
use sealfile::file::File;
use sealfile::types::{Iterations, Processing, ProcessorMode};
use sealfile::ui::progress::Bar;
use sealfile::ui::prompt::Prompt;
use sealfile::{Error, Passphrase, Pipeline, Progress, SystemProvider};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, warn};

/// Exit status after a second Ctrl-C (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a file into a `.enc` container.
    Encrypt {
        #[arg(short, long)]
        input: PathBuf,

        /// Defaults to the input path with `.enc` appended.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        password: Option<String>,

        /// PBKDF2 iteration count (default 100000).
        #[arg(short = 'n', long)]
        iterations: Option<String>,

        /// Overwrite the default output path if it already exists.
        #[arg(short, long)]
        force: bool,
    },

    /// Decrypt a `.enc` container.
    Decrypt {
        #[arg(short, long)]
        input: PathBuf,

        /// Defaults to the stored filename, next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        password: Option<String>,

        /// Must match the value used to encrypt.
        #[arg(short = 'n', long)]
        iterations: Option<String>,

        /// Overwrite the default output path if it already exists.
        #[arg(short, long)]
        force: bool,
    },

    Interactive,
}

/// What to do when the output path already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Overwrite {
    /// Ask, unless the user already confirmed this exact path.
    Ask,
    Allow,
    Refuse,
}

impl Overwrite {
    /// An explicit `--output` or `--force` permits clobbering; a path chosen
    /// from the container's stored name never does.
    const fn for_cli(explicit_output: bool, force: bool) -> Self {
        if explicit_output || force { Self::Allow } else { Self::Refuse }
    }
}

#[derive(Parser)]
#[command(name = APP_NAME, version, about = "Encrypt files with a passphrase using PBKDF2-SHA256 and AES-256-GCM.")]
pub struct App {
    /// Log pipeline stages and parameters.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let level = if app.verbose { Level::DEBUG } else { Level::WARN };
        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        tokio::spawn(async move {
            if Self::watch_interrupts(tokio::signal::ctrl_c, guard).await {
                warn!("second interrupt, exiting");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        });

        match self.command {
            Some(Commands::Encrypt { input, output, password, iterations, force }) => Self::run_mode(input, output, password, iterations.as_deref(), force, Processing::Encryption, &cancel).await,
            Some(Commands::Decrypt { input, output, password, iterations, force }) => Self::run_mode(input, output, password, iterations.as_deref(), force, Processing::Decryption, &cancel).await,
            Some(Commands::Interactive) | None => Self::run_interactive(&cancel).await,
        }
    }

    /// First interrupt cancels the running operation at its next checkpoint.
    /// Returns `true` on a second interrupt, `false` if the signal source fails.
    async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        if next_interrupt().await.is_err() {
            return false;
        }
        debug!("interrupt received, cancelling");
        cancel.cancel();

        next_interrupt().await.is_ok()
    }

    async fn run_mode(input: PathBuf, output: Option<PathBuf>, password: Option<String>, iterations: Option<&str>, force: bool, processing: Processing, cancel: &CancellationToken) -> Result<()> {
        let input = File::new(input);
        input.validate()?;

        let passphrase = match password {
            Some(password) => Passphrase::from_string(password),
            None => Prompt::passphrase(processing)?,
        };
        let iterations = Iterations::parse_lenient(iterations);

        let overwrite = Overwrite::for_cli(output.is_some(), force);
        let written = Self::process(processing, &input, output, &passphrase, iterations, cancel, overwrite).await?;
        sealfile::ui::show_success(processing.mode(), &written);

        Ok(())
    }

    async fn run_interactive(cancel: &CancellationToken) -> Result<()> {
        sealfile::ui::clear_screen()?;
        sealfile::ui::print_banner();

        let mode = Prompt::select_processing_mode()?;
        let processing = mode.processing();

        let mut files = File::discover(".", mode);
        if files.is_empty() {
            return Err(Error::NoInputSelected).context("no eligible files found");
        }
        sealfile::ui::show_file_info(&mut files).await?;

        let input = Prompt::select_file(&files)?;
        input.validate()?;

        let predicted = input.predicted_path(mode);
        if predicted.exists() && !Prompt::confirm_file_overwrite(&predicted)? {
            return Err(Error::Cancelled.into());
        }

        let iterations = Prompt::iterations()?;
        let written = loop {
            let passphrase = Prompt::passphrase(processing)?;
            match Self::process(processing, &input, None, &passphrase, iterations, cancel, Overwrite::Ask).await {
                Ok(path) => break path,
                Err(e) if Self::can_retry(&e) => {
                    sealfile::ui::show_error(&format!("{e:#}"));
                    if !Prompt::confirm_retry()? {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        };

        sealfile::ui::show_success(mode, &written);

        let label = match mode {
            ProcessorMode::Encrypt => "original",
            ProcessorMode::Decrypt => "encrypted",
        };
        if Prompt::confirm_file_deletion(input.path(), label)? {
            input.delete().await?;
            sealfile::ui::show_source_deleted(input.path());
        }

        Ok(())
    }

    /// Runs one operation with a live progress bar and writes the result.
    ///
    /// The output file is only created once the pipeline has succeeded.
    async fn process(processing: Processing, input: &File, output: Option<PathBuf>, passphrase: &Passphrase, iterations: Iterations, cancel: &CancellationToken, overwrite: Overwrite) -> Result<PathBuf> {
        let (tx, rx) = flume::unbounded();
        let bar = Self::spawn_bar(processing, rx)?;
        let pipeline = Pipeline::new(SystemProvider).with_progress(tx).with_cancellation(cancel.clone());

        let result = match processing {
            Processing::Encryption => pipeline.encrypt_file(Some(input.path()), passphrase, iterations).await.map(|sealed| (sealed.container, input.encrypted_path())),
            Processing::Decryption => pipeline.decrypt_file(Some(input.path()), passphrase, iterations).await.map(|opened| {
                let path = input.decrypted_path(&opened.suggested_name);
                (opened.plaintext, path)
            }),
        };
        drop(pipeline);
        bar.await?;

        let (contents, default_path) = result.with_context(|| format!("{} failed: {}", processing.mode(), input.path().display()))?;

        let output = File::new(output.unwrap_or(default_path));
        match overwrite {
            Overwrite::Ask if output.exists() && output.path() != input.predicted_path(processing.mode()) => {
                if !Prompt::confirm_file_overwrite(output.path())? {
                    return Err(Error::Cancelled.into());
                }
            }
            Overwrite::Ask | Overwrite::Allow => output.ensure_writable(true)?,
            Overwrite::Refuse => output.ensure_writable(false)?,
        }
        output.write(&contents).await?;

        Ok(output.path().to_path_buf())
    }

    fn spawn_bar(processing: Processing, rx: Receiver<Progress>) -> Result<JoinHandle<()>> {
        let bar = Bar::new(processing.label())?;

        Ok(tokio::spawn(async move {
            while let Ok(progress) = rx.recv_async().await {
                bar.update(progress);
                if progress.stage.is_terminal() {
                    break;
                }
            }
        }))
    }

    fn can_retry(error: &anyhow::Error) -> bool {
        matches!(error.downcast_ref::<Error>(), Some(Error::AuthenticationFailed))
    }
}
