//! Input loading for the reading stage.
//!
//! The whole input is held in memory: the AEAD is applied to the complete
//! plaintext in one call. Reading happens in fixed chunks so that progress
//! and cancellation can be observed while a large file loads.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::config::{CHUNK_SIZE, PROGRESS_READ_END};
use crate::error::{Error, Result};

/// Reads `reader` to EOF, calling `on_progress` with a 0..=30 percentage
/// each time it changes.
///
/// `size_hint` only drives progress; the reader may yield more or fewer bytes.
///
/// # Errors
///
/// [`Error::Io`] on read failure, [`Error::Cancelled`] if `cancel` fires
/// between chunks.
pub(crate) async fn read_all<R, F>(mut reader: R, size_hint: u64, cancel: &CancellationToken, mut on_progress: F) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    F: FnMut(u8),
{
    let mut data = Vec::with_capacity(usize::try_from(size_hint).unwrap_or(0));
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut last = 0u8;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..bytes_read]);

        let percent = read_percent(data.len() as u64, size_hint);
        if percent != last {
            last = percent;
            on_progress(percent);
        }
    }

    if last != PROGRESS_READ_END {
        on_progress(PROGRESS_READ_END);
    }

    Ok(data)
}

fn read_percent(read: u64, total: u64) -> u8 {
    if total == 0 || read >= total {
        return PROGRESS_READ_END;
    }
    let scaled = read.saturating_mul(u64::from(PROGRESS_READ_END)) / total;
    u8::try_from(scaled).unwrap_or(PROGRESS_READ_END)
}
