//! HTTP(S) bundle download with progress reporting and cooperative cancel.
//!
//! Single sequential GET via libcurl. The body streams into a temp file
//! next to the destination and is only moved into place on success, so a
//! failed or cancelled transfer never leaves a partial file at `dest`.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DownloadConfig;

/// Failure modes of a single bundle download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    /// Final response status was not 2xx.
    #[error("GET returned HTTP {0}")]
    Http(u32),
    /// Abort token was set while the transfer was running.
    #[error("download cancelled")]
    Cancelled,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress callback: bytes downloaded so far and total size when the
/// server sent Content-Length.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64, Option<u64>);

/// Rate-limits progress callbacks so a chatty transfer cannot spam the
/// caller; at most one report per interval.
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true when a report is due at `now`.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.duration_since(prev) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

/// Downloads `url` into `dest`, reporting progress and honoring `abort`.
/// Returns the number of bytes written.
pub fn fetch_to_file(
    url: &str,
    dest: &Path,
    opts: &DownloadConfig,
    mut progress: Option<ProgressFn<'_>>,
    abort: Option<Arc<AtomicBool>>,
) -> Result<u64, DownloadError> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent("acm-config-manager")?;
    easy.connect_timeout(Duration::from_secs(opts.connect_timeout_secs))?;
    easy.timeout(Duration::from_secs(opts.timeout_secs))?;
    easy.progress(true)?;

    let mut write_error: Option<std::io::Error> = None;
    let abort = abort.unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
    let mut throttle = ProgressThrottle::default();

    let perform_result = {
        let file: &mut File = tmp.as_file_mut();
        let write_error = &mut write_error;
        let mut transfer = easy.transfer();
        transfer.write_function(move |data| {
            match file.write_all(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    *write_error = Some(e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        let abort = Arc::clone(&abort);
        transfer.progress_function(move |dltotal, dlnow, _ultotal, _ulnow| {
            if abort.load(Ordering::Relaxed) {
                return false; // cancels the transfer
            }
            if let Some(cb) = progress.as_mut() {
                if dlnow > 0.0 && throttle.tick(Instant::now()) {
                    let total = if dltotal > 0.0 {
                        Some(dltotal as u64)
                    } else {
                        None
                    };
                    cb(dlnow as u64, total);
                }
            }
            true
        })?;
        transfer.perform()
    };
    if let Err(e) = perform_result {
        if abort.load(Ordering::Relaxed) && e.is_aborted_by_callback() {
            return Err(DownloadError::Cancelled);
        }
        if let Some(io) = write_error.take() {
            return Err(DownloadError::Io(io));
        }
        return Err(DownloadError::Curl(e));
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(DownloadError::Http(code));
    }

    tmp.as_file_mut().flush()?;
    let written = tmp.as_file().metadata()?.len();
    tmp.persist(dest).map_err(|e| DownloadError::Io(e.error))?;
    tracing::debug!("downloaded {} bytes from {} to {}", written, url, dest.display());
    Ok(written)
}
