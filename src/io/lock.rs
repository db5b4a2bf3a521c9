use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::io::data_io::DataDir;

/// Lock file inside the data directory. It is created once and never
/// removed: waiters must all contend on the same inode.
pub const LOCK_FILE: &str = "save.lock";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Exclusive hold on a data directory for one save.
///
/// A save reads `grows.json`, allocates the next entry id and rewrites both
/// files; the whole sequence runs under this lock. While held, the lock file
/// names the holder so a timed-out saver can say who it waited on.
#[derive(Debug)]
pub struct SaveLock {
    file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: {source}")]
    Flock {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}{}", holder_suffix(.holder))]
    Timeout {
        path: PathBuf,
        holder: Option<String>,
    },
}

fn holder_suffix(holder: &Option<String>) -> String {
    match holder {
        Some(h) => format!(" (held by {})", h),
        None => String::new(),
    }
}

impl SaveLock {
    /// Wait up to `timeout` for the data directory's save lock.
    pub fn hold(dir: &DataDir, timeout: Duration) -> Result<SaveLock, LockError> {
        let path = dir.root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        let mut backoff = Duration::from_millis(5);
        loop {
            match try_flock(&file) {
                Ok(true) => break,
                Ok(false) if Instant::now() < deadline => {
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Ok(false) => {
                    let holder = read_holder(&file);
                    tracing::warn!(path = %path.display(), holder = ?holder, "save lock timed out");
                    return Err(LockError::Timeout { path, holder });
                }
                Err(source) => return Err(LockError::Flock { path, source }),
            }
        }

        let mut lock = SaveLock { file, path };
        lock.record_holder();
        tracing::debug!(path = %lock.path.display(), "save lock held");
        Ok(lock)
    }

    pub fn hold_default(dir: &DataDir) -> Result<SaveLock, LockError> {
        Self::hold(dir, DEFAULT_TIMEOUT)
    }

    // Best effort: the holder line is only used in the timeout message
    fn record_holder(&mut self) {
        let line = format!(
            "pid {} since {}\n",
            std::process::id(),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        );
        let _ = self
            .file
            .set_len(0)
            .and_then(|_| self.file.seek(SeekFrom::Start(0)))
            .and_then(|_| self.file.write_all(line.as_bytes()));
    }
}

impl Drop for SaveLock {
    fn drop(&mut self) {
        // Clear the holder line; closing the handle releases the flock
        let _ = self.file.set_len(0);
    }
}

fn read_holder(file: &File) -> Option<String> {
    let mut file = file;
    let mut text = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut text).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Non-blocking exclusive flock. `Ok(false)` means another handle holds it.
#[cfg(unix)]
fn try_flock(file: &File) -> std::io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::EWOULDBLOCK || code == libc::EINTR => Ok(false),
        _ => Err(err),
    }
}

#[cfg(not(unix))]
fn try_flock(file: &File) -> std::io::Result<bool> {
    match file.try_lock() {
        Ok(()) => Ok(true),
        Err(std::fs::TryLockError::WouldBlock) => Ok(false),
        Err(std::fs::TryLockError::Error(e)) => Err(e),
    }
}
