//! Bounded-wait advisory file locks.
//!
//! Every cross-process resource in Dispatch (daily event files, the work
//! queue, session flags, cache entries) is coordinated through a sidecar
//! `.lock` file: exclusive for writers, shared for readers. Acquisition
//! polls `fs2`'s non-blocking variants so the wait can be bounded — a
//! hook must never block the host past its time budget. The OS releases
//! the lock if the holder dies mid-write, so a killed hook cannot wedge
//! anything.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

/// Poll interval while waiting for a busy lock.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A held advisory lock on a sidecar file.
///
/// Released on drop; errors during release are ignored (the process
/// exiting releases it anyway).
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock, waiting at most `wait`.
    ///
    /// # Errors
    ///
    /// [`io::ErrorKind::TimedOut`] if the lock stays busy past the
    /// deadline; other kinds if the sidecar cannot be opened.
    pub fn exclusive(path: &Path, wait: Duration) -> io::Result<Self> {
        // Qualified calls throughout: std's own `File::try_lock_*`
        // inherent methods (1.89+) would otherwise shadow the fs2 trait
        // with a different return type.
        Self::acquire(path, wait, |f| FileExt::try_lock_exclusive(f))
    }

    /// Acquire a shared lock, waiting at most `wait`.
    ///
    /// # Errors
    ///
    /// Same as [`FileLock::exclusive`].
    pub fn shared(path: &Path, wait: Duration) -> io::Result<Self> {
        Self::acquire(path, wait, |f| FileExt::try_lock_shared(f))
    }

    fn acquire(
        path: &Path,
        wait: Duration,
        try_lock: impl Fn(&File) -> io::Result<()>,
    ) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        let deadline = Instant::now() + wait;
        loop {
            match try_lock(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("lock busy: {}", path.display()),
                        ));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                },
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
