//! File-backed singleton lock

use super::sys::{self, LockedFile};
use super::SingletonLock;
use crate::error::{IoResultExt, Result, ScaleError};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

/// Singleton lock held through an advisory lock on a file
///
/// The file records the holder's PID so a competing process can report it.
/// The file is never deleted; the next instance re-locks the same path.
pub struct FileSingletonLock {
    path: PathBuf,
    guard: Option<LockedFile>,
}

impl FileSingletonLock {
    /// Take the lock at `path`, failing fast if another process holds it
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // No truncation before the lock is ours: the content is the holder's PID
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_path(&path)?;

        let mut guard = match sys::try_lock_exclusive(file).with_path(&path)? {
            Some(guard) => guard,
            None => {
                let bytes = fs::read(&path).with_path(&path)?;
                let pid = String::from_utf8_lossy(&bytes).into_owned();
                debug!(path = %path.display(), pid = %pid, "Singleton lock is held elsewhere");
                return Err(ScaleError::multiple_instances(path, pid));
            }
        };

        let pid = process::id();
        write_pid(guard.file(), pid).with_path(&path)?;
        info!(path = %path.display(), pid, "Acquired singleton lock");

        Ok(Self {
            path,
            guard: Some(guard),
        })
    }

    /// Whether the lock is still held by this instance
    pub fn is_locked(&self) -> bool {
        self.guard.is_some()
    }
}

fn write_pid(file: &mut fs::File, pid: u32) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", pid)?;
    file.flush()
}

impl SingletonLock for FileSingletonLock {
    fn unlock(&mut self) -> Result<()> {
        if let Some(guard) = self.guard.take() {
            guard.unlock().with_path(&self.path)?;
            info!(path = %self.path.display(), "Released singleton lock");
        }
        Ok(())
    }

    fn lock_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

impl std::fmt::Debug for FileSingletonLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSingletonLock")
            .field("path", &self.path)
            .field("locked", &self.is_locked())
            .finish()
    }
}
