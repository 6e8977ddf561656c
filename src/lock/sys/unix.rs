//! Whole-file advisory locking with flock(2)

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::File;
use std::io;

/// A file holding an exclusive flock
pub(crate) struct LockedFile(Flock<File>);

/// Try once to lock `file` exclusively; `Ok(None)` means another handle holds it
pub(crate) fn try_lock_exclusive(file: File) -> io::Result<Option<LockedFile>> {
    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => Ok(Some(LockedFile(lock))),
        Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
        Err((_, errno)) => Err(io::Error::from(errno)),
    }
}

impl LockedFile {
    pub(crate) fn file(&mut self) -> &mut File {
        &mut *self.0
    }

    /// Release the lock and close the file
    pub(crate) fn unlock(self) -> io::Result<()> {
        match self.0.unlock() {
            Ok(file) => {
                drop(file);
                Ok(())
            }
            Err((_, errno)) => Err(io::Error::from(errno)),
        }
    }
}
