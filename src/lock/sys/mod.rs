//! Platform locking primitive

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::{try_lock_exclusive, LockedFile};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::{try_lock_exclusive, LockedFile};
