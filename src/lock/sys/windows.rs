//! Byte-range locking with LockFileEx
//!
//! The range length is the file's size when the lock is taken (at least one
//! byte). It starts far past any PID text so a competing process can still
//! read the holder's PID, matching what flock gives on POSIX.

use std::fs::File;
use std::io;
use std::mem;
use std::os::windows::io::AsRawHandle;
use winapi::shared::minwindef::DWORD;
use winapi::shared::winerror::ERROR_LOCK_VIOLATION;
use winapi::um::fileapi::{LockFileEx, UnlockFileEx};
use winapi::um::minwinbase::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, OVERLAPPED};
use winapi::um::winnt::HANDLE;

const LOCK_REGION_OFFSET: u64 = 1 << 62;

/// A file holding an exclusive range lock
pub(crate) struct LockedFile {
    file: File,
    len: u64,
}

fn overlapped_at(offset: u64) -> OVERLAPPED {
    // SAFETY: OVERLAPPED is plain data; all-zero is its documented initial state
    let mut overlapped: OVERLAPPED = unsafe { mem::zeroed() };
    // SAFETY: writing the offset variant of the union
    unsafe {
        let s = overlapped.u.s_mut();
        s.Offset = offset as DWORD;
        s.OffsetHigh = (offset >> 32) as DWORD;
    }
    overlapped
}

/// Try once to lock `file` exclusively; `Ok(None)` means another handle holds it
pub(crate) fn try_lock_exclusive(file: File) -> io::Result<Option<LockedFile>> {
    let len = file.metadata()?.len().max(1);
    let mut overlapped = overlapped_at(LOCK_REGION_OFFSET);

    // SAFETY: the handle is owned by `file` and outlives the call
    let ok = unsafe {
        LockFileEx(
            file.as_raw_handle() as HANDLE,
            LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
            0,
            len as DWORD,
            (len >> 32) as DWORD,
            &mut overlapped,
        )
    };

    if ok != 0 {
        return Ok(Some(LockedFile { file, len }));
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
        Ok(None)
    } else {
        Err(err)
    }
}

impl LockedFile {
    pub(crate) fn file(&mut self) -> &mut File {
        &mut self.file
    }

    /// Release the lock and close the file
    pub(crate) fn unlock(self) -> io::Result<()> {
        let mut overlapped = overlapped_at(LOCK_REGION_OFFSET);

        // SAFETY: same handle and range as the successful LockFileEx call
        let ok = unsafe {
            UnlockFileEx(
                self.file.as_raw_handle() as HANDLE,
                0,
                self.len as DWORD,
                (self.len >> 32) as DWORD,
                &mut overlapped,
            )
        };

        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
