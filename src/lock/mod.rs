//! Singleton locking
//!
//! Ensures only one autoscaler instance acts on an environment at a time.
//! Acquisition is attempted exactly once and never blocks: a second instance
//! fails immediately with [`ScaleError::MultipleInstances`] carrying the
//! holder's PID. Retry policy, if any, belongs to the caller.
//!
//! ```no_run
//! use scalelib::config::AutoscaleConfig;
//! use scalelib::lock::new_singleton_lock;
//!
//! let config = AutoscaleConfig::from_json_str(r#"{"lock_file": "/tmp/scalelib.lock"}"#).unwrap();
//! let mut lock = new_singleton_lock(&config).unwrap();
//! // ... one autoscale pass ...
//! lock.unlock().unwrap();
//! ```
//!
//! [`ScaleError::MultipleInstances`]: crate::error::ScaleError::MultipleInstances

mod file;
mod sys;

pub use file::FileSingletonLock;

use crate::config::AutoscaleConfig;
use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Process-exclusivity guard
pub trait SingletonLock: Send {
    /// Release the lock. Calling it again is a no-op.
    fn unlock(&mut self) -> Result<()>;

    /// Lock file backing this guard, if any
    fn lock_path(&self) -> Option<&Path>;
}

/// Lock used when the configuration disables locking
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSingletonLock;

impl SingletonLock for NullSingletonLock {
    fn unlock(&mut self) -> Result<()> {
        Ok(())
    }

    fn lock_path(&self) -> Option<&Path> {
        None
    }
}

/// Build the lock described by `config`
///
/// Set `"lock_file": null` in the autoscale config to disable file locking.
pub fn new_singleton_lock(config: &AutoscaleConfig) -> Result<Box<dyn SingletonLock>> {
    match config.lock_path()? {
        Some(path) => Ok(Box::new(FileSingletonLock::acquire(path)?)),
        None => {
            debug!("Singleton locking disabled by configuration");
            Ok(Box::new(NullSingletonLock))
        }
    }
}
