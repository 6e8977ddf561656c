//! Identifier generation
//!
//! Bucket ids and fallback node tokens come from an [`IdGenerator`]. Production
//! code uses [`RandomUuid`]; test setups pass an [`IncrementingUuid`] so that
//! generated ids are predictable and easy to read in failure output.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Source of unique identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier. Implementations may ignore `prefix`.
    fn generate(&self, prefix: &str) -> String;
}

/// Random version 4 UUIDs, prefix ignored
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomUuid;

impl IdGenerator for RandomUuid {
    fn generate(&self, _prefix: &str) -> String {
        Uuid::new_v4().to_string()
    }
}

/// A pseudo uuid that counts up per prefix: `node-0`, `node-1`, ...
#[derive(Default)]
pub struct IncrementingUuid {
    current: Mutex<HashMap<String, u64>>,
}

impl IncrementingUuid {
    /// Create a generator with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for IncrementingUuid {
    fn generate(&self, prefix: &str) -> String {
        let mut prefix = prefix.to_string();
        if !prefix.is_empty() && !prefix.ends_with('-') {
            prefix.push('-');
        }

        let mut current = self.current.lock();
        let counter = current.entry(prefix.clone()).or_insert(0);
        let ret = format!("{}{}", prefix, counter);
        *counter += 1;
        ret
    }
}

impl fmt::Debug for IncrementingUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementingUuid")
            .field("prefixes", &self.current.lock().len())
            .finish()
    }
}

/// Generate a random unique identifier
pub fn uuid(prefix: &str) -> String {
    RandomUuid.generate(prefix)
}
