use super::constants::{MAX_CAPACITY, MIN_CAPACITY};
use super::error::BuildError;

/// This structure contains the configuration settings for a heap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Total size of the simulated heap in bytes, headers included. Must be
    /// larger than a single block header and fit in a header's length field.
    pub capacity: usize,
}

pub const HEAP_CONFIG_DEFAULT_CAPACITY: usize = 4096;

impl HeapConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.capacity < MIN_CAPACITY {
            return Err(BuildError::CapacityTooSmall {
                capacity: self.capacity,
            });
        }

        if self.capacity > MAX_CAPACITY {
            return Err(BuildError::CapacityTooLarge {
                capacity: self.capacity,
            });
        }

        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            capacity: HEAP_CONFIG_DEFAULT_CAPACITY,
        }
    }
}
