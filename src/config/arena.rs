//! Arena allocator configuration.

use super::{parse_env_var, Config, ValidationError};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Size and alignment of an [`ArenaAllocator`](crate::ArenaAllocator) block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Total bytes owned by the arena
    pub capacity: usize,
    /// Alignment of the arena block, a power of two
    pub alignment: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: 1024 * 1024,
            alignment: 64,
        }
    }
}

impl Config for ArenaConfig {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ValidationError::new("capacity", "0", "arena cannot be empty").into());
        }
        if !self.alignment.is_power_of_two() {
            return Err(ValidationError::new(
                "alignment",
                &self.alignment.to_string(),
                "must be a power of two",
            )
            .with_suggestion("8, 16, 32, 64")
            .into());
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.capacity = parse_env_var(&format!("{}ARENA_CAPACITY", prefix), config.capacity);
        config.alignment = parse_env_var(&format!("{}ARENA_ALIGNMENT", prefix), config.alignment);
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            capacity: 16 * 1024 * 1024,
            alignment: 64,
        }
    }

    fn memory_preset() -> Self {
        Self {
            capacity: 64 * 1024,
            alignment: 16,
        }
    }

    fn realtime_preset() -> Self {
        Self {
            capacity: 4 * 1024 * 1024,
            alignment: 64,
        }
    }
}
