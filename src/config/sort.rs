//! Argsort configuration.

use super::{parse_env_bool, parse_env_var, Config, ValidationError};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Tuning and ordering options for [`argsort`](crate::argsort)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Most-significant-byte radix rounds over the packed 4-byte prefix (0..=4)
    pub radix_rounds: usize,
    /// Bucket size at or below which insertion sort takes over (2..=64)
    pub insertion_threshold: usize,
    /// Compare ASCII letters without regard to case
    pub case_insensitive: bool,
    /// When set, only the first `k` slots of `order` must hold the `k`
    /// smallest strings in order; the rest are left in unspecified order
    pub partial_order_length: Option<usize>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            radix_rounds: 2,
            insertion_threshold: 16,
            case_insensitive: false,
            partial_order_length: None,
        }
    }
}

impl SortConfig {
    /// Default configuration with ASCII case folding
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    /// Default configuration that only orders the `k` smallest strings
    pub fn partial(k: usize) -> Self {
        Self {
            partial_order_length: Some(k),
            ..Self::default()
        }
    }
}

impl Config for SortConfig {
    fn validate(&self) -> Result<()> {
        if self.radix_rounds > 4 {
            return Err(ValidationError::new(
                "radix_rounds",
                &self.radix_rounds.to_string(),
                "only 4 prefix bytes are packed",
            )
            .with_suggestion("0..=4")
            .into());
        }
        if !(2..=64).contains(&self.insertion_threshold) {
            return Err(ValidationError::new(
                "insertion_threshold",
                &self.insertion_threshold.to_string(),
                "out of range",
            )
            .with_suggestion("2..=64")
            .into());
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.radix_rounds = parse_env_var(&format!("{}SORT_RADIX_ROUNDS", prefix), config.radix_rounds);
        config.insertion_threshold = parse_env_var(
            &format!("{}SORT_INSERTION_THRESHOLD", prefix),
            config.insertion_threshold,
        );
        config.case_insensitive =
            parse_env_bool(&format!("{}SORT_CASE_INSENSITIVE", prefix), config.case_insensitive);
        let partial: usize = parse_env_var(&format!("{}SORT_PARTIAL_ORDER_LENGTH", prefix), 0);
        if partial > 0 {
            config.partial_order_length = Some(partial);
        }
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            radix_rounds: 4,
            insertion_threshold: 24,
            ..Self::default()
        }
    }

    fn memory_preset() -> Self {
        // no radix rounds means no counting scratch at all
        Self {
            radix_rounds: 0,
            ..Self::default()
        }
    }

    fn realtime_preset() -> Self {
        Self {
            radix_rounds: 1,
            insertion_threshold: 16,
            ..Self::default()
        }
    }
}
