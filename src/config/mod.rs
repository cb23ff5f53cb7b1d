//! Configuration APIs for strand
//!
//! Every tunable part of the engine is described by a plain, serializable
//! configuration struct implementing [`Config`]:
//!
//! - [`DispatchConfig`]: which vector instruction sets the dispatcher may bind
//! - [`SortConfig`]: radix rounds, introsort cutoff and ordering options for argsort
//! - [`ArenaConfig`]: capacity and alignment of an [`ArenaAllocator`](crate::ArenaAllocator)
//!
//! # Preset Configurations
//!
//! ```rust
//! use strand::config::{Config, SortConfig};
//!
//! let fast = SortConfig::performance_preset();
//! let small = SortConfig::memory_preset();
//! assert!(fast.radix_rounds >= small.radix_rounds);
//! ```
//!
//! # Environment Initialization
//!
//! Configurations can be read from environment variables, `STRAND_` by default:
//!
//! ```rust
//! use strand::config::{Config, DispatchConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // STRAND_DISPATCH_AVX512=0 disables AVX-512 kernels
//! let config = DispatchConfig::from_env()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, StrandError};
use serde::{de::DeserializeOwned, Serialize};
use std::env;
use std::fmt;
use std::path::Path;

pub mod arena;
pub mod dispatch;
pub mod sort;


pub use arena::ArenaConfig;
pub use dispatch::DispatchConfig;
pub use sort::SortConfig;

/// Default prefix for environment variables
pub const ENV_PREFIX: &str = "STRAND_";

/// Common configuration trait providing validation, environment initialization,
/// presets and JSON persistence.
pub trait Config: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Validate the configuration for correctness and consistency.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from `STRAND_*` environment variables.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Initialize configuration from environment variables with a custom prefix.
    ///
    /// Unset or unparsable variables keep their default value; the result is
    /// validated before being returned.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset tuned for throughput.
    fn performance_preset() -> Self;

    /// Preset tuned for a small scratch footprint.
    fn memory_preset() -> Self;

    /// Preset tuned for predictable latency.
    fn realtime_preset() -> Self;

    /// Balanced preset, the default.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a JSON file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized).map_err(|e| {
            StrandError::configuration(format!("failed to write config file: {}", e))
        })?;
        Ok(())
    }

    /// Load and validate configuration from a JSON file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StrandError::configuration(format!("failed to read config file: {}", e))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration validation error details.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// The invalid value
    pub value: String,
    /// Description of why the value is invalid
    pub reason: String,
    /// Suggested valid values or ranges
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(field: &str, value: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
            suggestion: None,
        }
    }

    /// Add a suggestion for valid values.
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid configuration for field '{}': value '{}' is invalid ({})",
            self.field, self.value, self.reason
        )?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". Suggested values: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for StrandError {
    fn from(err: ValidationError) -> Self {
        StrandError::configuration(err.to_string())
    }
}

/// Parse an environment variable, falling back to `default` when unset or unparsable.
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable.
///
/// Accepts `true`, `1`, `yes`, `on` (case-insensitive) as true and
/// `false`, `0`, `no`, `off` as false; anything else keeps `default`.
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|s| match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
