//! Backend dispatch configuration.

use super::{parse_env_bool, Config, ValidationError};
use crate::error::Result;
use crate::system::Capability;
use serde::{Deserialize, Serialize};

/// Which vector instruction sets the dispatcher may bind.
///
/// The serial baseline is always allowed. Flags only ever narrow what the
/// hardware offers: enabling AVX-512 on a CPU without it binds AVX2 (or lower).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Master switch for every vector backend
    pub enable_simd: bool,
    /// Allow SSE4.2 kernels
    pub enable_sse42: bool,
    /// Allow AVX2 kernels
    pub enable_avx2: bool,
    /// Allow AVX-512BW kernels (also requires the `avx512` cargo feature)
    pub enable_avx512: bool,
    /// Allow NEON kernels
    pub enable_neon: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enable_simd: true,
            enable_sse42: true,
            enable_avx2: true,
            enable_avx512: true,
            enable_neon: true,
        }
    }
}

impl DispatchConfig {
    /// Configuration that only ever binds the serial backends
    pub fn serial_only() -> Self {
        Self {
            enable_simd: false,
            enable_sse42: false,
            enable_avx2: false,
            enable_avx512: false,
            enable_neon: false,
        }
    }

    /// Capability mask this configuration allows, before intersecting with the CPU
    pub fn capability_mask(&self) -> Capability {
        let mut mask = Capability::SERIAL;
        if !self.enable_simd {
            return mask;
        }
        mask.set(Capability::SSE42, self.enable_sse42);
        mask.set(Capability::AVX2, self.enable_avx2);
        mask.set(Capability::AVX512, self.enable_avx512);
        mask.set(Capability::NEON, self.enable_neon);
        mask
    }
}

impl Config for DispatchConfig {
    fn validate(&self) -> Result<()> {
        if self.enable_simd
            && !(self.enable_sse42 || self.enable_avx2 || self.enable_avx512 || self.enable_neon)
        {
            return Err(ValidationError::new(
                "enable_simd",
                "true",
                "no instruction set is enabled",
            )
            .with_suggestion("set enable_simd to false, or enable at least one instruction set")
            .into());
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.enable_simd = parse_env_bool(&format!("{}DISPATCH_SIMD", prefix), config.enable_simd);
        config.enable_sse42 = parse_env_bool(&format!("{}DISPATCH_SSE42", prefix), config.enable_sse42);
        config.enable_avx2 = parse_env_bool(&format!("{}DISPATCH_AVX2", prefix), config.enable_avx2);
        config.enable_avx512 =
            parse_env_bool(&format!("{}DISPATCH_AVX512", prefix), config.enable_avx512);
        config.enable_neon = parse_env_bool(&format!("{}DISPATCH_NEON", prefix), config.enable_neon);
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self::default()
    }

    fn memory_preset() -> Self {
        Self::default()
    }

    fn realtime_preset() -> Self {
        // wide AVX-512 units can downclock the core on some parts
        Self {
            enable_avx512: false,
            ..Self::default()
        }
    }
}
