//! # Capability Detection
//!
//! Runtime CPU feature detection producing the [`Capability`] mask the dispatcher
//! binds against. Detection runs once per process; unrecognized targets degrade
//! to [`Capability::SERIAL`] and never report an error.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

bitflags! {
    /// Bitmask of instruction-set families a backend may require.
    ///
    /// Bit 0 is the serial baseline and is always present in a detected mask.
    /// A backend is eligible when its required bits are a subset of the mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Capability: u32 {
        /// Portable scalar and word-parallel (SWAR) code
        const SERIAL = 1 << 0;
        /// SSE4.2 + SSSE3 + POPCNT, 16-byte vectors
        const SSE42 = 1 << 1;
        /// AVX2, 32-byte vectors
        const AVX2 = 1 << 2;
        /// AVX-512 F/BW/VL, 64-byte vectors with mask registers
        const AVX512 = 1 << 3;
        /// AArch64 Advanced SIMD, 16-byte vectors
        const NEON = 1 << 4;
    }
}

impl Capability {
    /// Widest vector width in bytes usable under this mask
    pub fn vector_width(self) -> usize {
        if self.contains(Self::AVX512) {
            64
        } else if self.contains(Self::AVX2) {
            32
        } else if self.intersects(Self::SSE42 | Self::NEON) {
            16
        } else {
            8
        }
    }

    /// Short human-readable name of the highest tier in the mask
    pub fn tier_name(self) -> &'static str {
        if self.contains(Self::AVX512) {
            "avx512"
        } else if self.contains(Self::AVX2) {
            "avx2"
        } else if self.contains(Self::SSE42) {
            "sse42"
        } else if self.contains(Self::NEON) {
            "neon"
        } else {
            "serial"
        }
    }

    /// All masks worth binding on this machine, from the serial baseline upwards.
    ///
    /// Each entry is a prefix of the detected capability ladder, which is what
    /// backend-equivalence tests iterate over.
    pub fn ladder(self) -> Vec<Capability> {
        let mut masks = vec![Self::SERIAL];
        let mut acc = Self::SERIAL;
        for tier in [Self::SSE42, Self::AVX2, Self::AVX512, Self::NEON] {
            if self.contains(tier) {
                acc |= tier;
                masks.push(acc);
            }
        }
        masks
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::SERIAL
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(&name.to_ascii_lowercase())?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Host CPU description captured at detection time
#[derive(Debug, Clone)]
pub struct CpuInfo {
    /// CPU vendor (GenuineIntel, AuthenticAMD, ARM, ...)
    pub vendor: String,
    /// CPU brand string
    pub model: String,
    /// Detected capability mask
    pub capabilities: Capability,
}

/// Runtime CPU feature detection interface
pub struct RuntimeCpuFeatures;

impl RuntimeCpuFeatures {
    /// Detect the capability mask and CPU identification of the host
    pub fn detect() -> CpuInfo {
        let (vendor, model) = Self::cpu_identity();
        CpuInfo {
            vendor,
            model,
            capabilities: Self::detect_capabilities(),
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_capabilities() -> Capability {
        let mut caps = Capability::SERIAL;
        if is_x86_feature_detected!("sse4.2")
            && is_x86_feature_detected!("ssse3")
            && is_x86_feature_detected!("popcnt")
        {
            caps |= Capability::SSE42;
        }
        if is_x86_feature_detected!("avx2") {
            caps |= Capability::AVX2;
        }
        if is_x86_feature_detected!("avx512f")
            && is_x86_feature_detected!("avx512bw")
            && is_x86_feature_detected!("avx512vl")
        {
            caps |= Capability::AVX512;
        }
        caps
    }

    #[cfg(target_arch = "aarch64")]
    fn detect_capabilities() -> Capability {
        let mut caps = Capability::SERIAL;
        if std::arch::is_aarch64_feature_detected!("neon") {
            caps |= Capability::NEON;
        }
        caps
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn detect_capabilities() -> Capability {
        Capability::SERIAL
    }

    #[cfg(target_arch = "x86_64")]
    fn cpu_identity() -> (String, String) {
        let cpuid = raw_cpuid::CpuId::new();
        let vendor = cpuid
            .get_vendor_info()
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let model = cpuid
            .get_processor_brand_string()
            .map(|b| b.as_str().trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        (vendor, model)
    }

    #[cfg(target_arch = "aarch64")]
    fn cpu_identity() -> (String, String) {
        let mut vendor = "ARM".to_string();
        let mut model = "Unknown".to_string();
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            for line in cpuinfo.lines() {
                if line.starts_with("CPU implementer") && line.contains("0x51") {
                    vendor = "Qualcomm".to_string();
                } else if line.starts_with("CPU implementer") && line.contains("0x61") {
                    vendor = "Apple".to_string();
                } else if line.starts_with("model name") {
                    if let Some(name) = line.split(':').nth(1) {
                        model = name.trim().to_string();
                    }
                }
            }
        }
        (vendor, model)
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn cpu_identity() -> (String, String) {
        ("Unknown".to_string(), "Unknown".to_string())
    }
}

static CPU_INFO: OnceLock<CpuInfo> = OnceLock::new();

/// Host CPU description, detected once on first call
pub fn cpu_info() -> &'static CpuInfo {
    CPU_INFO.get_or_init(|| {
        let info = RuntimeCpuFeatures::detect();
        log::info!(
            "Detected CPU {} ({}) with capabilities {}",
            info.model,
            info.vendor,
            info.capabilities
        );
        info
    })
}

/// Capability mask of the host CPU, detected once and cached
#[inline]
pub fn detect_capabilities() -> Capability {
    cpu_info().capabilities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_always_has_serial() {
        let caps = detect_capabilities();
        assert!(caps.contains(Capability::SERIAL));
        println!("CPU: {} {}", cpu_info().vendor, cpu_info().model);
        println!("Capabilities: {}", caps);
    }

    #[test]
    fn test_detection_is_cached() {
        let a = cpu_info() as *const CpuInfo;
        let b = cpu_info() as *const CpuInfo;
        assert_eq!(a, b);
    }

    #[test]
    fn test_ladder_is_monotonic() {
        let all = Capability::SERIAL | Capability::SSE42 | Capability::AVX2;
        let ladder = all.ladder();
        assert_eq!(ladder.len(), 3);
        assert_eq!(ladder[0], Capability::SERIAL);
        for pair in ladder.windows(2) {
            assert!(pair[1].contains(pair[0]));
        }
        assert_eq!(Capability::SERIAL.ladder(), vec![Capability::SERIAL]);
    }

    #[test]
    fn test_vector_width_and_names() {
        assert_eq!(Capability::SERIAL.vector_width(), 8);
        assert_eq!((Capability::SERIAL | Capability::NEON).vector_width(), 16);
        assert_eq!((Capability::SERIAL | Capability::AVX2).vector_width(), 32);
        assert_eq!(Capability::all().tier_name(), "avx512");
        assert_eq!(Capability::SERIAL.tier_name(), "serial");
    }

    #[test]
    fn test_display() {
        let caps = Capability::SERIAL | Capability::AVX2;
        assert_eq!(caps.to_string(), "serial|avx2");
        assert_eq!(Capability::empty().to_string(), "none");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_x86_masks_match_std_detection() {
        let caps = detect_capabilities();
        assert_eq!(caps.contains(Capability::AVX2), is_x86_feature_detected!("avx2"));
        assert!(!caps.contains(Capability::NEON));
    }
}
