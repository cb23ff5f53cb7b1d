//! # System Integration
//!
//! Host CPU inspection. The detected [`Capability`] mask feeds the dispatcher in
//! [`crate::simd`].

pub mod cpu_features;

pub use cpu_features::{cpu_info, detect_capabilities, Capability, CpuInfo, RuntimeCpuFeatures};
