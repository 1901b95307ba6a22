//! # Wirebox Support
//!
//! Shared utilities for the Wirebox container crates.
//!
//! This crate provides:
//! - "Did you mean?" suggestions for unknown identifiers
//! - Short type-name rendering for diagnostics

pub mod rendering;
