//! # placer-core
//! Foundation types and pure functions for the Placer mining simulator.

pub mod chain;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod threshold;
pub mod types;
