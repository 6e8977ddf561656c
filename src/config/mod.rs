//! Configuration module for ScaleLib
//!
//! Provides the autoscale configuration document, default lock file
//! resolution, and CLI arguments.

mod settings;

pub use settings::*;
