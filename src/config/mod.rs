//! Configuration Management
//!
//! Hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (<user config dir>/srsmith/config.toml)
//! 3. Project config (.srsmith/config.toml)
//! 4. Environment variables (SRSMITH_*)
//!
//! `--config FILE` replaces layers 2-4 with that one file; the API key
//! still falls back to the environment.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
