//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/tableguide/config.toml)
//! 3. Project config (./tableguide.toml or `--config`)
//! 4. Environment variables (TABLE_GUIDE_*, plus LLM_PAR and USE_GLEAN_STUB)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
