//! Configuration module for Wayback-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and layering command-line values over them.
//!
//! # Example
//!
//! ```no_run
//! use wayback_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring into: {}", config.output.directory);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, CrawlerConfig, MirrorConfig, OutputConfig, UserAgentConfig,
    DEFAULT_FROM, DEFAULT_TO,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, resolve_config, ConfigOverrides};
pub use validation::validate;
