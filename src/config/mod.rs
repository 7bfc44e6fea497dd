//! Configuration module for Gleaner
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Credentials never live in the file itself; the config names the
//! environment variables they are read from.
//!
//! # Example
//!
//! ```no_run
//! use gleaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gleaner.toml")).unwrap();
//! println!("Sink kind: {:?}", config.sink.kind);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, FetchConfig, FetchFailurePolicy, SinkConfig, SinkKind,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
