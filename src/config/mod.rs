//! Configuration module for Exhibitor-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use exhibitor_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Scraping pages {}..={}", config.run.start_page, config.run.end_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserSettings, Config, OutputConfig, RunConfig, SiteConfig, TranslateConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
