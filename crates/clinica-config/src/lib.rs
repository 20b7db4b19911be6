//! # clinica-config
//!
//! TOML configuration for the clinica crates.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use clinica_config::ClinicConfig;
//!
//! let config = ClinicConfig::from_file(Path::new("clinica.toml"))?;
//! let debouncer = config.autosave_debouncer();
//! ```
//!
//! Every section is optional; a missing section or key takes its default.

pub mod config;

pub use config::{AutosaveConfig, ClinicConfig, LoggingConfig, ReferenceRangeConfig};
