//! Configuration schema and loading.
//!
//! Example:
//! ```toml
//! [autosave]
//! delay_ms = 2000
//!
//! [reference_ranges]
//! pediatric_age_limit = 18
//!
//! [logging]
//! filter = "clinica_core=debug,warn"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use clinica_contracts::error::{ClinicaError, ClinicaResult};
use clinica_core::{
    autosave::{AutosaveDebouncer, DEFAULT_AUTOSAVE_DELAY_MS, MAX_AUTOSAVE_DELAY_MS},
    range::{RangeResolver, DEFAULT_PEDIATRIC_AGE_LIMIT},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Milliseconds between the last edit and the automatic save. Must be
    /// non-zero and at most one day.
    pub delay_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceRangeConfig {
    /// Patients younger than this use the `children` range segment.
    pub pediatric_age_limit: u32,
}

impl Default for ReferenceRangeConfig {
    fn default() -> Self {
        Self {
            pediatric_age_limit: DEFAULT_PEDIATRIC_AGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive string. `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

/// The top-level structure deserialized from a TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub autosave: AutosaveConfig,
    pub reference_ranges: ReferenceRangeConfig,
    pub logging: LoggingConfig,
}

impl ClinicConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `ClinicaError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or holds an out-of-range value.
    pub fn from_toml_str(s: &str) -> ClinicaResult<Self> {
        let config: ClinicConfig = toml::from_str(s).map_err(|e| ClinicaError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            autosave_delay_ms = config.autosave.delay_ms,
            pediatric_age_limit = config.reference_ranges.pediatric_age_limit,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> ClinicaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ClinicaError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> ClinicaResult<()> {
        if self.autosave.delay_ms == 0 {
            return Err(ClinicaError::ConfigError {
                reason: "autosave.delay_ms must be greater than zero".to_string(),
            });
        }
        if self.autosave.delay_ms > MAX_AUTOSAVE_DELAY_MS {
            return Err(ClinicaError::ConfigError {
                reason: format!(
                    "autosave.delay_ms must be at most {MAX_AUTOSAVE_DELAY_MS} (one day), got {}",
                    self.autosave.delay_ms
                ),
            });
        }
        if self.reference_ranges.pediatric_age_limit == 0 {
            return Err(ClinicaError::ConfigError {
                reason: "reference_ranges.pediatric_age_limit must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn autosave_debouncer(&self) -> AutosaveDebouncer {
        AutosaveDebouncer::from_millis(self.autosave.delay_ms)
    }

    pub fn range_resolver(&self) -> RangeResolver {
        RangeResolver::new(self.reference_ranges.pediatric_age_limit)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn empty_document_takes_defaults() {
        let config = ClinicConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClinicConfig::default());
        assert_eq!(config.autosave.delay_ms, 2000);
        assert_eq!(config.reference_ranges.pediatric_age_limit, 18);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ClinicConfig::from_toml_str(
            r#"
            [autosave]
            delay_ms = 750
        "#,
        )
        .unwrap();
        assert_eq!(config.autosave.delay_ms, 750);
        assert_eq!(config.reference_ranges.pediatric_age_limit, 18);
        assert_eq!(config.autosave_debouncer().delay(), Duration::milliseconds(750));
    }

    #[test]
    fn full_document_parses() {
        let config = ClinicConfig::from_toml_str(
            r#"
            [autosave]
            delay_ms = 3000

            [reference_ranges]
            pediatric_age_limit = 16

            [logging]
            filter = "clinica_core=debug"
        "#,
        )
        .unwrap();
        assert_eq!(config.reference_ranges.pediatric_age_limit, 16);
        assert_eq!(config.range_resolver(), RangeResolver::new(16));
        assert_eq!(config.logging.filter, "clinica_core=debug");
    }

    #[test]
    fn zero_delay_is_rejected() {
        let err = ClinicConfig::from_toml_str("[autosave]\ndelay_ms = 0").unwrap_err();
        assert!(matches!(err, ClinicaError::ConfigError { .. }));
        assert!(err.to_string().contains("delay_ms"));
    }

    #[test]
    fn delay_beyond_one_day_is_rejected() {
        let err = ClinicConfig::from_toml_str("[autosave]\ndelay_ms = 9000000000000000").unwrap_err();
        assert!(matches!(err, ClinicaError::ConfigError { .. }));
        assert!(err.to_string().contains("at most"));

        let config = ClinicConfig::from_toml_str("[autosave]\ndelay_ms = 86400000").unwrap();
        assert_eq!(config.autosave_debouncer().delay(), Duration::days(1));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = ClinicConfig::from_toml_str("[autosave\ndelay_ms = ").unwrap_err();
        assert!(err.to_string().contains("failed to parse config TOML"));
    }

    #[test]
    fn wrong_type_is_config_error() {
        let err = ClinicConfig::from_toml_str("[autosave]\ndelay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ClinicaError::ConfigError { .. }));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = ClinicConfig::from_file(Path::new("/nonexistent/clinica.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
