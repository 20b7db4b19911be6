//! Error types for the clinica crates.
//!
//! All fallible operations return `ClinicaResult<T>`. Variants carry enough
//! context to render a user-facing notification at the component boundary.

use thiserror::Error;

/// The unified error type for the clinica crates.
#[derive(Debug, Error)]
pub enum ClinicaError {
    /// Template content is not valid JSON or does not match a known shape.
    #[error("template content could not be parsed: {reason}")]
    ContentParse { reason: String },

    /// No template with this id is published.
    #[error("template '{id}' not found")]
    TemplateNotFound { id: String },

    /// The envelope was written by a newer schema version than this build
    /// supports. It can be read but not written back.
    #[error("envelope schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    /// A stored result payload matches neither the current envelope nor any
    /// legacy shape.
    #[error("unrecognized result payload: {reason}")]
    UnrecognizedPayload { reason: String },

    /// Form or result validation blocked the operation.
    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// The backend rejected or never acknowledged a save.
    ///
    /// The in-memory draft is kept so the caller can retry.
    #[error("save failed: {reason}")]
    SaveFailed { reason: String },

    /// The owning visit or service order is in a terminal status.
    #[error("result is read-only while owner status is {status}")]
    ResultLocked { status: String },

    /// A status change that the lifecycle does not allow.
    #[error("illegal status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A work schedule day has malformed or inverted times.
    #[error("invalid work schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A JSON Schema document could not be compiled or applied.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },
}

/// Convenience alias used throughout the clinica crates.
pub type ClinicaResult<T> = Result<T, ClinicaError>;
