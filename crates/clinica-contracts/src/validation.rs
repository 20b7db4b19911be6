//! Form validation schema and report types.
//!
//! A form payload is checked against a `FormSchema` before submission. Only a
//! passing `ValidationReport` lets the submission proceed; already-saved data
//! is never touched by a failing check.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything a form payload is checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSchema {
    /// Unique identifier for this schema (e.g. "patient-form-v1").
    pub schema_id: String,
    /// A JSON Schema document for structural checks. `Null` skips the phase.
    pub json_schema: Value,
    /// Cross-field rules evaluated after structural validation.
    pub rules: Vec<ValidationRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Unique identifier for this rule, referenced in failure reports.
    pub rule_id: String,
    pub description: String,
    pub rule_type: ValidationRuleType,
}

/// The kinds of checks the form validator supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationRuleType {
    /// The field must be present and non-blank.
    RequiredField { field: String },

    /// If any field in the group is non-blank, all of them are required.
    /// Each blank member produces its own failure.
    AllOrNone { fields: Vec<String> },

    /// `field` is required when `when_field` equals `equals`.
    RequiredWhen {
        field: String,
        when_field: String,
        equals: Value,
    },

    /// Delegate to a named function registered with the validator.
    Custom { function_name: String },
}

/// The outcome of validating one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if every rule passed.
    pub passed: bool,
    pub failures: Vec<FieldFailure>,
}

impl ValidationReport {
    pub fn from_failures(failures: Vec<FieldFailure>) -> Self {
        Self {
            passed: failures.is_empty(),
            failures,
        }
    }

    /// Names of the fields that failed, in report order, without duplicates.
    pub fn failed_fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for f in &self.failures {
            if let Some(field) = f.field.as_deref() {
                if !out.contains(&field) {
                    out.push(field);
                }
            }
        }
        out
    }
}

/// A single failure, attached to a field when one is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub rule_id: String,
    pub field: Option<String>,
    pub message: String,
}
