//! Schema-based form validator.
//!
//! `FormValidator` implements the `Validator` trait from `clinica-core`.
//! Validation runs in two phases:
//!
//! 1. **Structural**: the payload is validated against
//!    `FormSchema::json_schema` using the `jsonschema` crate.
//! 2. **Cross-field**: each `ValidationRule` in `FormSchema::rules` is
//!    evaluated in order. All failures are collected before returning so the
//!    form can highlight every offending field at once.
//!
//! Custom rules delegate to named functions registered via `register_rule`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use clinica_contracts::{
    error::ClinicaResult,
    validation::{FieldFailure, FormSchema, ValidationReport, ValidationRuleType},
};
use clinica_core::traits::Validator;

/// A caller-supplied validation function.
///
/// Receives the full form payload. Returns `Some(message)` when the check
/// fails, or `None` on success.
pub type CustomRuleFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct FormValidator {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl FormValidator {
    /// Create a validator with no custom rules registered.
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom validation function under `name`.
    ///
    /// The name must match the `function_name` of a `ValidationRuleType::Custom`
    /// rule. Registering the same name twice replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Resolve a dot-notation field path (e.g. `"passport.number"`). Returns
    /// `None` when any segment is missing or the value is JSON `null`.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Missing, `null`, whitespace-only strings and empty arrays are blank.
    fn is_blank(payload: &Value, path: &str) -> bool {
        match Self::resolve_path(payload, path) {
            None => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    fn failure(rule_id: &str, field: Option<&str>, message: String) -> FieldFailure {
        FieldFailure {
            rule_id: rule_id.to_string(),
            field: field.map(str::to_string),
            message,
        }
    }
}

impl Default for FormValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for FormValidator {
    fn validate(&self, payload: &Value, schema: &FormSchema) -> ClinicaResult<ValidationReport> {
        let mut failures: Vec<FieldFailure> = Vec::new();

        // ── Phase 1: JSON Schema structural validation ────────────────────────
        if !schema.json_schema.is_null() {
            match jsonschema::validator_for(&schema.json_schema) {
                Ok(validator) => {
                    for error in validator.iter_errors(payload) {
                        let path = error.instance_path.to_string();
                        let field = path.trim_start_matches('/').replace('/', ".");
                        let message = format!("JSON Schema violation at {}: {}", path, error);
                        warn!(schema_id = %schema.schema_id, %message, "structural validation failure");
                        failures.push(Self::failure(
                            "json-schema",
                            (!field.is_empty()).then_some(field.as_str()),
                            message,
                        ));
                    }
                }
                Err(e) => {
                    let message = format!("invalid JSON Schema document: {e}");
                    warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                    failures.push(Self::failure("json-schema", None, message));
                }
            }
        }

        // ── Phase 2: Cross-field rules ────────────────────────────────────────
        for rule in &schema.rules {
            debug!(rule_id = %rule.rule_id, description = %rule.description, "evaluating form rule");
            let before = failures.len();

            match &rule.rule_type {
                ValidationRuleType::RequiredField { field } => {
                    if Self::is_blank(payload, field) {
                        failures.push(Self::failure(
                            &rule.rule_id,
                            Some(field),
                            format!("required field '{field}' is missing or blank"),
                        ));
                    }
                }

                // One failure per blank member, so each gets highlighted.
                ValidationRuleType::AllOrNone { fields } => {
                    let filled: Vec<&String> =
                        fields.iter().filter(|f| !Self::is_blank(payload, f)).collect();
                    if !filled.is_empty() && filled.len() < fields.len() {
                        for field in fields.iter().filter(|f| Self::is_blank(payload, f)) {
                            failures.push(Self::failure(
                                &rule.rule_id,
                                Some(field),
                                format!(
                                    "field '{field}' is required because '{}' is filled",
                                    filled[0]
                                ),
                            ));
                        }
                    }
                }

                ValidationRuleType::RequiredWhen {
                    field,
                    when_field,
                    equals,
                } => {
                    let triggered = Self::resolve_path(payload, when_field) == Some(equals);
                    if triggered && Self::is_blank(payload, field) {
                        failures.push(Self::failure(
                            &rule.rule_id,
                            Some(field),
                            format!("field '{field}' is required when '{when_field}' is {equals}"),
                        ));
                    }
                }

                // An unregistered name is itself a failure.
                ValidationRuleType::Custom { function_name } => {
                    let message = match self.custom_rules.get(function_name.as_str()) {
                        Some(f) => f(payload),
                        None => Some(format!(
                            "no custom rule registered for function name '{function_name}'"
                        )),
                    };
                    if let Some(message) = message {
                        failures.push(Self::failure(&rule.rule_id, None, message));
                    }
                }
            }

            for failure in &failures[before..] {
                warn!(
                    rule_id = %failure.rule_id,
                    field = failure.field.as_deref().unwrap_or("-"),
                    message = %failure.message,
                    "form rule failed"
                );
            }
        }

        let report = ValidationReport::from_failures(failures);
        debug!(
            schema_id = %schema.schema_id,
            passed = report.passed,
            failure_count = report.failures.len(),
            "form validation complete"
        );
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
