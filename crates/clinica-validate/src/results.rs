//! Filled data checks against the content it was entered for.
//!
//! Required parameters and fields must be non-blank, and NUMBER parameters
//! and number fields must hold a numeric value when filled. Legacy `rows`
//! payloads are read through the same lookup the renderer uses.

use tracing::{debug, warn};

use clinica_contracts::{
    envelope::SavedResultEnvelope,
    error::{ClinicaError, ClinicaResult},
    filled::{FieldValue, FilledData},
    template::{FormFieldKind, ParameterType},
    validation::{FieldFailure, ValidationReport},
};
use clinica_core::{
    content::{parse_template_content, ParsedContent},
    migrate::lookup_value,
};

pub const RULE_REQUIRED_PARAMETER: &str = "required-parameter";
pub const RULE_NUMERIC_VALUE: &str = "numeric-value";

fn check_value(
    failures: &mut Vec<FieldFailure>,
    id: &str,
    label: &str,
    value: Option<FieldValue>,
    required: bool,
    numeric: bool,
) {
    let blank = value.as_ref().map_or(true, FieldValue::is_blank);
    if blank {
        if required {
            failures.push(FieldFailure {
                rule_id: RULE_REQUIRED_PARAMETER.to_string(),
                field: Some(id.to_string()),
                message: format!("'{label}' is required"),
            });
        }
        return;
    }
    if numeric && value.as_ref().and_then(FieldValue::as_number).is_none() {
        failures.push(FieldFailure {
            rule_id: RULE_NUMERIC_VALUE.to_string(),
            field: Some(id.to_string()),
            message: format!("'{label}' must be a number"),
        });
    }
}

pub fn validate_filled_data(content: &ParsedContent, filled: &FilledData) -> ValidationReport {
    let mut failures = Vec::new();
    match content {
        ParsedContent::Analysis(analysis) => {
            for (index, param) in analysis.parameters.iter().enumerate() {
                let id = param.stable_id(index);
                check_value(
                    &mut failures,
                    &id,
                    &param.name,
                    lookup_value(filled, &id, index),
                    param.is_required,
                    param.data_type == ParameterType::Number,
                );
            }
        }
        ParsedContent::Protocol(form) => {
            for field in form.sections.iter().flat_map(|s| s.fields.iter()) {
                check_value(
                    &mut failures,
                    &field.id,
                    &field.label,
                    filled.get(&field.id),
                    field.required,
                    field.kind == FormFieldKind::Number,
                );
            }
        }
    }

    for failure in &failures {
        warn!(
            rule_id = %failure.rule_id,
            field = failure.field.as_deref().unwrap_or("-"),
            "filled data check failed"
        );
    }
    let report = ValidationReport::from_failures(failures);
    debug!(passed = report.passed, failure_count = report.failures.len(), "filled data validated");
    report
}

/// Validate an envelope against its own snapshotted content.
///
/// Unparseable content is a `ContentParse` error: there is nothing to check
/// the data against.
pub fn validate_envelope(envelope: &SavedResultEnvelope) -> ClinicaResult<ValidationReport> {
    let content = parse_template_content(&envelope.template_content)?;
    Ok(validate_filled_data(&content, &envelope.filled_data))
}

/// Turn a failing report into `ValidationFailed`, for callers that gate a
/// submission with `?`.
pub fn ensure_passed(report: &ValidationReport) -> ClinicaResult<()> {
    if report.passed {
        return Ok(());
    }
    let summary = report
        .failures
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(ClinicaError::ValidationFailed { reason: summary })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use clinica_contracts::envelope::ResultContext;
    use clinica_core::{content::parse_content_value, migrate};

    use super::*;

    fn cbc() -> ParsedContent {
        parse_content_value(&json!({
            "parameters": [
                { "id": "hgb", "name": "Hemoglobin", "type": "NUMBER", "unit": "g/L", "isRequired": true },
                { "id": "note", "name": "Comment", "type": "TEXT" },
                { "name": "Platelets", "type": "NUMBER" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn required_blank_parameter_fails() {
        let filled = FilledData::new().set("hgb", FieldValue::Text("  ".into()));
        let report = validate_filled_data(&cbc(), &filled);
        assert!(!report.passed);
        assert_eq!(report.failed_fields(), vec!["hgb"]);
        assert_eq!(report.failures[0].rule_id, RULE_REQUIRED_PARAMETER);
    }

    #[test]
    fn number_parameters_must_be_numeric() {
        let filled = FilledData::new()
            .set("hgb", FieldValue::Text("13,5".into()))
            .set("param-2", FieldValue::Text("lots".into()));
        let report = validate_filled_data(&cbc(), &filled);
        assert_eq!(report.failed_fields(), vec!["param-2"]);
        assert_eq!(report.failures[0].rule_id, RULE_NUMERIC_VALUE);
    }

    #[test]
    fn optional_blank_values_pass() {
        let filled = FilledData::new().set("hgb", FieldValue::Number(140.0));
        assert!(validate_filled_data(&cbc(), &filled).passed);
    }

    #[test]
    fn legacy_rows_are_looked_up() {
        let ctx = ResultContext::for_service_order("p-1", "so-1");
        let legacy = json!({
            "templateContent": {
                "parameters": [{ "id": "glu", "name": "Glucose", "type": "NUMBER", "isRequired": true }]
            },
            "rows": [{ "parameterId": "glu", "value": "abc" }]
        });
        let env = migrate::normalize(&legacy, &ctx).unwrap();
        let report = validate_envelope(&env).unwrap();
        assert_eq!(report.failed_fields(), vec!["glu"]);
        assert_eq!(report.failures[0].rule_id, RULE_NUMERIC_VALUE);
    }

    #[test]
    fn protocol_required_fields_are_checked() {
        let content = parse_content_value(&json!({
            "sections": [{
                "id": "s1",
                "title": "Exam",
                "fields": [
                    { "id": "complaints", "label": "Complaints", "type": "textarea", "required": true },
                    { "id": "pulse", "label": "Pulse", "type": "number" },
                    { "id": "ok", "label": "Stable", "type": "checkbox", "required": true }
                ]
            }]
        }))
        .unwrap();
        let filled = content.initial_filled_data().set("pulse", FieldValue::Text("fast".into()));
        let report = validate_filled_data(&content, &filled);
        assert_eq!(report.failed_fields(), vec!["complaints", "pulse"]);
    }

    #[test]
    fn unparseable_snapshot_is_content_error() {
        let ctx = ResultContext::for_visit("p-1", "v-1");
        let mut env = migrate::normalize(&json!({ "formData": {} }), &ctx).unwrap();
        env.template_content = "not json".to_string();
        assert!(matches!(validate_envelope(&env), Err(ClinicaError::ContentParse { .. })));
    }

    #[test]
    fn ensure_passed_maps_to_validation_failed() {
        let filled = FilledData::new();
        let report = validate_filled_data(&cbc(), &filled);
        let err = ensure_passed(&report).unwrap_err();
        assert!(matches!(err, ClinicaError::ValidationFailed { .. }));
        assert!(err.to_string().contains("Hemoglobin"));
        assert!(ensure_passed(&ValidationReport::from_failures(vec![])).is_ok());
    }
}
