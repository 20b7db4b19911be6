//! Template content parsing and structural discrimination.
//!
//! Content documents carry no type tag. Legacy payloads never had one, so the
//! two shapes are told apart by structure:
//!
//! - a form-builder document is an object with a `sections` array;
//! - an analysis document is an object with a `parameters` array, or a bare
//!   array of parameters.

use serde_json::Value;
use tracing::debug;

use clinica_contracts::{
    error::{ClinicaError, ClinicaResult},
    filled::{FieldValue, FilledData},
    template::{AnalysisContent, AnalysisParameter, FormBuilderContent, FormFieldKind, TemplateDefinition},
};

/// A parsed template content document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    Analysis(AnalysisContent),
    Protocol(FormBuilderContent),
}

impl ParsedContent {
    /// Every key a filled value may legitimately be stored under.
    pub fn field_ids(&self) -> Vec<String> {
        match self {
            ParsedContent::Analysis(content) => content
                .parameters
                .iter()
                .enumerate()
                .map(|(i, p)| p.stable_id(i))
                .collect(),
            ParsedContent::Protocol(content) => content
                .sections
                .iter()
                .flat_map(|s| s.fields.iter().map(|f| f.id.clone()))
                .collect(),
        }
    }

    /// Filled data holding the starting value for every field.
    ///
    /// Booleans and checkboxes start `false`; everything else starts blank.
    pub fn initial_filled_data(&self) -> FilledData {
        let mut data = FilledData::new();
        match self {
            ParsedContent::Analysis(content) => {
                for (i, param) in content.parameters.iter().enumerate() {
                    data = data.set(param.stable_id(i), param.data_type.default_value());
                }
            }
            ParsedContent::Protocol(content) => {
                for field in content.sections.iter().flat_map(|s| s.fields.iter()) {
                    let initial = match field.kind {
                        FormFieldKind::Checkbox => FieldValue::Bool(false),
                        _ => FieldValue::Text(String::new()),
                    };
                    data = data.set(field.id.clone(), initial);
                }
            }
        }
        data
    }

    /// Serialize back to the JSON string stored in an envelope.
    pub fn to_content_string(&self) -> ClinicaResult<String> {
        let result = match self {
            ParsedContent::Analysis(content) => serde_json::to_string(content),
            ParsedContent::Protocol(content) => serde_json::to_string(content),
        };
        result.map_err(|e| ClinicaError::ContentParse {
            reason: format!("failed to serialize template content: {e}"),
        })
    }
}

/// True if `value` has the shape of a form-builder document.
pub fn is_form_builder_content(value: &Value) -> bool {
    match value.get("sections") {
        Some(Value::Array(sections)) => sections
            .iter()
            .all(|s| s.is_object() && s.get("fields").map_or(true, Value::is_array)),
        _ => false,
    }
}

/// True if `value` has the shape of an analysis document.
pub fn is_analysis_content(value: &Value) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(map) => matches!(map.get("parameters"), Some(Value::Array(_))),
        _ => false,
    }
}

/// Parse an already-decoded JSON value into a content document.
pub fn parse_content_value(value: &Value) -> ClinicaResult<ParsedContent> {
    if is_form_builder_content(value) {
        let content: FormBuilderContent =
            serde_json::from_value(value.clone()).map_err(|e| ClinicaError::ContentParse {
                reason: format!("malformed form-builder content: {e}"),
            })?;
        return Ok(ParsedContent::Protocol(content));
    }

    if is_analysis_content(value) {
        let list = match value {
            Value::Array(_) => value.clone(),
            _ => value.get("parameters").cloned().unwrap_or(Value::Null),
        };
        let parameters: Vec<AnalysisParameter> =
            serde_json::from_value(list).map_err(|e| ClinicaError::ContentParse {
                reason: format!("malformed analysis parameters: {e}"),
            })?;
        return Ok(ParsedContent::Analysis(AnalysisContent { parameters }));
    }

    Err(ClinicaError::ContentParse {
        reason: "content is neither a form-builder document nor a parameter list".to_string(),
    })
}

/// Parse a template content string.
pub fn parse_template_content(raw: &str) -> ClinicaResult<ParsedContent> {
    if raw.trim().is_empty() {
        return Err(ClinicaError::ContentParse {
            reason: "template content is empty".to_string(),
        });
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| ClinicaError::ContentParse {
        reason: format!("template content is not valid JSON: {e}"),
    })?;
    let parsed = parse_content_value(&value)?;
    let kind = match parsed {
        ParsedContent::Analysis(_) => "analysis",
        ParsedContent::Protocol(_) => "protocol",
    };
    debug!(kind, "parsed template content");
    Ok(parsed)
}

/// The content document a live template would be snapshotted as.
pub fn content_of(template: &TemplateDefinition) -> ClinicaResult<ParsedContent> {
    match template {
        TemplateDefinition::Analysis(t) => Ok(ParsedContent::Analysis(AnalysisContent {
            parameters: t.parameters.clone(),
        })),
        TemplateDefinition::Protocol(t) => match parse_template_content(&t.content)? {
            protocol @ ParsedContent::Protocol(_) => Ok(protocol),
            ParsedContent::Analysis(_) => Err(ClinicaError::ContentParse {
                reason: format!("protocol template '{}' does not contain form-builder content", t.id),
            }),
        },
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
