//! Normalization of stored result payloads into the current envelope.
//!
//! This is the one place that sniffs payload structure. Shapes are tested in
//! a fixed order and the first match wins:
//!
//! 1. `filledData` object          → current envelope
//! 2. `rows` array                 → legacy analysis result
//! 3. `formData` object            → legacy protocol result
//! 4. anything else                → `UnrecognizedPayload`
//!
//! A payload carrying both `rows` and `formData` is read as an analysis
//! result and logged, since a legacy analysis record is the only writer known
//! to have emitted a `rows` array.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use clinica_contracts::{
    envelope::{ResultContext, ResultMetadata, SavedResultEnvelope, ENVELOPE_SCHEMA_VERSION},
    error::{ClinicaError, ClinicaResult},
    filled::{FieldValue, FilledData},
    template::{
        AnalysisContent, AnalysisParameter, FormBuilderContent, FormField, FormFieldKind,
        FormSection, ParameterType, ReferenceRanges,
    },
};

/// Section id of the placeholder built for a legacy protocol that never
/// stored its template.
pub const LEGACY_PROTOCOL_SECTION_ID: &str = "legacy";

/// The structural shape a stored payload was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Envelope,
    LegacyAnalysis,
    LegacyProtocol,
}

/// Classify `payload` by structure. `None` if no shape matches.
pub fn detect_shape(payload: &Value) -> Option<PayloadShape> {
    let object = payload.as_object()?;

    if matches!(object.get("filledData"), Some(Value::Object(_))) {
        return Some(PayloadShape::Envelope);
    }

    let has_rows = matches!(object.get("rows"), Some(Value::Array(_)));
    let has_form_data = matches!(object.get("formData"), Some(Value::Object(_)));

    if has_rows && has_form_data {
        warn!(
            template_id = ?object.get("templateId"),
            "payload has both rows and formData; reading as legacy analysis"
        );
    }

    if has_rows {
        Some(PayloadShape::LegacyAnalysis)
    } else if has_form_data {
        Some(PayloadShape::LegacyProtocol)
    } else {
        None
    }
}

/// Normalize any supported payload into a current envelope.
///
/// `ctx` fills in provenance the legacy shapes never stored.
pub fn normalize(payload: &Value, ctx: &ResultContext) -> ClinicaResult<SavedResultEnvelope> {
    let shape = detect_shape(payload).ok_or_else(|| ClinicaError::UnrecognizedPayload {
        reason: "payload has none of filledData, rows or formData".to_string(),
    })?;
    // detect_shape only matches objects.
    let object = payload.as_object().ok_or_else(|| ClinicaError::UnrecognizedPayload {
        reason: "payload is not a JSON object".to_string(),
    })?;

    debug!(?shape, "normalizing result payload");

    match shape {
        PayloadShape::Envelope => normalize_envelope(object, ctx),
        PayloadShape::LegacyAnalysis => normalize_legacy_analysis(object, ctx),
        PayloadShape::LegacyProtocol => normalize_legacy_protocol(object, ctx),
    }
}

/// Normalize a JSON-encoded payload, as stored in a visit's `protocolData`.
pub fn normalize_str(raw: &str, ctx: &ResultContext) -> ClinicaResult<SavedResultEnvelope> {
    if raw.trim().is_empty() {
        return Err(ClinicaError::UnrecognizedPayload {
            reason: "payload is empty".to_string(),
        });
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| ClinicaError::UnrecognizedPayload {
        reason: format!("payload is not valid JSON: {e}"),
    })?;
    normalize(&value, ctx)
}

/// The value for parameter `id` at position `index`, looking first at keyed
/// filled data and then at a legacy `rows` array.
///
/// Rows match on `parameterId` or `id`; rows without either match by
/// position against the positional `param-{index}` id.
pub fn lookup_value(filled: &FilledData, id: &str, index: usize) -> Option<FieldValue> {
    if let Some(v) = filled.get(id) {
        return Some(v);
    }
    let rows = filled.raw("rows")?.as_array()?;

    let by_id = rows.iter().find(|row| row_id(row).as_deref() == Some(id));
    let row = match by_id {
        Some(row) => row,
        None if id == format!("param-{index}") => rows.get(index).filter(|r| row_id(r).is_none())?,
        None => return None,
    };
    row.get("value").and_then(FieldValue::from_json)
}

// ── Shape handlers ────────────────────────────────────────────────────────────

fn normalize_envelope(
    object: &Map<String, Value>,
    ctx: &ResultContext,
) -> ClinicaResult<SavedResultEnvelope> {
    let schema_version = object
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(ENVELOPE_SCHEMA_VERSION);
    if schema_version > ENVELOPE_SCHEMA_VERSION {
        warn!(
            schema_version,
            supported = ENVELOPE_SCHEMA_VERSION,
            "envelope written by a newer schema version; reading known fields, writes refused"
        );
    }

    let filled_data = object
        .get("filledData")
        .and_then(Value::as_object)
        .map(FilledData::from_object)
        .unwrap_or_default();

    let metadata = match object.get("metadata") {
        Some(meta) => serde_json::from_value::<ResultMetadata>(meta.clone()).unwrap_or_else(|e| {
            warn!(error = %e, "envelope metadata unreadable; using caller context");
            ResultMetadata::new(ctx, meta.as_object().and_then(read_timestamp))
        }),
        None => ResultMetadata::new(ctx, None),
    };

    let template_content = match content_field(object) {
        Some(content) => content,
        None => {
            warn!("envelope has no templateContent; result will render empty");
            String::new()
        }
    };

    Ok(SavedResultEnvelope {
        schema_version,
        template_id: string_field(object, "templateId"),
        template_name: string_field(object, "templateName").unwrap_or_default(),
        template_content,
        filled_data,
        metadata,
    })
}

fn normalize_legacy_analysis(
    object: &Map<String, Value>,
    ctx: &ResultContext,
) -> ClinicaResult<SavedResultEnvelope> {
    let rows = object
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let template_content = match content_field(object) {
        Some(content) => content,
        None => placeholder_from_rows(&rows)?,
    };

    debug!(rows = rows.len(), "migrated legacy analysis result");

    Ok(SavedResultEnvelope {
        schema_version: ENVELOPE_SCHEMA_VERSION,
        template_id: string_field(object, "templateId"),
        template_name: string_field(object, "templateName").unwrap_or_default(),
        template_content,
        filled_data: FilledData::new().set_raw("rows", Value::Array(rows)),
        metadata: ResultMetadata::new(ctx, read_timestamp(object)),
    })
}

fn normalize_legacy_protocol(
    object: &Map<String, Value>,
    ctx: &ResultContext,
) -> ClinicaResult<SavedResultEnvelope> {
    let filled_data = object
        .get("formData")
        .and_then(Value::as_object)
        .map(FilledData::from_object)
        .unwrap_or_default();

    let template_content = match content_field(object) {
        Some(content) => content,
        None => placeholder_from_form_data(&filled_data)?,
    };

    debug!(fields = filled_data.len(), "migrated legacy protocol result");

    Ok(SavedResultEnvelope {
        schema_version: ENVELOPE_SCHEMA_VERSION,
        template_id: string_field(object, "templateId"),
        template_name: string_field(object, "templateName").unwrap_or_default(),
        template_content,
        filled_data,
        metadata: ResultMetadata::new(ctx, read_timestamp(object)),
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `templateContent` as a string. Some writers stored the document inline
/// as an object; it is re-encoded.
fn content_field(object: &Map<String, Value>) -> Option<String> {
    match object.get("templateContent")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        v @ (Value::Object(_) | Value::Array(_)) => Some(v.to_string()),
        _ => None,
    }
}

fn read_timestamp(object: &Map<String, Value>) -> Option<DateTime<Utc>> {
    ["filledAt", "completedAt", "updatedAt"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .find_map(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_id(row: &Value) -> Option<String> {
    ["parameterId", "id"]
        .iter()
        .filter_map(|key| row.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Best-effort parameter list reconstructed from legacy rows.
fn placeholder_from_rows(rows: &[Value]) -> ClinicaResult<String> {
    let parameters = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let name = ["name", "parameterName"]
                .iter()
                .filter_map(|key| row.get(*key).and_then(Value::as_str))
                .find(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Parameter {}", i + 1));

            let data_type = row
                .get("type")
                .and_then(|t| serde_json::from_value::<ParameterType>(t.clone()).ok())
                .unwrap_or_else(|| match row.get("value") {
                    Some(Value::Bool(_)) => ParameterType::Boolean,
                    Some(Value::Number(_)) => ParameterType::Number,
                    _ => ParameterType::Text,
                });

            AnalysisParameter {
                id: row_id(row),
                name,
                data_type,
                unit: row
                    .get("unit")
                    .and_then(Value::as_str)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string),
                reference_ranges: row
                    .get("referenceRanges")
                    .and_then(|r| serde_json::from_value::<ReferenceRanges>(r.clone()).ok()),
                is_required: false,
            }
        })
        .collect();

    serde_json::to_string(&AnalysisContent { parameters }).map_err(|e| ClinicaError::ContentParse {
        reason: format!("failed to encode placeholder content: {e}"),
    })
}

/// One section with a field per stored key: checkbox for booleans, text
/// otherwise, labelled with the key itself.
fn placeholder_from_form_data(filled: &FilledData) -> ClinicaResult<String> {
    let fields = filled
        .keys()
        .map(|key| FormField {
            id: key.to_string(),
            label: key.to_string(),
            kind: match filled.get(key) {
                Some(FieldValue::Bool(_)) => FormFieldKind::Checkbox,
                _ => FormFieldKind::Text,
            },
            required: false,
            options: vec![],
            unit: None,
        })
        .collect();

    let content = FormBuilderContent {
        title: None,
        sections: vec![FormSection {
            id: LEGACY_PROTOCOL_SECTION_ID.to_string(),
            title: "Recorded values".to_string(),
            fields,
        }],
    };
    serde_json::to_string(&content).map_err(|e| ClinicaError::ContentParse {
        reason: format!("failed to encode placeholder content: {e}"),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
