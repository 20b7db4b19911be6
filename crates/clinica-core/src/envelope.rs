//! Building saved result envelopes.
//!
//! `build` always snapshots the template name and content. An envelope never
//! holds a bare template reference that would break when the live template
//! is edited later.

use chrono::{DateTime, Utc};
use tracing::debug;

use clinica_contracts::{
    envelope::{ResultContext, ResultMetadata, SavedResultEnvelope, ENVELOPE_SCHEMA_VERSION},
    error::ClinicaResult,
    filled::FilledData,
    template::TemplateDefinition,
};

use crate::content::content_of;

/// Bundle `template`, `filled_data` and provenance into an envelope.
pub fn build(
    template: &TemplateDefinition,
    filled_data: FilledData,
    ctx: &ResultContext,
    filled_at: DateTime<Utc>,
) -> ClinicaResult<SavedResultEnvelope> {
    let content = content_of(template)?.to_content_string()?;

    debug!(
        template_id = %template.id(),
        patient_id = %ctx.patient_id,
        fields = filled_data.len(),
        "building result envelope"
    );

    Ok(SavedResultEnvelope {
        schema_version: ENVELOPE_SCHEMA_VERSION,
        template_id: Some(template.id().to_string()),
        template_name: template.name().to_string(),
        template_content: content,
        filled_data,
        metadata: ResultMetadata::new(ctx, Some(filled_at)),
    })
}

/// Start a fresh result for `template`, every field at its type default.
pub fn start(
    template: &TemplateDefinition,
    ctx: &ResultContext,
    filled_at: DateTime<Utc>,
) -> ClinicaResult<SavedResultEnvelope> {
    let initial = content_of(template)?.initial_filled_data();
    build(template, initial, ctx, filled_at)
}

/// Copy a previously filled result (typically from an earlier visit) into a
/// new owner.
///
/// The source's snapshotted content is carried over as-is and stays
/// authoritative, even if the live template has changed since. Only the
/// provenance is replaced.
pub fn copy_into(
    source: &SavedResultEnvelope,
    ctx: &ResultContext,
    filled_at: DateTime<Utc>,
) -> SavedResultEnvelope {
    debug!(
        template_name = %source.template_name,
        patient_id = %ctx.patient_id,
        "copying result envelope into new owner"
    );
    SavedResultEnvelope {
        // A newer source stays newer, so the copy cannot be saved as a downgrade.
        schema_version: source.schema_version.max(ENVELOPE_SCHEMA_VERSION),
        template_id: source.template_id.clone(),
        template_name: source.template_name.clone(),
        template_content: source.template_content.clone(),
        filled_data: source.filled_data.clone(),
        metadata: ResultMetadata::new(ctx, Some(filled_at)),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use clinica_contracts::{
        envelope::ResultOwner,
        filled::FieldValue,
        template::{AnalysisParameter, AnalysisTemplate, ParameterType, ProtocolTemplate},
    };

    use crate::content::{parse_template_content, ParsedContent};

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap()
    }

    fn analysis_template() -> TemplateDefinition {
        TemplateDefinition::Analysis(AnalysisTemplate {
            id: "tpl-urine".to_string(),
            name: "Urinalysis".to_string(),
            code: Some("UA".to_string()),
            parameters: vec![
                AnalysisParameter {
                    id: None,
                    name: "Protein present".to_string(),
                    data_type: ParameterType::Boolean,
                    unit: None,
                    reference_ranges: None,
                    is_required: false,
                },
                AnalysisParameter {
                    id: Some("ph".to_string()),
                    name: "pH".to_string(),
                    data_type: ParameterType::Number,
                    unit: None,
                    reference_ranges: None,
                    is_required: true,
                },
            ],
        })
    }

    #[test]
    fn build_snapshots_name_and_content() {
        let ctx = ResultContext::for_service_order("p-1", "so-7");
        let filled = FilledData::new().set("ph", FieldValue::from("6.0"));
        let env = build(&analysis_template(), filled.clone(), &ctx, at()).unwrap();

        assert_eq!(env.template_id.as_deref(), Some("tpl-urine"));
        assert_eq!(env.template_name, "Urinalysis");
        assert_eq!(env.filled_data, filled);
        assert_eq!(env.metadata.filled_at, Some(at()));
        assert_eq!(env.metadata.owner(), Some(ResultOwner::ServiceOrder("so-7".to_string())));

        match parse_template_content(&env.template_content).unwrap() {
            ParsedContent::Analysis(c) => assert_eq!(c.parameters.len(), 2),
            other => panic!("expected analysis snapshot, got {:?}", other),
        }
    }

    #[test]
    fn start_initializes_boolean_rows_to_false() {
        let ctx = ResultContext::for_service_order("p-1", "so-7");
        let env = start(&analysis_template(), &ctx, at()).unwrap();
        assert_eq!(env.filled_data.get("param-0"), Some(FieldValue::Bool(false)));
        assert_eq!(env.filled_data.get("ph"), Some(FieldValue::from("")));
    }

    #[test]
    fn build_rejects_protocol_with_unparseable_content() {
        let template = TemplateDefinition::Protocol(ProtocolTemplate {
            id: "tpl-bad".to_string(),
            name: "Broken".to_string(),
            code: None,
            content: "{oops".to_string(),
        });
        let ctx = ResultContext::for_visit("p-1", "v-1");
        assert!(build(&template, FilledData::new(), &ctx, at()).is_err());
    }

    #[test]
    fn snapshot_survives_live_template_edit() {
        let ctx = ResultContext::for_service_order("p-1", "so-7");
        let mut template = analysis_template();
        let env = build(&template, FilledData::new(), &ctx, at()).unwrap();

        if let TemplateDefinition::Analysis(t) = &mut template {
            t.name = "Urinalysis v2".to_string();
            t.parameters.clear();
        }

        assert_eq!(env.template_name, "Urinalysis");
        assert!(env.template_content.contains("Protein present"));
    }

    #[test]
    fn copy_into_keeps_snapshot_and_replaces_provenance() {
        let source_ctx = ResultContext::for_visit("p-1", "v-old");
        let template = TemplateDefinition::Protocol(ProtocolTemplate {
            id: "tpl-exam".to_string(),
            name: "General exam".to_string(),
            code: None,
            content: r#"{"sections":[{"id":"s","title":"S","fields":[{"id":"note","label":"Note","type":"textarea"}]}]}"#
                .to_string(),
        });
        let filled = FilledData::new().set("note", FieldValue::from("stable"));
        let source = build(&template, filled, &source_ctx, at()).unwrap();

        let later = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        let copy = copy_into(&source, &ResultContext::for_visit("p-1", "v-new"), later);

        assert_eq!(copy.template_content, source.template_content);
        assert_eq!(copy.filled_data, source.filled_data);
        assert_eq!(copy.metadata.visit_id.as_deref(), Some("v-new"));
        assert_eq!(copy.metadata.filled_at, Some(later));
    }

    #[test]
    fn copy_of_newer_envelope_keeps_its_version() {
        let template = TemplateDefinition::Protocol(ProtocolTemplate {
            id: "tpl-exam".to_string(),
            name: "General exam".to_string(),
            code: None,
            content: r#"{"sections":[]}"#.to_string(),
        });
        let mut source = build(&template, FilledData::new(), &ResultContext::for_visit("p-1", "v-old"), at()).unwrap();
        source.schema_version = 4;

        let copy = copy_into(&source, &ResultContext::for_visit("p-1", "v-new"), at());
        assert_eq!(copy.schema_version, 4);
        assert!(copy.ensure_writable().is_err());
    }
}
