//! # clinica-contracts
//!
//! Shared types for template-driven clinical data capture.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, their small accessors and the error
//! type.

pub mod envelope;
pub mod error;
pub mod filled;
pub mod schedule;
pub mod status;
pub mod template;
pub mod validation;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use envelope::{ResultContext, ResultMetadata, ResultOwner, SavedResultEnvelope};
    use error::ClinicaError;
    use filled::{FieldValue, FilledData};
    use schedule::{TimeRange, Weekday, WorkScheduleDto};
    use status::{OwnerStatus, RenderMode, ServiceOrderStatus, VisitStatus};
    use template::{AnalysisParameter, ParameterType, ReferenceRange};

    // ── FilledData ───────────────────────────────────────────────────────────

    #[test]
    fn filled_data_set_returns_new_container() {
        let before = FilledData::new().set("hgb", FieldValue::from("140"));
        let after = before.set("wbc", FieldValue::from("6.1"));

        // The receiver is untouched and the two values compare unequal.
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_ne!(before, after);
    }

    #[test]
    fn filled_data_set_does_not_perturb_siblings() {
        let data = FilledData::new()
            .set("a", FieldValue::from("1"))
            .set("b", FieldValue::Bool(true));
        let updated = data.set("a", FieldValue::from("2"));

        assert_eq!(updated.get("a"), Some(FieldValue::from("2")));
        assert_eq!(updated.get("b"), Some(FieldValue::Bool(true)));
    }

    #[test]
    fn filled_data_get_ignores_non_scalars() {
        let data = FilledData::new().set_raw("rows", json!([{ "value": 1 }]));
        assert!(data.get("rows").is_none());
        assert!(data.raw("rows").is_some());
        assert!(data.get("missing").is_none());
    }

    #[test]
    fn filled_data_serializes_as_plain_object() {
        let data = FilledData::new()
            .set("complaints", FieldValue::from("headache"))
            .set("smoker", FieldValue::Bool(false));
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, json!({ "complaints": "headache", "smoker": false }));
    }

    // ── FieldValue ───────────────────────────────────────────────────────────

    #[test]
    fn field_value_as_number_accepts_numeric_text() {
        assert_eq!(FieldValue::from(" 4.2 ").as_number(), Some(4.2));
        assert_eq!(FieldValue::from("4,2").as_number(), Some(4.2));
        assert_eq!(FieldValue::Number(7.0).as_number(), Some(7.0));
        assert_eq!(FieldValue::from("").as_number(), None);
        assert_eq!(FieldValue::from("n/a").as_number(), None);
        assert_eq!(FieldValue::Bool(true).as_number(), None);
    }

    // ── Templates ────────────────────────────────────────────────────────────

    #[test]
    fn parameter_stable_id_falls_back_to_position() {
        let mut param = AnalysisParameter {
            id: None,
            name: "Hemoglobin".to_string(),
            data_type: ParameterType::Number,
            unit: Some("g/L".to_string()),
            reference_ranges: None,
            is_required: false,
        };
        assert_eq!(param.stable_id(3), "param-3");

        param.id = Some("   ".to_string());
        assert_eq!(param.stable_id(0), "param-0");

        param.id = Some("hgb".to_string());
        assert_eq!(param.stable_id(0), "hgb");
    }

    #[test]
    fn parameter_defaults_by_type() {
        assert_eq!(ParameterType::Boolean.default_value(), FieldValue::Bool(false));
        assert_eq!(ParameterType::Number.default_value(), FieldValue::from(""));
        assert_eq!(ParameterType::Text.default_value(), FieldValue::from(""));
    }

    #[test]
    fn parameter_deserializes_wire_shape() {
        let param: AnalysisParameter = serde_json::from_value(json!({
            "name": "Glucose",
            "type": "NUMBER",
            "unit": "mmol/L",
            "referenceRanges": { "men": { "min": 3.9, "max": 6.1 } },
            "isRequired": true
        }))
        .unwrap();
        assert_eq!(param.data_type, ParameterType::Number);
        assert!(param.is_required);
        assert_eq!(
            param.reference_ranges.unwrap().men,
            Some(ReferenceRange::new(Some(3.9), Some(6.1)))
        );
    }

    // ── Status ───────────────────────────────────────────────────────────────

    #[test]
    fn service_order_lifecycle() {
        use ServiceOrderStatus::*;
        assert!(Ordered.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!Ordered.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Ordered));
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
        assert!(!InProgress.is_terminal());
    }

    #[test]
    fn render_mode_follows_owner_status() {
        assert_eq!(
            RenderMode::for_status(OwnerStatus::ServiceOrder(ServiceOrderStatus::InProgress)),
            RenderMode::Interactive
        );
        assert_eq!(
            RenderMode::for_status(OwnerStatus::ServiceOrder(ServiceOrderStatus::Cancelled)),
            RenderMode::View
        );
        assert_eq!(
            OwnerStatus::Visit(VisitStatus::Completed).render_mode(),
            RenderMode::View
        );
    }

    #[test]
    fn owner_status_never_crosses_owner_kinds() {
        let visit = OwnerStatus::Visit(VisitStatus::Scheduled);
        assert!(!visit.can_transition_to(OwnerStatus::ServiceOrder(ServiceOrderStatus::InProgress)));
        assert!(visit.can_transition_to(OwnerStatus::Visit(VisitStatus::InProgress)));
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ServiceOrderStatus::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
        assert_eq!(serde_json::to_value(VisitStatus::NoShow).unwrap(), json!("NO_SHOW"));
    }

    // ── Envelope ─────────────────────────────────────────────────────────────

    #[test]
    fn envelope_without_version_reads_as_version_one() {
        let envelope: SavedResultEnvelope = serde_json::from_value(json!({
            "templateId": "tpl-1",
            "templateName": "CBC",
            "templateContent": "{\"parameters\":[]}",
            "filledData": {},
            "metadata": { "patientId": "p-1", "serviceOrderId": "so-1" }
        }))
        .unwrap();
        assert_eq!(envelope.schema_version, envelope::ENVELOPE_SCHEMA_VERSION);
        assert_eq!(
            envelope.metadata.owner(),
            Some(ResultOwner::ServiceOrder("so-1".to_string()))
        );
    }

    #[test]
    fn newer_envelope_is_not_writable() {
        let mut envelope: SavedResultEnvelope = serde_json::from_value(json!({
            "schemaVersion": 2,
            "templateName": "CBC",
            "templateContent": "{\"parameters\":[]}",
            "filledData": {},
            "metadata": { "patientId": "p-1", "serviceOrderId": "so-1" }
        }))
        .unwrap();
        assert!(matches!(
            envelope.ensure_writable(),
            Err(ClinicaError::UnsupportedSchemaVersion { found: 2, supported: 1 })
        ));

        envelope.schema_version = envelope::ENVELOPE_SCHEMA_VERSION;
        assert!(envelope.ensure_writable().is_ok());
    }

    #[test]
    fn metadata_carries_exactly_one_owner_id() {
        let meta = ResultMetadata::new(&ResultContext::for_visit("p-1", "v-9"), None);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, json!({ "patientId": "p-1", "visitId": "v-9" }));
    }

    // ── Schedule ─────────────────────────────────────────────────────────────

    #[test]
    fn schedule_dto_serializes_every_day() {
        let mut dto = WorkScheduleDto::default();
        dto.set_day(Weekday::Monday, Some(TimeRange::new("09:00", "18:00")));
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(value["monday"], json!({ "from": "09:00", "to": "18:00" }));
        for day in &Weekday::ALL[1..] {
            assert!(value[day.as_str()].is_null(), "{day} should be null");
        }
        assert_eq!(value.as_object().unwrap().len(), 7);
    }

    // ── ClinicaError display messages ────────────────────────────────────────

    #[test]
    fn error_content_parse_display() {
        let err = ClinicaError::ContentParse {
            reason: "expected value at line 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("template content"));
        assert!(msg.contains("line 1"));
    }

    #[test]
    fn error_result_locked_display() {
        let err = ClinicaError::ResultLocked {
            status: "service order COMPLETED".to_string(),
        };
        assert!(err.to_string().contains("read-only"));
        assert!(err.to_string().contains("COMPLETED"));
    }

    #[test]
    fn error_invalid_transition_display() {
        let err = ClinicaError::InvalidTransition {
            from: "COMPLETED".to_string(),
            to: "IN_PROGRESS".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("COMPLETED"));
        assert!(msg.contains("IN_PROGRESS"));
    }

    #[test]
    fn error_save_failed_display() {
        let err = ClinicaError::SaveFailed {
            reason: "503 Service Unavailable".to_string(),
        };
        assert!(err.to_string().contains("save failed"));
    }

    #[test]
    fn error_template_not_found_display() {
        let err = ClinicaError::TemplateNotFound {
            id: "tpl-cbc".to_string(),
        };
        assert_eq!(err.to_string(), "template 'tpl-cbc' not found");
    }
}
