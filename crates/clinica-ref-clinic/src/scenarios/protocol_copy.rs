//! Scenario 2: Copy Previous Protocol
//!
//! A therapist sees the same patient twice.
//!
//!   1. Visit one: the protocol is filled from the therapist template and the
//!      visit is completed
//!   2. Between visits an administrator publishes revision two of the
//!      template, dropping one field and adding another
//!   3. Visit two: the previous protocol is copied in. It keeps the
//!      snapshotted revision-one content, so every previously filled field
//!      is still shown, while a brand-new result would use revision two
//!   4. The copy is edited and saved to the new visit only; the completed
//!      visit is unchanged

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use clinica_config::ClinicConfig;
use clinica_contracts::{
    envelope::{ResultContext, SavedResultEnvelope},
    error::{ClinicaError, ClinicaResult},
    filled::FieldValue,
    status::{OwnerStatus, VisitStatus},
};
use clinica_core::{content::parse_template_content, envelope, traits::TemplateSource, ResultEditor};
use clinica_validate::results::validate_envelope;

use crate::{
    mock_data::{
        adult_male_patient, new_id, therapist_protocol_template, therapist_protocol_template_v2,
        THERAPIST_TEMPLATE_ID,
    },
    scenarios::print_view,
    store::{InMemoryClinicStore, SharedStore},
};

fn fill_first_visit(
    store: &Arc<InMemoryClinicStore>,
    config: &ClinicConfig,
    ctx: &ResultContext,
    now: DateTime<Utc>,
) -> ClinicaResult<SavedResultEnvelope> {
    let template = store
        .template(THERAPIST_TEMPLATE_ID)?
        .ok_or_else(|| ClinicaError::TemplateNotFound {
            id: THERAPIST_TEMPLATE_ID.to_string(),
        })?;

    let mut editor = ResultEditor::new(
        envelope::start(&template, ctx, now)?,
        OwnerStatus::Visit(VisitStatus::InProgress),
        config.autosave_debouncer(),
        Box::new(SharedStore(Arc::clone(store))),
    );
    for (id, value) in [
        ("complaints", FieldValue::Text("Persistent dry cough, worse at night".into())),
        ("duration", FieldValue::Text("1-4 weeks".into())),
        ("temperature", FieldValue::Number(37.2)),
        ("pulse", FieldValue::Number(78.0)),
        ("lungs_clear", FieldValue::Bool(false)),
        ("diagnosis", FieldValue::Text("Acute bronchitis".into())),
    ] {
        editor.set_value(id, value, now)?;
    }
    editor.transition(OwnerStatus::Visit(VisitStatus::Completed), now)?;
    Ok(editor.envelope().clone())
}

pub fn run_scenario_at(config: &ClinicConfig, start: DateTime<Utc>) -> ClinicaResult<()> {
    println!("=== Scenario 2: Copy Previous Protocol ===");
    println!();

    let store = Arc::new(InMemoryClinicStore::new());
    store.publish_template(therapist_protocol_template())?;

    let patient = adult_male_patient();
    let profile = patient.profile(start.date_naive());

    // ── 1. First visit ────────────────────────────────────────────────────────
    let first_ctx = ResultContext::for_visit(patient.id.clone(), new_id("visit"));
    let first = fill_first_visit(&store, config, &first_ctx, start)?;
    println!("  Visit one completed for {}", patient.full_name);

    // ── 2. The template changes ───────────────────────────────────────────────
    store.publish_template(therapist_protocol_template_v2())?;
    println!("  Template '{}' revised by an administrator", first.template_name);

    // ── 3. Copy into visit two ────────────────────────────────────────────────
    let later = start + Duration::days(7);
    let second_ctx = ResultContext::for_visit(patient.id.clone(), new_id("visit"));
    let previous = store
        .load(&first_ctx)?
        .ok_or_else(|| ClinicaError::UnrecognizedPayload {
            reason: "first visit has no stored protocol".to_string(),
        })?;
    let copy = envelope::copy_into(&previous, &second_ctx, later);

    let snapshot_fields = parse_template_content(&copy.template_content)?.field_ids();
    println!(
        "  Copied protocol keeps {} snapshotted fields (duration still present: {})",
        snapshot_fields.len(),
        snapshot_fields.iter().any(|f| f == "duration")
    );

    // ── 4. Edit the copy and save to the new visit ────────────────────────────
    let mut editor = ResultEditor::new(
        copy,
        OwnerStatus::Visit(VisitStatus::InProgress),
        config.autosave_debouncer(),
        Box::new(SharedStore(Arc::clone(&store))),
    );
    editor.set_value("complaints", FieldValue::Text("Cough resolving".into()), later)?;
    editor.set_value("lungs_clear", FieldValue::Bool(true), later)?;
    editor.set_value("blood_pressure", FieldValue::Text("120/80".into()), later)?;
    editor.save_now(later)?;

    print_view(&editor.render(&profile), &profile);
    println!();

    let report = validate_envelope(editor.envelope())?;
    println!("  Copied protocol validation passed: {}", report.passed);

    let untouched = store.load(&first_ctx)?;
    println!(
        "  Visit one complaints unchanged: {:?}",
        untouched.and_then(|e| e.filled_data.get("complaints"))
    );

    println!();
    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}

pub fn run_scenario(config: &ClinicConfig) -> ClinicaResult<()> {
    run_scenario_at(config, Utc::now())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
