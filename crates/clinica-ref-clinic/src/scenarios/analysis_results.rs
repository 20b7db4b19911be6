//! Scenario 1: Analysis Results on a Service Order
//!
//! A lab technician enters a complete blood count for an adult female
//! patient.
//!
//!   1. The CBC template is fetched and a fresh envelope started
//!   2. Values are typed in; each edit restarts the autosave window
//!   3. The first save attempt hits a backend outage; the draft survives
//!   4. The retry lands; the row statuses are classified against the
//!      women's ranges
//!   5. Filled data is validated, then the order is completed, which flushes
//!      and locks the result
//!   6. A late edit is rejected and the stored body is decoded again
//!   7. The same values are classified for a child to show the pediatric
//!      ranges

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use clinica_config::ClinicConfig;
use clinica_contracts::{
    envelope::ResultContext,
    error::{ClinicaError, ClinicaResult},
    filled::FieldValue,
    status::{OwnerStatus, ServiceOrderStatus},
    template::TemplateDefinition,
};
use clinica_core::{
    envelope,
    render::{RenderedView, Renderer},
    traits::TemplateSource,
    ResultEditor,
};
use clinica_validate::results::{ensure_passed, validate_envelope};

use crate::{
    mock_data::{adult_female_patient, cbc_template, child_patient, new_id, CBC_TEMPLATE_ID},
    scenarios::print_view,
    store::{InMemoryClinicStore, SharedStore},
};

/// Fetch a template or fail the way a 404 would surface.
fn fetch(store: &InMemoryClinicStore, id: &str) -> ClinicaResult<TemplateDefinition> {
    store
        .template(id)?
        .ok_or_else(|| ClinicaError::TemplateNotFound { id: id.to_string() })
}

/// Run Scenario 1 at wall-clock time `start`.
pub fn run_scenario_at(config: &ClinicConfig, start: DateTime<Utc>) -> ClinicaResult<()> {
    println!("=== Scenario 1: Analysis Results on a Service Order ===");
    println!();

    let store = Arc::new(InMemoryClinicStore::new());
    store.publish_template(cbc_template())?;

    let patient = adult_female_patient();
    let profile = patient.profile(start.date_naive());
    let ctx = ResultContext::for_service_order(patient.id.clone(), new_id("so"));

    // ── 1. Start a result from the live template ──────────────────────────────
    let template = fetch(&store, CBC_TEMPLATE_ID)?;
    let draft = envelope::start(&template, &ctx, start)?;
    let mut editor = ResultEditor::new(
        draft,
        OwnerStatus::ServiceOrder(ServiceOrderStatus::InProgress),
        config.autosave_debouncer(),
        Box::new(SharedStore(Arc::clone(&store))),
    )
    .with_resolver(config.range_resolver());

    println!("  Patient:  {} ({:?}, {:?} y)", patient.full_name, patient.sex, profile.age);
    println!("  Template: {}", editor.envelope().template_name);
    println!();

    // ── 2. Type values; autosave is debounced ─────────────────────────────────
    let delay = config.autosave_debouncer().delay();
    let mut now = start;
    for (id, value) in [
        ("hgb", FieldValue::Text("112".into())),
        ("wbc", FieldValue::Text("6,4".into())),
        ("plt", FieldValue::Number(455.0)),
        ("comment", FieldValue::Text("Sample slightly lipemic".into())),
        ("not-a-parameter", FieldValue::Text("ignored".into())),
    ] {
        let outcome = editor.set_value(id, value, now)?;
        println!("  edit {id:<16} -> {outcome:?}");
        now += Duration::milliseconds(300);
    }
    println!("  Autosave pending: {}", editor.autosave_pending());

    // ── 3. The first autosave hits an outage ──────────────────────────────────
    store.fail_next_saves(1)?;
    now += delay;
    match editor.tick(now) {
        Err(e) => println!("  Autosave failed: {e} (draft kept, dirty = {})", editor.is_dirty()),
        Ok(saved) => println!("  Autosave ran: {saved}"),
    }

    // ── 4. Manual retry ───────────────────────────────────────────────────────
    editor.save_now(now)?;
    println!("  Manual save ok (saves stored: {})", store.save_count()?);
    println!();
    print_view(&editor.render(&profile), &profile);
    println!();

    // ── 5. Validate and complete ──────────────────────────────────────────────
    let report = validate_envelope(editor.envelope())?;
    println!("  Validation passed: {}", report.passed);
    ensure_passed(&report)?;

    editor.set_value("hgb", FieldValue::Text("114".into()), now)?;
    editor.transition(OwnerStatus::ServiceOrder(ServiceOrderStatus::Completed), now)?;
    println!(
        "  Order completed; render mode is now {:?} (saves stored: {})",
        editor.mode(),
        store.save_count()?
    );

    // ── 6. Locked; decode what the backend holds ──────────────────────────────
    match editor.set_value("hgb", FieldValue::Text("150".into()), now) {
        Err(e @ ClinicaError::ResultLocked { .. }) => println!("  Late edit rejected: {e}"),
        other => println!("  Unexpected late edit outcome: {other:?}"),
    }
    if let Some(stored) = store.load(&ctx)? {
        println!(
            "  Stored hemoglobin: {:?}",
            stored.filled_data.get("hgb").and_then(|v| v.as_number())
        );
    }
    println!();

    // ── 7. Same numbers, pediatric patient ────────────────────────────────────
    let child = child_patient();
    let child_profile = child.profile(start.date_naive());
    let view = Renderer::for_envelope(editor.envelope())
        .with_resolver(config.range_resolver())
        .render_for_status(&editor.envelope().filled_data, editor.status(), &child_profile);
    println!("  Same values classified for {}:", child.full_name);
    print_view(&view, &child_profile);
    if let RenderedView::Analysis { rows, .. } = &view {
        let platelets_unranged = rows.iter().any(|r| r.parameter_id == "plt" && r.range_text.is_empty());
        println!("  Platelets without pediatric range: {platelets_unranged}");
    }

    println!();
    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}

pub fn run_scenario(config: &ClinicConfig) -> ClinicaResult<()> {
    run_scenario_at(config, Utc::now())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
