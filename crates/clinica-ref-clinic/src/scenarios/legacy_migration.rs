//! Scenario 3: Legacy Result Migration
//!
//! Historical results were stored in three shapes over the years. Each is
//! seeded into the backend as-is, read back through the wire decoders and
//! rendered read-only:
//!
//!   A. Bare `rows` array on a service order (analysis, no snapshot)
//!   B. Bare `formData` map on a visit (protocol, no snapshot)
//!   C. Current envelope on a visit
//!   D. A payload nothing recognizes, which is reported, not guessed at

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use clinica_config::ClinicConfig;
use clinica_contracts::{
    envelope::{ResultContext, ResultOwner},
    error::{ClinicaError, ClinicaResult},
    status::{OwnerStatus, ServiceOrderStatus, VisitStatus},
};
use clinica_core::{
    migrate::{detect_shape, normalize},
    render::Renderer,
};

use crate::{
    mock_data::{
        adult_female_patient, adult_male_patient, legacy_analysis_payload, legacy_protocol_payload,
        stored_envelope_payload, unrecognized_payload,
    },
    scenarios::print_view,
    store::InMemoryClinicStore,
};

/// Wrap a stored result in the body its owner's endpoint returns.
fn body_for(ctx: &ResultContext, stored: &Value) -> Value {
    match &ctx.owner {
        ResultOwner::Visit(_) => json!({ "protocolData": stored.to_string() }),
        ResultOwner::ServiceOrder(_) => json!({ "resultData": stored }),
    }
}

pub fn run_scenario_at(config: &ClinicConfig, today: DateTime<Utc>) -> ClinicaResult<()> {
    println!("=== Scenario 3: Legacy Result Migration ===");
    println!();

    let store = InMemoryClinicStore::new();
    let female = adult_female_patient();
    let male = adult_male_patient();

    let cases = [
        (
            "A. legacy analysis rows",
            ResultContext::for_service_order(female.id.clone(), "so-2024-0211"),
            OwnerStatus::ServiceOrder(ServiceOrderStatus::Completed),
            female.profile(today.date_naive()),
            legacy_analysis_payload(),
        ),
        (
            "B. legacy protocol formData",
            ResultContext::for_visit(female.id.clone(), "visit-2024-0502"),
            OwnerStatus::Visit(VisitStatus::Completed),
            female.profile(today.date_naive()),
            legacy_protocol_payload(),
        ),
        (
            "C. current envelope",
            ResultContext::for_visit(male.id.clone(), "visit-archived-17"),
            OwnerStatus::Visit(VisitStatus::Completed),
            male.profile(today.date_naive()),
            stored_envelope_payload(),
        ),
    ];

    for (label, ctx, status, profile, payload) in &cases {
        println!("  {label}: detected {:?}", detect_shape(payload));
        store.seed_body(&ctx.owner, body_for(ctx, payload))?;

        let Some(env) = store.load(ctx)? else {
            println!("    (nothing stored)");
            continue;
        };
        println!(
            "    schemaVersion={} filledAt={:?} fields={:?}",
            env.schema_version,
            env.metadata.filled_at.map(|t| t.to_rfc3339()),
            env.filled_data.keys().collect::<Vec<_>>()
        );
        let view = Renderer::for_envelope(&env)
            .with_resolver(config.range_resolver())
            .render_for_status(&env.filled_data, *status, profile);
        print_view(&view, profile);
        println!();
    }

    // ── D. Unrecognized ───────────────────────────────────────────────────────
    let ctx = ResultContext::for_visit(female.id.clone(), "visit-broken");
    match normalize(&unrecognized_payload(), &ctx) {
        Err(e @ ClinicaError::UnrecognizedPayload { .. }) => {
            println!("  D. unrecognized payload: {e}");
        }
        Err(e) => return Err(e),
        Ok(_) => println!("  D. unrecognized payload was unexpectedly accepted"),
    }

    println!();
    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}

pub fn run_scenario(config: &ClinicConfig) -> ClinicaResult<()> {
    run_scenario_at(config, Utc::now())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
