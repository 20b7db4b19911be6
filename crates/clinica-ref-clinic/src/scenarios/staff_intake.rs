//! Scenario 4: Staff Intake Forms
//!
//! Registration desk workflows that share the validation layer with results.
//!
//! Sub-case A: patient card with only a passport number, rejected on the
//!             four missing passport fields
//! Sub-case B: the same card with the passport cleared, accepted
//! Sub-case C: a doctor hired without a specialization, rejected
//! Sub-case D: the weekly schedule built in the editor, first with a
//!             reversed shift, then fixed and attached to the employee form

use serde_json::{to_value, Value};

use clinica_contracts::{
    error::{ClinicaError, ClinicaResult},
    schedule::Weekday,
};
use clinica_core::{schedule::ScheduleEditor, traits::Validator};
use clinica_validate::forms::{clinic_form_validator, employee_form_schema, patient_form_schema};

use crate::mock_data::{employee_form_payload, patient_form_payload};

fn encode<T: serde::Serialize>(value: &T) -> ClinicaResult<Value> {
    to_value(value).map_err(|e| ClinicaError::InvalidSchedule {
        reason: format!("failed to encode schedule: {e}"),
    })
}

/// Monday to Friday 09:00–18:00, Saturday mornings.
pub fn weekday_schedule() -> ScheduleEditor {
    let mut editor = ScheduleEditor::new();
    for day in [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ] {
        editor.toggle(day);
    }
    editor.set_active(Weekday::Saturday, true);
    editor.set_from(Weekday::Saturday, "10:00");
    editor.set_to(Weekday::Saturday, "14:00");
    editor
}

pub fn run_scenario() -> ClinicaResult<()> {
    println!("=== Scenario 4: Staff Intake Forms ===");
    println!();

    let validator = clinic_form_validator();

    // ── A / B. Patient passport group ─────────────────────────────────────────
    let partial = validator.validate(&patient_form_payload("1234567"), &patient_form_schema())?;
    println!("  Sub-case A: passport number only");
    println!("    passed: {}", partial.passed);
    println!("    fields: {:?}", partial.failed_fields());

    let cleared = validator.validate(&patient_form_payload(""), &patient_form_schema())?;
    println!("  Sub-case B: passport cleared");
    println!("    passed: {}", cleared.passed);
    println!();

    // ── C. Doctor without a specialization ────────────────────────────────────
    let doctor = validator.validate(
        &employee_form_payload("DOCTOR", "", Value::Null),
        &employee_form_schema(),
    )?;
    println!("  Sub-case C: doctor without specialization");
    println!("    passed: {}", doctor.passed);
    for failure in &doctor.failures {
        println!("    [{}] {}", failure.rule_id, failure.message);
    }
    println!();

    // ── D. Work schedule ──────────────────────────────────────────────────────
    let mut schedule = weekday_schedule();
    schedule.set_from(Weekday::Wednesday, "19:00");
    println!("  Sub-case D: weekly schedule");
    if let Err(e) = schedule.build_validated() {
        println!("    editor rejected: {e}");
    }
    let reversed = validator.validate(
        &employee_form_payload("DOCTOR", "Cardiology", encode(&schedule.build_schedule_object())?),
        &employee_form_schema(),
    )?;
    println!("    form with reversed shift passed: {}", reversed.passed);

    schedule.set_from(Weekday::Wednesday, "09:00");
    let dto = schedule.build_validated()?;
    let accepted = validator.validate(
        &employee_form_payload("DOCTOR", "Cardiology", encode(&dto)?),
        &employee_form_schema(),
    )?;
    println!("    fixed schedule: {}", encode(&dto)?);
    println!("    form passed: {}", accepted.passed);

    println!();
    println!("  Scenario 4 complete.");
    println!();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
