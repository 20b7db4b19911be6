//! Reference clinic demo scenarios.
//!
//! Each scenario wires real clinica components (template store, result
//! editor, renderer, migration, validators) with mock clinic data and walks
//! through one workflow end to end.

pub mod analysis_results;
pub mod legacy_migration;
pub mod protocol_copy;
pub mod staff_intake;

use clinica_contracts::{filled::FieldValue, template::PatientProfile};
use clinica_core::render::RenderedView;

/// A single-line display of a filled value; blanks render as `—`.
pub(crate) fn display_value(value: Option<&FieldValue>) -> String {
    match value {
        None => "—".to_string(),
        Some(v) if v.is_blank() => "—".to_string(),
        Some(FieldValue::Bool(b)) => if *b { "yes" } else { "no" }.to_string(),
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(FieldValue::Text(s)) => s.clone(),
    }
}

/// Print a rendered view as an indented table.
pub(crate) fn print_view(view: &RenderedView, patient: &PatientProfile) {
    match view {
        RenderedView::Analysis { mode, rows } => {
            println!(
                "  [{mode:?}] analysis for sex={:?} age={:?}",
                patient.sex, patient.age
            );
            for row in rows {
                println!(
                    "    {:<20} {:>8} {:<8} {:<14} {:?}",
                    row.name,
                    display_value(row.value.as_ref()),
                    row.unit.as_deref().unwrap_or(""),
                    row.range_text,
                    row.status
                );
            }
        }
        RenderedView::Protocol { mode, title, sections } => {
            println!("  [{mode:?}] {}", title.as_deref().unwrap_or("(untitled protocol)"));
            for section in sections {
                println!("    {}", section.title);
                for field in &section.fields {
                    println!(
                        "      {:<18} {} {}",
                        field.label,
                        display_value(field.value.as_ref()),
                        field.unit.as_deref().unwrap_or("")
                    );
                }
            }
        }
        RenderedView::Empty { reason } => {
            println!("  (nothing to show: {reason})");
        }
    }
}
