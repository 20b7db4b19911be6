//! # clinica-ref-clinic
//!
//! Reference clinic runtime for the clinica result library.
//!
//! Demonstrates four workflows using mock data:
//!
//! 1. **Analysis results**: a lab technician fills a CBC on a service order,
//!    with autosave, range classification, validation and completion lock.
//! 2. **Protocol copy**: a therapist copies the previous visit's protocol
//!    into today's visit while the live template has moved on.
//! 3. **Legacy migration**: historical payloads in every stored shape are
//!    normalized and rendered read-only.
//! 4. **Staff intake**: patient and employee form validation, and the
//!    weekly work-schedule editor.
//!
//! All data is hardcoded and fictional. No external API calls are made.

pub mod mock_data;
pub mod scenarios;
pub mod store;
