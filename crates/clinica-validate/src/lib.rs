//! # clinica-validate
//!
//! Pre-submission validation for clinic forms and result drafts.
//!
//! [`engine::FormValidator`] implements [`clinica_core::traits::Validator`]
//! and checks a form payload in two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate.
//! 2. **Cross-field**: `RequiredField`, `AllOrNone`, `RequiredWhen` and
//!    `Custom` rules evaluated against the payload.
//!
//! [`forms`] holds the patient and employee form schemas; [`results`]
//! checks filled data against the template content it belongs to.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use clinica_core::traits::Validator;
//! use clinica_validate::{engine::FormValidator, forms::patient_form_schema};
//!
//! let report = FormValidator::new().validate(&payload, &patient_form_schema())?;
//! if !report.passed {
//!     for field in report.failed_fields() {
//!         println!("fix {field}");
//!     }
//! }
//! ```

pub mod engine;
pub mod forms;
pub mod results;
