//! # clinica-core
//!
//! Logic for template-driven clinical data capture.
//!
//! This crate provides:
//! - Reference range resolution and classification (`range`)
//! - Template content parsing and structural discrimination (`content`)
//! - Envelope building and copying (`envelope`)
//! - Normalization of current and legacy stored payloads (`migrate`)
//! - The generic renderer (`render`)
//! - REST body shapes for visit and service order updates (`wire`)
//! - The work-schedule editor (`schedule`)
//! - Debounced autosave and the result editor session (`autosave`, `editor`)
//! - The seam traits hosting applications implement (`traits`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinica_core::{migrate::normalize, render::render_envelope};
//!
//! let envelope = normalize(&payload, &ctx)?;
//! let view = render_envelope(&envelope, owner_status, &patient);
//! ```

pub mod autosave;
pub mod content;
pub mod editor;
pub mod envelope;
pub mod migrate;
pub mod range;
pub mod render;
pub mod schedule;
pub mod traits;
pub mod wire;

pub use editor::ResultEditor;
pub use render::Renderer;
