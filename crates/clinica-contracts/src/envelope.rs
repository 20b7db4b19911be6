//! The saved result envelope: the portable unit persisted against a visit
//! or service order.
//!
//! The envelope snapshots the template name and content at build time. The
//! renderer reads only the snapshot, so a result stays renderable after the
//! live template is edited or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClinicaError, ClinicaResult},
    filled::FilledData,
};

/// Envelope format version written by this build.
///
/// Payloads that carry `filledData` but no version predate the field and are
/// read as version 1.
pub const ENVELOPE_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    ENVELOPE_SCHEMA_VERSION
}

/// The entity a result belongs to. A result has no lifecycle of its own and
/// is deleted together with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultOwner {
    Visit(String),
    ServiceOrder(String),
}

/// Provenance supplied by the caller when building or reading an envelope.
///
/// The ids are never checked against the backend here; the server
/// re-validates ownership on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultContext {
    pub patient_id: String,
    pub owner: ResultOwner,
}

impl ResultContext {
    pub fn for_visit(patient_id: impl Into<String>, visit_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            owner: ResultOwner::Visit(visit_id.into()),
        }
    }

    pub fn for_service_order(
        patient_id: impl Into<String>,
        service_order_id: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            owner: ResultOwner::ServiceOrder(service_order_id.into()),
        }
    }
}

/// Provenance stored inside the envelope.
///
/// Exactly one of `visit_id` / `service_order_id` is set on envelopes built
/// by this crate. `filled_at` is absent only on normalized legacy payloads
/// that never recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_at: Option<DateTime<Utc>>,
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_order_id: Option<String>,
}

impl ResultMetadata {
    pub fn new(ctx: &ResultContext, filled_at: Option<DateTime<Utc>>) -> Self {
        let (visit_id, service_order_id) = match &ctx.owner {
            ResultOwner::Visit(id) => (Some(id.clone()), None),
            ResultOwner::ServiceOrder(id) => (None, Some(id.clone())),
        };
        Self {
            filled_at,
            patient_id: ctx.patient_id.clone(),
            visit_id,
            service_order_id,
        }
    }

    /// The owning entity. A visit id wins if a malformed payload carries both.
    pub fn owner(&self) -> Option<ResultOwner> {
        match (&self.visit_id, &self.service_order_id) {
            (Some(id), _) => Some(ResultOwner::Visit(id.clone())),
            (None, Some(id)) => Some(ResultOwner::ServiceOrder(id.clone())),
            (None, None) => None,
        }
    }
}

/// Template identity + content snapshot + filled values + provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedResultEnvelope {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Reference to the live template, which may since have changed or gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub template_name: String,
    /// Authoritative JSON snapshot of the template content.
    pub template_content: String,
    pub filled_data: FilledData,
    pub metadata: ResultMetadata,
}

impl SavedResultEnvelope {
    /// Refuse to write an envelope whose schema is newer than this build's.
    ///
    /// Saving it would downgrade the version and drop whatever the newer
    /// writer added.
    pub fn ensure_writable(&self) -> ClinicaResult<()> {
        if self.schema_version > ENVELOPE_SCHEMA_VERSION {
            return Err(ClinicaError::UnsupportedSchemaVersion {
                found: self.schema_version,
                supported: ENVELOPE_SCHEMA_VERSION,
            });
        }
        Ok(())
    }
}
