//! Request/response shapes for the result-bearing REST endpoints.
//!
//! - Visit update: `protocolData` is the envelope JSON-encoded into a string.
//! - Service order update: `resultData` is the envelope as a JSON object.
//!
//! Reads go through [`crate::migrate`], so legacy shapes are accepted on
//! both paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use clinica_contracts::{
    envelope::{ResultContext, SavedResultEnvelope},
    error::{ClinicaError, ClinicaResult},
    status::ServiceOrderStatus,
};

use crate::migrate::{normalize, normalize_str};

/// Body of the visit update request carrying a protocol result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitProtocolUpdate {
    pub protocol_data: String,
}

impl VisitProtocolUpdate {
    pub fn from_envelope(envelope: &SavedResultEnvelope) -> ClinicaResult<Self> {
        envelope.ensure_writable()?;
        let protocol_data = serde_json::to_string(envelope).map_err(|e| ClinicaError::SaveFailed {
            reason: format!("failed to encode protocol data: {e}"),
        })?;
        Ok(Self { protocol_data })
    }

    pub fn to_envelope(&self, ctx: &ResultContext) -> ClinicaResult<SavedResultEnvelope> {
        normalize_str(&self.protocol_data, ctx)
    }
}

/// Body of the service order update request carrying an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderResultUpdate {
    pub result_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceOrderStatus>,
}

impl ServiceOrderResultUpdate {
    pub fn from_envelope(envelope: &SavedResultEnvelope) -> ClinicaResult<Self> {
        envelope.ensure_writable()?;
        let result_data = serde_json::to_value(envelope).map_err(|e| ClinicaError::SaveFailed {
            reason: format!("failed to encode result data: {e}"),
        })?;
        Ok(Self {
            result_data,
            status: None,
        })
    }

    /// Attach a status change to the same request, as the completion flow does.
    #[must_use]
    pub fn with_status(mut self, status: ServiceOrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn to_envelope(&self, ctx: &ResultContext) -> ClinicaResult<SavedResultEnvelope> {
        normalize(&self.result_data, ctx)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
