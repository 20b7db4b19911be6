//! In-memory stand-in for the clinic backend.
//!
//! `InMemoryClinicStore` implements both `ResultSink` and `TemplateSource`.
//! Saved results are kept per owner in the exact wire shape the backend
//! receives: a `VisitProtocolUpdate` body for visits, a
//! `ServiceOrderResultUpdate` body for service orders. Reading a result back
//! decodes that body through migration, as a real client would.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::info;

use clinica_contracts::{
    envelope::{ResultContext, ResultOwner, SavedResultEnvelope},
    error::{ClinicaError, ClinicaResult},
    template::TemplateDefinition,
};
use clinica_core::{
    traits::{ResultSink, TemplateSource},
    wire::{ServiceOrderResultUpdate, VisitProtocolUpdate},
};

#[derive(Default)]
struct StoreState {
    templates: BTreeMap<String, TemplateDefinition>,
    /// Last request body per owner.
    results: BTreeMap<ResultOwnerKey, Value>,
    save_count: usize,
    /// Remaining saves to reject with a simulated outage.
    failures_left: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum ResultOwnerKey {
    Visit(String),
    ServiceOrder(String),
}

impl From<&ResultOwner> for ResultOwnerKey {
    fn from(owner: &ResultOwner) -> Self {
        match owner {
            ResultOwner::Visit(id) => ResultOwnerKey::Visit(id.clone()),
            ResultOwner::ServiceOrder(id) => ResultOwnerKey::ServiceOrder(id.clone()),
        }
    }
}

pub struct InMemoryClinicStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryClinicStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    fn lock(&self) -> ClinicaResult<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|e| ClinicaError::SaveFailed {
            reason: format!("store state lock poisoned: {e}"),
        })
    }

    /// Add or replace a template in the catalogue.
    pub fn publish_template(&self, template: TemplateDefinition) -> ClinicaResult<()> {
        let mut state = self.lock()?;
        info!(template_id = %template.id(), "template published");
        state.templates.insert(template.id().to_string(), template);
        Ok(())
    }

    /// Reject the next `count` saves as if the backend were down.
    pub fn fail_next_saves(&self, count: usize) -> ClinicaResult<()> {
        self.lock()?.failures_left = count;
        Ok(())
    }

    pub fn save_count(&self) -> ClinicaResult<usize> {
        Ok(self.lock()?.save_count)
    }

    /// The raw request body last stored for `owner`.
    pub fn stored_body(&self, owner: &ResultOwner) -> ClinicaResult<Option<Value>> {
        Ok(self.lock()?.results.get(&ResultOwnerKey::from(owner)).cloned())
    }

    /// Seed a historical body for `owner`, bypassing encoding.
    pub fn seed_body(&self, owner: &ResultOwner, body: Value) -> ClinicaResult<()> {
        self.lock()?.results.insert(ResultOwnerKey::from(owner), body);
        Ok(())
    }

    /// Decode the stored result for `ctx.owner`, whatever shape it was saved in.
    pub fn load(&self, ctx: &ResultContext) -> ClinicaResult<Option<SavedResultEnvelope>> {
        let Some(body) = self.stored_body(&ctx.owner)? else {
            return Ok(None);
        };
        let envelope = match &ctx.owner {
            ResultOwner::Visit(_) => {
                let update: VisitProtocolUpdate =
                    serde_json::from_value(body).map_err(|e| ClinicaError::UnrecognizedPayload {
                        reason: format!("visit body is not a protocol update: {e}"),
                    })?;
                update.to_envelope(ctx)?
            }
            ResultOwner::ServiceOrder(_) => {
                let update: ServiceOrderResultUpdate =
                    serde_json::from_value(body).map_err(|e| ClinicaError::UnrecognizedPayload {
                        reason: format!("service order body is not a result update: {e}"),
                    })?;
                update.to_envelope(ctx)?
            }
        };
        Ok(Some(envelope))
    }
}

impl Default for InMemoryClinicStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for InMemoryClinicStore {
    fn save(&self, envelope: &SavedResultEnvelope) -> ClinicaResult<()> {
        let Some(owner) = envelope.metadata.owner() else {
            return Err(ClinicaError::SaveFailed {
                reason: "envelope names neither a visit nor a service order".to_string(),
            });
        };

        let body = match &owner {
            ResultOwner::Visit(_) => serde_json::to_value(VisitProtocolUpdate::from_envelope(envelope)?),
            ResultOwner::ServiceOrder(_) => {
                serde_json::to_value(ServiceOrderResultUpdate::from_envelope(envelope)?)
            }
        }
        .map_err(|e| ClinicaError::SaveFailed {
            reason: format!("failed to encode request body: {e}"),
        })?;

        let mut state = self.lock()?;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(ClinicaError::SaveFailed {
                reason: "503 Service Unavailable".to_string(),
            });
        }
        state.results.insert(ResultOwnerKey::from(&owner), body);
        state.save_count += 1;
        info!(?owner, save_count = state.save_count, "result stored");
        Ok(())
    }
}

impl TemplateSource for InMemoryClinicStore {
    fn template(&self, template_id: &str) -> ClinicaResult<Option<TemplateDefinition>> {
        Ok(self.lock()?.templates.get(template_id).cloned())
    }
}

/// Lets an `Arc<InMemoryClinicStore>` be handed to an editor as
/// `Box<dyn ResultSink>` while the caller keeps an inspectable handle.
pub struct SharedStore(pub Arc<InMemoryClinicStore>);

impl ResultSink for SharedStore {
    fn save(&self, envelope: &SavedResultEnvelope) -> ClinicaResult<()> {
        self.0.save(envelope)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use clinica_core::envelope;

    use super::*;
    use crate::mock_data::{cbc_template, legacy_analysis_payload, therapist_protocol_template};

    fn at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn visit_results_are_stored_as_protocol_strings() {
        let store = InMemoryClinicStore::new();
        let ctx = ResultContext::for_visit("pat-001", "visit-1");
        let env = envelope::start(&therapist_protocol_template(), &ctx, at()).unwrap();
        store.save(&env).unwrap();

        let body = store.stored_body(&ctx.owner).unwrap().unwrap();
        assert!(body["protocolData"].is_string());
        assert_eq!(store.load(&ctx).unwrap().unwrap(), env);
    }

    #[test]
    fn service_order_results_are_stored_as_objects() {
        let store = InMemoryClinicStore::new();
        let ctx = ResultContext::for_service_order("pat-001", "so-1");
        let env = envelope::start(&cbc_template(), &ctx, at()).unwrap();
        store.save(&env).unwrap();

        let body = store.stored_body(&ctx.owner).unwrap().unwrap();
        assert_eq!(body["resultData"]["schemaVersion"], json!(1));
        assert_eq!(store.load(&ctx).unwrap().unwrap(), env);
    }

    #[test]
    fn injected_failures_are_consumed() {
        let store = InMemoryClinicStore::new();
        let ctx = ResultContext::for_service_order("pat-001", "so-1");
        let env = envelope::start(&cbc_template(), &ctx, at()).unwrap();

        store.fail_next_saves(1).unwrap();
        assert!(matches!(store.save(&env), Err(ClinicaError::SaveFailed { .. })));
        assert_eq!(store.save_count().unwrap(), 0);
        store.save(&env).unwrap();
        assert_eq!(store.save_count().unwrap(), 1);
    }

    #[test]
    fn seeded_legacy_bodies_load_through_migration() {
        let store = InMemoryClinicStore::new();
        let ctx = ResultContext::for_service_order("pat-001", "so-old");
        store
            .seed_body(&ctx.owner, json!({ "resultData": legacy_analysis_payload() }))
            .unwrap();
        let env = store.load(&ctx).unwrap().unwrap();
        assert!(env.filled_data.raw("rows").is_some());
        assert_eq!(env.metadata.service_order_id.as_deref(), Some("so-old"));
    }

    #[test]
    fn templates_are_served_by_id() {
        let store = InMemoryClinicStore::new();
        store.publish_template(cbc_template()).unwrap();
        assert!(store.template("tpl-cbc").unwrap().is_some());
        assert!(store.template("missing").unwrap().is_none());
    }
}
