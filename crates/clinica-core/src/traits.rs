//! Seams between the result core and its collaborators.
//!
//! - `ResultSink`: persists an envelope to its owner (the REST backend)
//! - `TemplateSource`: fetches live templates by id
//! - `Validator`: checks a form payload against a `FormSchema`
//!
//! The core never talks to the network directly; hosting applications supply
//! implementations of these traits.

use clinica_contracts::{
    envelope::SavedResultEnvelope,
    error::ClinicaResult,
    template::TemplateDefinition,
    validation::{FormSchema, ValidationReport},
};

/// Persists result envelopes.
pub trait ResultSink: Send + Sync {
    /// Save the current snapshot of `envelope` against its owner.
    ///
    /// Each call sends the full current filled data. An error leaves the
    /// caller's draft untouched so the save can be retried.
    fn save(&self, envelope: &SavedResultEnvelope) -> ClinicaResult<()>;
}

/// Supplies live templates when a user starts a new result.
///
/// Never used to interpret a saved result; envelopes carry their own snapshot.
pub trait TemplateSource: Send + Sync {
    fn template(&self, template_id: &str) -> ClinicaResult<Option<TemplateDefinition>>;
}

/// Validates a form payload before submission.
pub trait Validator: Send + Sync {
    /// Return a report with `passed = false` and one failure per problem.
    /// A malformed schema document is reported as a failure, not an `Err`.
    fn validate(&self, payload: &serde_json::Value, schema: &FormSchema) -> ClinicaResult<ValidationReport>;
}
