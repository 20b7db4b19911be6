//! The result editor: one editing session over one envelope.
//!
//! The editor owns the envelope, the owner's status, the autosave timer and
//! the sink. Every edit produces a new `FilledData` value; a save always sends
//! the snapshot current at call time.
//!
//!   edit → (owner editable?) → patch one key → restart autosave timer
//!   tick → (timer due?) → save
//!   save_now → cancel timer → save
//!
//! Once the owner reaches a terminal status the editor is read-only and
//! every edit returns `ClinicaError::ResultLocked`. An envelope written by a
//! newer schema version is read-only from the start.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use clinica_contracts::{
    envelope::SavedResultEnvelope,
    error::{ClinicaError, ClinicaResult},
    filled::{FieldValue, FilledData},
    status::{OwnerStatus, RenderMode},
    template::PatientProfile,
};

use crate::{
    autosave::AutosaveDebouncer,
    range::RangeResolver,
    render::{RenderedView, Renderer},
    traits::ResultSink,
};

/// What happened to an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The value was stored and an autosave scheduled.
    Applied,
    /// The id is not declared by the snapshotted content; nothing changed.
    IgnoredUnknownField,
}

pub struct ResultEditor {
    envelope: SavedResultEnvelope,
    status: OwnerStatus,
    renderer: Renderer,
    known_fields: BTreeSet<String>,
    autosave: AutosaveDebouncer,
    sink: Box<dyn ResultSink>,
    dirty: bool,
}

impl ResultEditor {
    pub fn new(
        envelope: SavedResultEnvelope,
        status: OwnerStatus,
        autosave: AutosaveDebouncer,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        let renderer = Renderer::for_envelope(&envelope);
        let known_fields = renderer
            .content()
            .map(|c| c.field_ids().into_iter().collect())
            .unwrap_or_default();
        Self {
            envelope,
            status,
            renderer,
            known_fields,
            autosave,
            sink,
            dirty: false,
        }
    }

    /// Use `resolver` for range classification in [`render`](Self::render).
    #[must_use]
    pub fn with_resolver(mut self, resolver: RangeResolver) -> Self {
        self.renderer = self.renderer.with_resolver(resolver);
        self
    }

    pub fn envelope(&self) -> &SavedResultEnvelope {
        &self.envelope
    }

    pub fn filled_data(&self) -> &FilledData {
        &self.envelope.filled_data
    }

    pub fn status(&self) -> OwnerStatus {
        self.status
    }

    /// Derived from the owner status only.
    pub fn mode(&self) -> RenderMode {
        RenderMode::for_status(self.status)
    }

    /// True if edits have not yet been saved successfully.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn render(&self, patient: &PatientProfile) -> RenderedView {
        self.renderer
            .render_for_status(&self.envelope.filled_data, self.status, patient)
    }

    /// Set one field's value at time `now`.
    pub fn set_value(
        &mut self,
        field_id: &str,
        value: FieldValue,
        now: DateTime<Utc>,
    ) -> ClinicaResult<EditOutcome> {
        self.ensure_editable()?;

        if !self.known_fields.contains(field_id) {
            debug!(field_id, "ignoring edit to field not declared by template snapshot");
            return Ok(EditOutcome::IgnoredUnknownField);
        }

        self.envelope.filled_data = self.envelope.filled_data.set(field_id, value);
        self.dirty = true;
        self.autosave.touch(now);
        Ok(EditOutcome::Applied)
    }

    /// Save if the autosave window has elapsed at `now`. Returns whether a
    /// save was attempted and succeeded.
    pub fn tick(&mut self, now: DateTime<Utc>) -> ClinicaResult<bool> {
        if !self.autosave.fire_if_due(now) {
            return Ok(false);
        }
        debug!(template_name = %self.envelope.template_name, "autosave window elapsed");
        self.persist(now)?;
        Ok(true)
    }

    /// Manual save: cancel the pending autosave and save immediately.
    pub fn save_now(&mut self, now: DateTime<Utc>) -> ClinicaResult<()> {
        self.ensure_editable()?;
        if self.autosave.cancel() {
            debug!("manual save cancelled pending autosave");
        }
        self.persist(now)
    }

    /// Move the owner to `next`.
    ///
    /// Unsaved edits are flushed before a terminal status locks the result.
    /// If that flush fails, the status does not change.
    pub fn transition(&mut self, next: OwnerStatus, now: DateTime<Utc>) -> ClinicaResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ClinicaError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        if next.is_terminal() && (self.dirty || self.autosave.is_pending()) {
            self.autosave.cancel();
            self.persist(now)?;
        }

        info!(from = %self.status, to = %next, "result owner status changed");
        self.status = next;
        Ok(())
    }

    fn ensure_editable(&self) -> ClinicaResult<()> {
        if self.status.is_terminal() {
            return Err(ClinicaError::ResultLocked {
                status: self.status.to_string(),
            });
        }
        // An envelope from a newer writer could never be saved back.
        self.envelope.ensure_writable()
    }

    fn persist(&mut self, now: DateTime<Utc>) -> ClinicaResult<()> {
        self.envelope.ensure_writable()?;
        let previous = self.envelope.metadata.filled_at;
        self.envelope.metadata.filled_at = Some(now);

        match self.sink.save(&self.envelope) {
            Ok(()) => {
                self.dirty = false;
                debug!(fields = self.envelope.filled_data.len(), "result saved");
                Ok(())
            }
            Err(e) => {
                // Keep the draft; only the timestamp of the failed attempt is rolled back.
                self.envelope.metadata.filled_at = previous;
                self.dirty = true;
                warn!(error = %e, "result save failed; draft kept for retry");
                Err(match e {
                    err @ ClinicaError::SaveFailed { .. } => err,
                    other => ClinicaError::SaveFailed {
                        reason: other.to_string(),
                    },
                })
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, TimeZone};

    use clinica_contracts::{
        envelope::{ResultContext, ResultMetadata},
        status::{ServiceOrderStatus, VisitStatus},
    };

    use super::*;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A sink that records every saved snapshot and can be told to fail.
    struct MockSink {
        saved: Arc<Mutex<Vec<SavedResultEnvelope>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl ResultSink for MockSink {
        fn save(&self, envelope: &SavedResultEnvelope) -> ClinicaResult<()> {
            if *self.fail.lock().unwrap() {
                return Err(ClinicaError::SaveFailed {
                    reason: "503 Service Unavailable".to_string(),
                });
            }
            self.saved.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    struct Harness {
        editor: ResultEditor,
        saved: Arc<Mutex<Vec<SavedResultEnvelope>>>,
        fail: Arc<Mutex<bool>>,
    }

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    fn protocol_envelope() -> SavedResultEnvelope {
        SavedResultEnvelope {
            schema_version: 1,
            template_id: Some("tpl-exam".to_string()),
            template_name: "Exam".to_string(),
            template_content: r#"{"sections":[{"id":"s","title":"S","fields":[
                {"id":"complaints","label":"Complaints","type":"textarea"},
                {"id":"fever","label":"Fever","type":"checkbox"}
            ]}]}"#
                .to_string(),
            filled_data: FilledData::new(),
            metadata: ResultMetadata::new(&ResultContext::for_visit("p-1", "v-1"), None),
        }
    }

    fn harness(status: OwnerStatus) -> Harness {
        let saved = Arc::new(Mutex::new(vec![]));
        let fail = Arc::new(Mutex::new(false));
        let sink = MockSink {
            saved: Arc::clone(&saved),
            fail: Arc::clone(&fail),
        };
        let editor = ResultEditor::new(
            protocol_envelope(),
            status,
            AutosaveDebouncer::default(),
            Box::new(sink),
        );
        Harness { editor, saved, fail }
    }

    fn in_progress_visit() -> OwnerStatus {
        OwnerStatus::Visit(VisitStatus::InProgress)
    }

    // ── Tests ────────────────────────────────────────────────────────────────

    #[test]
    fn edits_debounce_into_one_save_with_latest_snapshot() {
        let mut h = harness(in_progress_visit());
        h.editor.set_value("complaints", "co".into(), t(0)).unwrap();
        h.editor.set_value("complaints", "cough".into(), t(800)).unwrap();
        h.editor.set_value("fever", true.into(), t(1500)).unwrap();

        assert!(!h.editor.tick(t(3000)).unwrap());
        assert!(h.editor.tick(t(3500)).unwrap());

        let saved = h.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].filled_data.get("complaints"), Some(FieldValue::from("cough")));
        assert_eq!(saved[0].filled_data.get("fever"), Some(FieldValue::Bool(true)));
        assert_eq!(saved[0].metadata.filled_at, Some(t(3500)));
        assert!(!h.editor.is_dirty());
    }

    #[test]
    fn manual_save_cancels_pending_autosave() {
        let mut h = harness(in_progress_visit());
        h.editor.set_value("complaints", "cough".into(), t(0)).unwrap();
        h.editor.save_now(t(100)).unwrap();

        assert!(!h.editor.autosave_pending());
        assert!(!h.editor.tick(t(5000)).unwrap());
        assert_eq!(h.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn unknown_field_is_ignored() {
        let mut h = harness(in_progress_visit());
        let outcome = h.editor.set_value("deleted-field", "x".into(), t(0)).unwrap();
        assert_eq!(outcome, EditOutcome::IgnoredUnknownField);
        assert!(h.editor.filled_data().is_empty());
        assert!(!h.editor.autosave_pending());
    }

    #[test]
    fn failed_save_keeps_draft_and_retries() {
        let mut h = harness(in_progress_visit());
        h.editor.set_value("complaints", "cough".into(), t(0)).unwrap();

        *h.fail.lock().unwrap() = true;
        let err = h.editor.save_now(t(10)).unwrap_err();
        assert!(matches!(err, ClinicaError::SaveFailed { .. }));
        assert!(h.editor.is_dirty());
        assert_eq!(h.editor.filled_data().get("complaints"), Some(FieldValue::from("cough")));
        assert_eq!(h.editor.envelope().metadata.filled_at, None);

        *h.fail.lock().unwrap() = false;
        h.editor.save_now(t(20)).unwrap();
        assert!(!h.editor.is_dirty());
        assert_eq!(h.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn terminal_status_locks_editing_and_switches_to_view() {
        let mut h = harness(OwnerStatus::Visit(VisitStatus::Completed));
        assert_eq!(h.editor.mode(), RenderMode::View);
        let err = h.editor.set_value("complaints", "late".into(), t(0)).unwrap_err();
        assert!(matches!(err, ClinicaError::ResultLocked { .. }));
        assert!(matches!(h.editor.save_now(t(0)), Err(ClinicaError::ResultLocked { .. })));
    }

    #[test]
    fn completing_flushes_unsaved_edits_first() {
        let mut h = harness(in_progress_visit());
        h.editor.set_value("complaints", "resolved".into(), t(0)).unwrap();
        h.editor
            .transition(OwnerStatus::Visit(VisitStatus::Completed), t(500))
            .unwrap();

        assert_eq!(h.editor.mode(), RenderMode::View);
        assert!(!h.editor.autosave_pending());
        let saved = h.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].filled_data.get("complaints"), Some(FieldValue::from("resolved")));
    }

    #[test]
    fn completion_is_refused_when_flush_fails() {
        let mut h = harness(in_progress_visit());
        h.editor.set_value("complaints", "x".into(), t(0)).unwrap();
        *h.fail.lock().unwrap() = true;

        assert!(h
            .editor
            .transition(OwnerStatus::Visit(VisitStatus::Completed), t(10))
            .is_err());
        assert_eq!(h.editor.status(), in_progress_visit());
        assert_eq!(h.editor.mode(), RenderMode::Interactive);
    }

    #[test]
    fn newer_schema_envelope_refuses_edits_and_saves() {
        let saved = Arc::new(Mutex::new(vec![]));
        let sink = MockSink {
            saved: Arc::clone(&saved),
            fail: Arc::new(Mutex::new(false)),
        };
        let mut envelope = protocol_envelope();
        envelope.schema_version = 2;
        let mut editor = ResultEditor::new(
            envelope,
            in_progress_visit(),
            AutosaveDebouncer::default(),
            Box::new(sink),
        );

        assert!(matches!(
            editor.set_value("complaints", "cough".into(), t(0)),
            Err(ClinicaError::UnsupportedSchemaVersion { found: 2, .. })
        ));
        assert!(matches!(
            editor.save_now(t(10)),
            Err(ClinicaError::UnsupportedSchemaVersion { .. })
        ));
        assert!(saved.lock().unwrap().is_empty());
        assert_eq!(editor.envelope().schema_version, 2);

        // Completing needs no write, so it still goes through.
        editor
            .transition(OwnerStatus::Visit(VisitStatus::Completed), t(20))
            .unwrap();
        assert!(saved.lock().unwrap().is_empty());
    }

    #[test]
    fn oversized_autosave_delay_does_not_break_editing() {
        let saved = Arc::new(Mutex::new(vec![]));
        let sink = MockSink {
            saved: Arc::clone(&saved),
            fail: Arc::new(Mutex::new(false)),
        };
        let mut editor = ResultEditor::new(
            protocol_envelope(),
            in_progress_visit(),
            AutosaveDebouncer::from_millis(9_000_000_000_000_000),
            Box::new(sink),
        );

        let outcome = editor.set_value("complaints", "cough".into(), t(0)).unwrap();
        assert_eq!(outcome, EditOutcome::Applied);
        assert!(!editor.tick(t(60_000)).unwrap());
        editor.save_now(t(60_000)).unwrap();
        assert_eq!(saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut h = harness(OwnerStatus::ServiceOrder(ServiceOrderStatus::Ordered));
        let err = h
            .editor
            .transition(OwnerStatus::ServiceOrder(ServiceOrderStatus::Completed), t(0))
            .unwrap_err();
        assert!(matches!(err, ClinicaError::InvalidTransition { .. }));
    }

    #[test]
    fn render_reflects_edits_and_mode() {
        let mut h = harness(in_progress_visit());
        h.editor.set_value("fever", true.into(), t(0)).unwrap();
        match h.editor.render(&PatientProfile::default()) {
            RenderedView::Protocol { mode, sections, .. } => {
                assert_eq!(mode, RenderMode::Interactive);
                assert_eq!(sections[0].fields[1].value, Some(FieldValue::Bool(true)));
            }
            other => panic!("expected protocol view, got {:?}", other),
        }
    }
}
