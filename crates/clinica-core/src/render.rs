//! The generic result renderer.
//!
//! A `Renderer` parses a template content string once and then produces a
//! `RenderedView` for any filled data. The view is a plain value derived only
//! from `(content, filled data, mode, patient)`; rendering the same inputs
//! twice yields equal views. A UI layer maps rows and fields onto widgets.
//!
//! Content that fails to parse never surfaces as an error here. The renderer
//! degrades to `RenderedView::Empty` with the reason attached.

use serde::Serialize;
use tracing::warn;

use clinica_contracts::{
    envelope::SavedResultEnvelope,
    filled::{FieldValue, FilledData},
    status::{OwnerStatus, RenderMode},
    template::{AnalysisContent, FormBuilderContent, FormFieldKind, PatientProfile, ParameterType},
};

use crate::{
    content::{parse_template_content, ParsedContent},
    migrate::lookup_value,
    range::{classify, range_text, RangeResolver, RangeStatus},
};

/// The input widget a row or field is edited with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Widget {
    NumberInput,
    TextInput,
    TextArea,
    Checkbox,
    Select { options: Vec<String> },
    DateInput,
}

impl Widget {
    fn for_parameter(data_type: ParameterType) -> Self {
        match data_type {
            ParameterType::Number => Widget::NumberInput,
            ParameterType::Text => Widget::TextInput,
            ParameterType::Boolean => Widget::Checkbox,
        }
    }

    fn for_field(kind: FormFieldKind, options: &[String]) -> Self {
        match kind {
            FormFieldKind::Number => Widget::NumberInput,
            FormFieldKind::Textarea => Widget::TextArea,
            FormFieldKind::Checkbox => Widget::Checkbox,
            FormFieldKind::Select => Widget::Select {
                options: options.to_vec(),
            },
            FormFieldKind::Date => Widget::DateInput,
            FormFieldKind::Text | FormFieldKind::Unknown => Widget::TextInput,
        }
    }
}

/// One analysis parameter row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub parameter_id: String,
    pub name: String,
    pub widget: Widget,
    /// `None` renders as an empty placeholder.
    pub value: Option<FieldValue>,
    pub unit: Option<String>,
    pub range_text: String,
    pub status: RangeStatus,
    pub required: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedField {
    pub field_id: String,
    pub label: String,
    pub widget: Widget,
    pub value: Option<FieldValue>,
    pub unit: Option<String>,
    pub required: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSection {
    pub section_id: String,
    pub title: String,
    pub fields: Vec<RenderedField>,
}

/// The rendered form of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RenderedView {
    Analysis {
        mode: RenderMode,
        rows: Vec<RenderedRow>,
    },
    Protocol {
        mode: RenderMode,
        title: Option<String>,
        sections: Vec<RenderedSection>,
    },
    /// Nothing could be rendered. `reason` is shown in place of the form.
    Empty { reason: String },
}

impl RenderedView {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderedView::Empty { .. })
    }
}

/// Renders one template content document.
#[derive(Debug, Clone)]
pub struct Renderer {
    content: Result<ParsedContent, String>,
    resolver: RangeResolver,
}

impl Renderer {
    /// Parse `template_content` once. A parse failure is remembered and every
    /// subsequent render yields `RenderedView::Empty`.
    pub fn new(template_content: &str) -> Self {
        let content = parse_template_content(template_content).map_err(|e| {
            warn!(error = %e, "template content unusable; rendering empty state");
            e.to_string()
        });
        Self {
            content,
            resolver: RangeResolver::default(),
        }
    }

    /// Render from a saved envelope's snapshot. The live template is never consulted.
    pub fn for_envelope(envelope: &SavedResultEnvelope) -> Self {
        Self::new(&envelope.template_content)
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: RangeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn content(&self) -> Option<&ParsedContent> {
        self.content.as_ref().ok()
    }

    /// Render in the mode `status` implies. Callers holding an owner should
    /// prefer this over choosing a mode themselves.
    pub fn render_for_status(
        &self,
        filled: &FilledData,
        status: OwnerStatus,
        patient: &PatientProfile,
    ) -> RenderedView {
        self.render(filled, RenderMode::for_status(status), patient)
    }

    /// Produce the view for `filled`. Keys in `filled` that the content does
    /// not declare are ignored; declared keys without a value render empty.
    pub fn render(&self, filled: &FilledData, mode: RenderMode, patient: &PatientProfile) -> RenderedView {
        match &self.content {
            Err(reason) => RenderedView::Empty {
                reason: reason.clone(),
            },
            Ok(ParsedContent::Analysis(content)) => self.render_analysis(content, filled, mode, patient),
            Ok(ParsedContent::Protocol(content)) => render_protocol(content, filled, mode),
        }
    }

    fn render_analysis(
        &self,
        content: &AnalysisContent,
        filled: &FilledData,
        mode: RenderMode,
        patient: &PatientProfile,
    ) -> RenderedView {
        if content.parameters.is_empty() {
            return RenderedView::Empty {
                reason: "template has no parameters".to_string(),
            };
        }

        let rows = content
            .parameters
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let parameter_id = param.stable_id(i);
                let value = lookup_value(filled, &parameter_id, i);
                let range = param
                    .reference_ranges
                    .as_ref()
                    .and_then(|ranges| self.resolver.resolve_for(ranges, patient));
                let status = match (&value, param.data_type) {
                    (Some(v), ParameterType::Number) => classify(v, range),
                    _ => RangeStatus::Unknown,
                };
                RenderedRow {
                    parameter_id,
                    name: param.name.clone(),
                    widget: Widget::for_parameter(param.data_type),
                    value,
                    unit: param.unit.clone(),
                    range_text: range_text(range),
                    status,
                    required: param.is_required,
                    editable: mode.is_editable(),
                }
            })
            .collect();

        RenderedView::Analysis { mode, rows }
    }
}

fn render_protocol(content: &FormBuilderContent, filled: &FilledData, mode: RenderMode) -> RenderedView {
    let sections = content
        .sections
        .iter()
        .map(|section| RenderedSection {
            section_id: section.id.clone(),
            title: section.title.clone(),
            fields: section
                .fields
                .iter()
                .map(|field| RenderedField {
                    field_id: field.id.clone(),
                    label: field.label.clone(),
                    widget: Widget::for_field(field.kind, &field.options),
                    value: filled.get(&field.id),
                    unit: field.unit.clone(),
                    required: field.required,
                    editable: mode.is_editable(),
                })
                .collect(),
        })
        .collect();

    RenderedView::Protocol {
        mode,
        title: content.title.clone(),
        sections,
    }
}

/// Render a saved envelope in one call, in the mode its owner's status implies.
pub fn render_envelope(
    envelope: &SavedResultEnvelope,
    status: OwnerStatus,
    patient: &PatientProfile,
) -> RenderedView {
    Renderer::for_envelope(envelope).render_for_status(&envelope.filled_data, status, patient)
}

// ── Tests ────────────────────────────────────────────────────────────────────
