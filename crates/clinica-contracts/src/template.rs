//! Template definitions: analysis parameter lists and form-builder protocols.
//!
//! A template is read-only input to the editor. Once a result references it,
//! the result carries its own snapshot of the content, so nothing here is
//! ever consulted to interpret a historical result.

use serde::{Deserialize, Serialize};

use crate::filled::FieldValue;

/// Declared data type of an analysis parameter.
///
/// Serialized as `"NUMBER"`, `"TEXT"`, `"BOOLEAN"` to match the REST payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterType {
    Number,
    #[default]
    Text,
    Boolean,
}

impl ParameterType {
    /// The value a freshly selected template row starts with.
    ///
    /// BOOLEAN rows start unchecked; NUMBER and TEXT rows start blank.
    pub fn default_value(&self) -> FieldValue {
        match self {
            ParameterType::Boolean => FieldValue::Bool(false),
            ParameterType::Number | ParameterType::Text => FieldValue::Text(String::new()),
        }
    }
}

/// Patient sex as recorded on the patient card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

/// The patient attributes reference range resolution depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub sex: Option<Sex>,
    /// Age in full years.
    pub age: Option<u32>,
}

/// A normal value band. Either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ReferenceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// A range with neither bound places no constraint on the value.
    pub fn is_unconstrained(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Reference ranges partitioned by applicability segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub men: Option<ReferenceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub women: Option<ReferenceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<ReferenceRange>,
}

/// A single named, typed field within an analysis template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParameter {
    /// Stable identifier. Legacy templates may omit it; see [`AnalysisParameter::stable_id`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_ranges: Option<ReferenceRanges>,
    #[serde(default)]
    pub is_required: bool,
}

impl AnalysisParameter {
    /// The key this parameter's value is stored under in filled data.
    ///
    /// Falls back to `param-{index}` (zero-based position in the template)
    /// when the parameter carries no id or an empty one.
    pub fn stable_id(&self, index: usize) -> String {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => format!("param-{index}"),
        }
    }
}

/// The content document of an analysis template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContent {
    pub parameters: Vec<AnalysisParameter>,
}

/// Widget kind of a form-builder field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldKind {
    Text,
    Textarea,
    Number,
    Checkbox,
    Select,
    Date,
    /// Any kind this build does not know how to edit; rendered as text.
    #[serde(other)]
    Unknown,
}

/// A single input in a protocol section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FormFieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// A generic form-builder document: an ordered tree of sections and fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormBuilderContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub sections: Vec<FormSection>,
}

/// A lab/diagnostic analysis template as fetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub parameters: Vec<AnalysisParameter>,
}

/// A visit protocol template. `content` is the form-builder document as the
/// backend stores it: a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub content: String,
}

/// Either concrete template shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDefinition {
    Analysis(AnalysisTemplate),
    Protocol(ProtocolTemplate),
}

impl TemplateDefinition {
    pub fn id(&self) -> &str {
        match self {
            TemplateDefinition::Analysis(t) => &t.id,
            TemplateDefinition::Protocol(t) => &t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TemplateDefinition::Analysis(t) => &t.name,
            TemplateDefinition::Protocol(t) => &t.name,
        }
    }
}
