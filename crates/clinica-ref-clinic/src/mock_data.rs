//! Simulated clinic data for the reference runtime.
//!
//! All data in this module is hardcoded and fictional. It stands in for the
//! template catalogue, the patient registry and historical result payloads
//! a real deployment would fetch from the backend.

use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use clinica_contracts::template::{
    AnalysisParameter, AnalysisTemplate, ParameterType, PatientProfile, ProtocolTemplate,
    ReferenceRange, ReferenceRanges, Sex, TemplateDefinition,
};
use clinica_core::range::age_in_years;

pub const CBC_TEMPLATE_ID: &str = "tpl-cbc";
pub const THERAPIST_TEMPLATE_ID: &str = "tpl-therapist-exam";

/// A fresh opaque id with a readable prefix, e.g. `visit-5f0c…`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

// ── Templates (mock) ─────────────────────────────────────────────────────────

fn ranges(
    men: Option<(f64, f64)>,
    women: Option<(f64, f64)>,
    children: Option<(f64, f64)>,
) -> Option<ReferenceRanges> {
    let band = |r: Option<(f64, f64)>| r.map(|(min, max)| ReferenceRange::new(Some(min), Some(max)));
    Some(ReferenceRanges {
        men: band(men),
        women: band(women),
        children: band(children),
    })
}

fn parameter(
    id: &str,
    name: &str,
    data_type: ParameterType,
    unit: Option<&str>,
    reference_ranges: Option<ReferenceRanges>,
    is_required: bool,
) -> AnalysisParameter {
    AnalysisParameter {
        id: Some(id.to_string()),
        name: name.to_string(),
        data_type,
        unit: unit.map(str::to_string),
        reference_ranges,
        is_required,
    }
}

/// Complete blood count with sex- and age-specific reference ranges.
///
/// | Parameter  | Men        | Women      | Children   |
/// |------------|------------|------------|------------|
/// | Hemoglobin | 130 – 170  | 120 – 150  | 110 – 140  |
/// | WBC        | 4 – 9      | 4 – 9      | 4.5 – 13.5 |
/// | Platelets  | 150 – 400  | 150 – 400  | –          |
pub fn cbc_template() -> TemplateDefinition {
    TemplateDefinition::Analysis(AnalysisTemplate {
        id: CBC_TEMPLATE_ID.to_string(),
        name: "Complete Blood Count".to_string(),
        code: Some("CBC-01".to_string()),
        parameters: vec![
            parameter(
                "hgb",
                "Hemoglobin",
                ParameterType::Number,
                Some("g/L"),
                ranges(Some((130.0, 170.0)), Some((120.0, 150.0)), Some((110.0, 140.0))),
                true,
            ),
            parameter(
                "wbc",
                "WBC",
                ParameterType::Number,
                Some("10^9/L"),
                ranges(Some((4.0, 9.0)), Some((4.0, 9.0)), Some((4.5, 13.5))),
                true,
            ),
            parameter(
                "plt",
                "Platelets",
                ParameterType::Number,
                Some("10^9/L"),
                ranges(Some((150.0, 400.0)), Some((150.0, 400.0)), None),
                false,
            ),
            parameter("hemolysis", "Hemolysis observed", ParameterType::Boolean, None, None, false),
            parameter("comment", "Comment", ParameterType::Text, None, None, false),
        ],
    })
}

const THERAPIST_EXAM_V1: &str = r#"{
  "title": "Therapist examination",
  "sections": [
    {
      "id": "complaints",
      "title": "Complaints",
      "fields": [
        { "id": "complaints", "label": "Complaints", "type": "textarea", "required": true },
        { "id": "duration", "label": "Duration", "type": "select", "options": ["< 1 week", "1-4 weeks", "> 1 month"] }
      ]
    },
    {
      "id": "exam",
      "title": "Examination",
      "fields": [
        { "id": "temperature", "label": "Temperature", "type": "number", "unit": "°C" },
        { "id": "pulse", "label": "Pulse", "type": "number", "unit": "bpm" },
        { "id": "lungs_clear", "label": "Lungs clear", "type": "checkbox" }
      ]
    },
    {
      "id": "plan",
      "title": "Plan",
      "fields": [
        { "id": "diagnosis", "label": "Diagnosis", "type": "text", "required": true },
        { "id": "follow_up", "label": "Follow-up date", "type": "date" }
      ]
    }
  ]
}"#;

/// Revision two drops the duration select and adds a blood pressure field.
const THERAPIST_EXAM_V2: &str = r#"{
  "title": "Therapist examination (rev. 2)",
  "sections": [
    {
      "id": "complaints",
      "title": "Complaints",
      "fields": [
        { "id": "complaints", "label": "Complaints", "type": "textarea", "required": true }
      ]
    },
    {
      "id": "exam",
      "title": "Examination",
      "fields": [
        { "id": "temperature", "label": "Temperature", "type": "number", "unit": "°C" },
        { "id": "blood_pressure", "label": "Blood pressure", "type": "text", "unit": "mmHg" }
      ]
    }
  ]
}"#;

pub fn therapist_protocol_template() -> TemplateDefinition {
    TemplateDefinition::Protocol(ProtocolTemplate {
        id: THERAPIST_TEMPLATE_ID.to_string(),
        name: "Therapist examination".to_string(),
        code: Some("THER-01".to_string()),
        content: THERAPIST_EXAM_V1.to_string(),
    })
}

/// The same template after an administrator edited it.
pub fn therapist_protocol_template_v2() -> TemplateDefinition {
    TemplateDefinition::Protocol(ProtocolTemplate {
        id: THERAPIST_TEMPLATE_ID.to_string(),
        name: "Therapist examination".to_string(),
        code: Some("THER-01".to_string()),
        content: THERAPIST_EXAM_V2.to_string(),
    })
}

// ── Patients (mock) ──────────────────────────────────────────────────────────

/// A registered patient as the result screens see them.
#[derive(Debug, Clone, PartialEq)]
pub struct MockPatient {
    pub id: String,
    pub full_name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
}

impl MockPatient {
    /// Sex and full-year age on `on`.
    pub fn profile(&self, on: NaiveDate) -> PatientProfile {
        PatientProfile {
            sex: Some(self.sex),
            age: age_in_years(self.birth_date, on),
        }
    }
}

fn patient(id: &str, full_name: &str, sex: Sex, (y, m, d): (i32, u32, u32)) -> MockPatient {
    MockPatient {
        id: id.to_string(),
        full_name: full_name.to_string(),
        sex,
        birth_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
    }
}

pub fn adult_female_patient() -> MockPatient {
    patient("pat-001", "Elena Markova", Sex::Female, (1986, 3, 14))
}

pub fn adult_male_patient() -> MockPatient {
    patient("pat-002", "Tomas Reyes", Sex::Male, (1971, 11, 2))
}

pub fn child_patient() -> MockPatient {
    patient("pat-003", "Lina Okafor", Sex::Female, (2016, 7, 30))
}

// ── Historical payloads (mock) ───────────────────────────────────────────────

/// A service order result saved before envelopes existed: a bare `rows`
/// array with no template snapshot.
pub fn legacy_analysis_payload() -> Value {
    json!({
        "rows": [
            { "parameterId": "hgb", "name": "Hemoglobin", "value": 112, "unit": "g/L",
              "referenceRanges": { "women": { "min": 120, "max": 150 } } },
            { "parameterId": "wbc", "name": "WBC", "value": "6,1", "unit": "10^9/L" },
            { "name": "ESR", "value": "18", "unit": "mm/h" }
        ],
        "completedAt": "2024-02-11T09:30:00Z"
    })
}

/// A visit protocol saved as a bare `formData` map.
pub fn legacy_protocol_payload() -> Value {
    json!({
        "formData": {
            "complaints": "Dry cough for two weeks",
            "temperature": 37.4,
            "lungs_clear": false,
            "diagnosis": "Acute bronchitis"
        },
        "updatedAt": "2024-05-02T14:05:00Z"
    })
}

/// A current-format envelope as stored in `protocolData`.
pub fn stored_envelope_payload() -> Value {
    json!({
        "schemaVersion": 1,
        "templateId": THERAPIST_TEMPLATE_ID,
        "templateName": "Therapist examination",
        "templateContent": THERAPIST_EXAM_V1,
        "filledData": {
            "complaints": "Headache",
            "temperature": 36.6,
            "pulse": 72,
            "lungs_clear": true,
            "diagnosis": "Tension headache"
        },
        "metadata": {
            "filledAt": "2025-09-18T10:15:00Z",
            "patientId": "pat-002",
            "visitId": "visit-archived-17"
        }
    })
}

/// Nothing the migration recognizes.
pub fn unrecognized_payload() -> Value {
    json!({ "notes": "free text typed into the wrong box" })
}

// ── Staff forms (mock) ───────────────────────────────────────────────────────

pub fn patient_form_payload(passport_number: &str) -> Value {
    json!({
        "firstName": "Elena",
        "lastName": "Markova",
        "dateOfBirth": "1986-03-14",
        "sex": "FEMALE",
        "phone": "+1 555 0142",
        "passportSeries": "",
        "passportNumber": passport_number,
        "passportIssuedBy": "",
        "passportIssueDate": "",
        "passportExpiryDate": ""
    })
}

pub fn employee_form_payload(role: &str, specialization: &str, work_schedule: Value) -> Value {
    json!({
        "firstName": "Amir",
        "lastName": "Haddad",
        "role": role,
        "specialization": specialization,
        "email": "a.haddad@clinic.example",
        "workSchedule": work_schedule
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
