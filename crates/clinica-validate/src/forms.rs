//! Patient and employee form schemas.
//!
//! Both forms post flat camelCase JSON objects. Blank strings and `null` are
//! how the forms send an untouched input, so the structural schemas accept
//! either and leave required-ness to the cross-field rules.

use serde_json::{json, Value};

use clinica_contracts::{
    schedule::WorkScheduleDto,
    validation::{FormSchema, ValidationRule, ValidationRuleType},
};
use clinica_core::schedule::ScheduleEditor;

use crate::engine::FormValidator;

pub const PATIENT_FORM_SCHEMA_ID: &str = "patient-form-v1";
pub const EMPLOYEE_FORM_SCHEMA_ID: &str = "employee-form-v1";

/// Name of the custom rule checking an employee's `workSchedule` object.
pub const WORK_SCHEDULE_RULE: &str = "work-schedule";

/// Required together once any one of them is filled.
pub const PASSPORT_FIELDS: [&str; 5] = [
    "passportSeries",
    "passportNumber",
    "passportIssuedBy",
    "passportIssueDate",
    "passportExpiryDate",
];

/// Optional `YYYY-MM-DD`; blank passes.
const DATE_PATTERN: &str = r"^(\d{4}-\d{2}-\d{2})?$";

fn optional_string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn optional_date() -> Value {
    json!({ "type": ["string", "null"], "pattern": DATE_PATTERN })
}

fn required(rule_id: &str, field: &str) -> ValidationRule {
    ValidationRule {
        rule_id: rule_id.to_string(),
        description: format!("{field} must be filled"),
        rule_type: ValidationRuleType::RequiredField {
            field: field.to_string(),
        },
    }
}

pub fn patient_form_schema() -> FormSchema {
    let json_schema = json!({
        "type": "object",
        "properties": {
            "firstName": optional_string(),
            "lastName": optional_string(),
            "middleName": optional_string(),
            "dateOfBirth": optional_date(),
            "sex": { "enum": ["MALE", "FEMALE", "", null] },
            "phone": optional_string(),
            "email": optional_string(),
            "address": optional_string(),
            "passportSeries": optional_string(),
            "passportNumber": optional_string(),
            "passportIssuedBy": optional_string(),
            "passportIssueDate": optional_date(),
            "passportExpiryDate": optional_date()
        }
    });

    FormSchema {
        schema_id: PATIENT_FORM_SCHEMA_ID.to_string(),
        json_schema,
        rules: vec![
            required("patient-first-name", "firstName"),
            required("patient-last-name", "lastName"),
            required("patient-date-of-birth", "dateOfBirth"),
            ValidationRule {
                rule_id: "patient-passport".to_string(),
                description: "passport fields are filled all together or not at all".to_string(),
                rule_type: ValidationRuleType::AllOrNone {
                    fields: PASSPORT_FIELDS.iter().map(|f| f.to_string()).collect(),
                },
            },
        ],
    }
}

pub fn employee_form_schema() -> FormSchema {
    let json_schema = json!({
        "type": "object",
        "properties": {
            "firstName": optional_string(),
            "lastName": optional_string(),
            "role": { "enum": ["DOCTOR", "NURSE", "ADMINISTRATOR", "RECEPTIONIST", "LAB_TECHNICIAN", "", null] },
            "specialization": optional_string(),
            "phone": optional_string(),
            "email": optional_string(),
            "workSchedule": { "type": ["object", "null"] }
        }
    });

    FormSchema {
        schema_id: EMPLOYEE_FORM_SCHEMA_ID.to_string(),
        json_schema,
        rules: vec![
            required("employee-first-name", "firstName"),
            required("employee-last-name", "lastName"),
            required("employee-role", "role"),
            ValidationRule {
                rule_id: "employee-doctor-specialization".to_string(),
                description: "doctors must have a specialization".to_string(),
                rule_type: ValidationRuleType::RequiredWhen {
                    field: "specialization".to_string(),
                    when_field: "role".to_string(),
                    equals: json!("DOCTOR"),
                },
            },
            ValidationRule {
                rule_id: "employee-work-schedule".to_string(),
                description: "active schedule days have HH:MM hours with start before end".to_string(),
                rule_type: ValidationRuleType::Custom {
                    function_name: WORK_SCHEDULE_RULE.to_string(),
                },
            },
        ],
    }
}

/// Checks `workSchedule` through the schedule editor. Absent or `null` passes.
pub fn work_schedule_rule(payload: &Value) -> Option<String> {
    let schedule = match payload.get("workSchedule") {
        None | Some(Value::Null) => return None,
        Some(v) => v,
    };
    let dto: WorkScheduleDto = match serde_json::from_value(schedule.clone()) {
        Ok(dto) => dto,
        Err(e) => return Some(format!("workSchedule is not a weekly schedule: {e}")),
    };
    ScheduleEditor::from_dto(&dto).validate().err().map(|e| e.to_string())
}

/// A validator with every custom rule the clinic forms reference.
pub fn clinic_form_validator() -> FormValidator {
    let mut validator = FormValidator::new();
    validator.register_rule(WORK_SCHEDULE_RULE, Box::new(work_schedule_rule));
    validator
}

// ── Tests ─────────────────────────────────────────────────────────────────────
