//! Reference range resolution and value classification.
//!
//! Everything here is pure: no I/O, no clock, no hidden state. The same
//! inputs always produce the same output.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use clinica_contracts::{
    filled::FieldValue,
    template::{PatientProfile, ReferenceRange, ReferenceRanges, Sex},
};

/// Patients younger than this many years use the `children` segment.
pub const DEFAULT_PEDIATRIC_AGE_LIMIT: u32 = 18;

/// Where a value sits relative to its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeStatus {
    Normal,
    High,
    Low,
    Unknown,
}

/// Resolves the applicable segment of a parameter's reference ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeResolver {
    pediatric_age_limit: u32,
}

impl RangeResolver {
    pub fn new(pediatric_age_limit: u32) -> Self {
        Self { pediatric_age_limit }
    }

    /// Select at most one segment.
    ///
    /// 1. `children`, if the patient is younger than the pediatric limit.
    /// 2. `men` for male patients, `women` for female patients.
    /// 3. Fallback: `men`, then `women`, then `children`.
    pub fn resolve<'r>(
        &self,
        ranges: &'r ReferenceRanges,
        sex: Option<Sex>,
        age: Option<u32>,
    ) -> Option<&'r ReferenceRange> {
        if let (Some(age), Some(children)) = (age, ranges.children.as_ref()) {
            if age < self.pediatric_age_limit {
                return Some(children);
            }
        }

        let by_sex = match sex {
            Some(Sex::Male) => ranges.men.as_ref(),
            Some(Sex::Female) => ranges.women.as_ref(),
            None => None,
        };

        by_sex
            .or(ranges.men.as_ref())
            .or(ranges.women.as_ref())
            .or(ranges.children.as_ref())
    }

    pub fn resolve_for<'r>(
        &self,
        ranges: &'r ReferenceRanges,
        patient: &PatientProfile,
    ) -> Option<&'r ReferenceRange> {
        self.resolve(ranges, patient.sex, patient.age)
    }
}

impl Default for RangeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PEDIATRIC_AGE_LIMIT)
    }
}

/// [`RangeResolver::resolve`] with the default pediatric age limit.
pub fn resolve_applicable_range(
    ranges: &ReferenceRanges,
    sex: Option<Sex>,
    age: Option<u32>,
) -> Option<&ReferenceRange> {
    RangeResolver::default().resolve(ranges, sex, age)
}

/// Classify `value` against `range`.
///
/// Bounds are inclusive: a value equal to `min` or `max` is `Normal`.
/// Non-numeric values, a missing range, and a range with neither bound all
/// yield `Unknown`.
pub fn classify(value: &FieldValue, range: Option<&ReferenceRange>) -> RangeStatus {
    let Some(range) = range else {
        return RangeStatus::Unknown;
    };
    if range.is_unconstrained() {
        return RangeStatus::Unknown;
    }
    let Some(v) = value.as_number() else {
        return RangeStatus::Unknown;
    };

    if matches!(range.max, Some(max) if v > max) {
        return RangeStatus::High;
    }
    if matches!(range.min, Some(min) if v < min) {
        return RangeStatus::Low;
    }
    RangeStatus::Normal
}

/// Display text for a range: `"3.5 – 5"`, `"≥ 3.5"`, `"≤ 5"`, or empty.
pub fn range_text(range: Option<&ReferenceRange>) -> String {
    match range.map(|r| (r.min, r.max)) {
        Some((Some(min), Some(max))) => format!("{min} – {max}"),
        Some((Some(min), None)) => format!("≥ {min}"),
        Some((None, Some(max))) => format!("≤ {max}"),
        _ => String::new(),
    }
}

/// Age in full years on `on` for a patient born on `birth_date`.
///
/// Returns `None` when `on` precedes the birth date.
pub fn age_in_years(birth_date: NaiveDate, on: NaiveDate) -> Option<u32> {
    if on < birth_date {
        return None;
    }
    let mut years = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

// ── Tests ────────────────────────────────────────────────────────────────────
