//! The employee work-schedule editor.
//!
//! Holds a toggle/time state per weekday and derives the wire DTO from it.
//! Times of a day that is toggled off are remembered, so toggling it back on
//! restores what was there.

use std::collections::BTreeMap;

use chrono::NaiveTime;

use clinica_contracts::{
    error::{ClinicaError, ClinicaResult},
    schedule::{DayState, TimeRange, Weekday, WorkScheduleDto},
};

pub const DEFAULT_FROM: &str = "09:00";
pub const DEFAULT_TO: &str = "18:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEditor {
    days: BTreeMap<Weekday, DayState>,
}

impl ScheduleEditor {
    /// Every day inactive with default hours.
    pub fn new() -> Self {
        let days = Weekday::ALL
            .iter()
            .map(|day| {
                (
                    *day,
                    DayState {
                        active: false,
                        from: DEFAULT_FROM.to_string(),
                        to: DEFAULT_TO.to_string(),
                    },
                )
            })
            .collect();
        Self { days }
    }

    /// Derive editor state from a stored schedule. Days stored as `null`
    /// come back inactive with default hours.
    pub fn from_dto(dto: &WorkScheduleDto) -> Self {
        let mut editor = Self::new();
        for day in Weekday::ALL {
            if let Some(range) = dto.day(day) {
                editor.days.insert(
                    day,
                    DayState {
                        active: true,
                        from: range.from.clone(),
                        to: range.to.clone(),
                    },
                );
            }
        }
        editor
    }

    pub fn day(&self, day: Weekday) -> Option<&DayState> {
        self.days.get(&day)
    }

    /// Flip a day on or off, keeping its times.
    pub fn toggle(&mut self, day: Weekday) {
        if let Some(state) = self.days.get_mut(&day) {
            state.active = !state.active;
        }
    }

    pub fn set_active(&mut self, day: Weekday, active: bool) {
        if let Some(state) = self.days.get_mut(&day) {
            state.active = active;
        }
    }

    pub fn set_from(&mut self, day: Weekday, from: impl Into<String>) {
        if let Some(state) = self.days.get_mut(&day) {
            state.from = from.into();
        }
    }

    pub fn set_to(&mut self, day: Weekday, to: impl Into<String>) {
        if let Some(state) = self.days.get_mut(&day) {
            state.to = to.into();
        }
    }

    /// Replace a day's whole state.
    pub fn set_day(&mut self, day: Weekday, state: DayState) {
        self.days.insert(day, state);
    }

    /// The wire DTO: active days carry their hours, every other day is `null`.
    pub fn build_schedule_object(&self) -> WorkScheduleDto {
        let mut dto = WorkScheduleDto::default();
        for (day, state) in &self.days {
            if state.active {
                dto.set_day(*day, Some(TimeRange::new(state.from.clone(), state.to.clone())));
            }
        }
        dto
    }

    /// Check every active day has `HH:MM` times with `from` before `to`.
    pub fn validate(&self) -> ClinicaResult<()> {
        for (day, state) in self.days.iter().filter(|(_, s)| s.active) {
            let from = parse_time(*day, "from", &state.from)?;
            let to = parse_time(*day, "to", &state.to)?;
            if from >= to {
                return Err(ClinicaError::InvalidSchedule {
                    reason: format!("{day}: start {} is not before end {}", state.from, state.to),
                });
            }
        }
        Ok(())
    }

    /// [`validate`](Self::validate), then [`build_schedule_object`](Self::build_schedule_object).
    pub fn build_validated(&self) -> ClinicaResult<WorkScheduleDto> {
        self.validate()?;
        Ok(self.build_schedule_object())
    }
}

impl Default for ScheduleEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_time(day: Weekday, which: &str, raw: &str) -> ClinicaResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| ClinicaError::InvalidSchedule {
        reason: format!("{day}: {which} time '{raw}' is not HH:MM"),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_schedule_with_null_inactive_days() {
        let mut editor = ScheduleEditor::new();
        editor.set_day(
            Weekday::Monday,
            DayState {
                active: true,
                from: "09:00".to_string(),
                to: "18:00".to_string(),
            },
        );
        editor.set_active(Weekday::Tuesday, false);

        let value = serde_json::to_value(editor.build_schedule_object()).unwrap();
        assert_eq!(
            value,
            json!({
                "monday": { "from": "09:00", "to": "18:00" },
                "tuesday": null,
                "wednesday": null,
                "thursday": null,
                "friday": null,
                "saturday": null,
                "sunday": null
            })
        );
    }

    #[test]
    fn toggle_restores_previous_times() {
        let mut editor = ScheduleEditor::new();
        editor.toggle(Weekday::Friday);
        editor.set_from(Weekday::Friday, "10:00");
        editor.set_to(Weekday::Friday, "14:30");
        editor.toggle(Weekday::Friday);
        assert!(editor.build_schedule_object().friday.is_none());

        editor.toggle(Weekday::Friday);
        assert_eq!(
            editor.build_schedule_object().friday,
            Some(TimeRange::new("10:00", "14:30"))
        );
    }

    #[test]
    fn from_dto_round_trips() {
        let mut dto = WorkScheduleDto::default();
        dto.set_day(Weekday::Wednesday, Some(TimeRange::new("08:00", "12:00")));
        dto.set_day(Weekday::Saturday, Some(TimeRange::new("10:00", "13:00")));

        let editor = ScheduleEditor::from_dto(&dto);
        assert_eq!(editor.build_schedule_object(), dto);
        assert!(!editor.day(Weekday::Monday).unwrap().active);
        assert_eq!(editor.day(Weekday::Monday).unwrap().from, DEFAULT_FROM);
    }

    #[test]
    fn validate_rejects_bad_times() {
        let mut editor = ScheduleEditor::new();
        editor.set_active(Weekday::Monday, true);
        assert!(editor.validate().is_ok());

        editor.set_to(Weekday::Monday, "08:00");
        let err = editor.validate().unwrap_err();
        assert!(err.to_string().contains("monday"));

        editor.set_to(Weekday::Monday, "25:99");
        assert!(matches!(editor.validate(), Err(ClinicaError::InvalidSchedule { .. })));
    }

    #[test]
    fn inactive_days_are_not_validated() {
        let mut editor = ScheduleEditor::new();
        editor.set_from(Weekday::Sunday, "garbage");
        assert!(editor.build_validated().is_ok());
    }
}
