use chrono::{Datelike, Month, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ErrorContext, PlannerError, PlannerResult};

/// Month whose events the plan should list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFocus {
    /// 1..=12
    pub month: u32,
    pub year: i32,
}

impl CalendarFocus {
    /// Create a focus, rejecting months outside 1..=12.
    pub fn new(month: u32, year: i32) -> PlannerResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(PlannerError::invalid_input_with_context(
                format!("month {} is out of range", month),
                ErrorContext::new("calendar_focus").with_field("calendarMonth"),
            ));
        }
        Ok(Self { month, year })
    }

    /// Focus on the month containing `date`.
    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// Parse a `YYYY-MM` month override.
    pub fn parse(value: &str) -> PlannerResult<Self> {
        let invalid = || {
            PlannerError::invalid_input_with_context(
                format!("'{}' is not a YYYY-MM month", value),
                ErrorContext::new("calendar_focus").with_field("calendarMonth"),
            )
        };
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(month, year)
    }

    /// Human-readable month, e.g. `"December 2025"`.
    pub fn display(&self) -> String {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown");
        format!("{} {}", name, self.year)
    }
}

impl fmt::Display for CalendarFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Raw, unvalidated inputs as they arrive from a form or API call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    pub location: String,
    pub equipment: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    #[serde(default)]
    pub start_time: Option<String>,
    /// `HH:MM`
    #[serde(default)]
    pub end_time: Option<String>,
    /// `YYYY-MM`
    #[serde(default)]
    pub calendar_month: Option<String>,
}

impl SessionInput {
    pub fn new(
        location: impl Into<String>,
        equipment: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            equipment: equipment.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn with_window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }

    pub fn with_calendar_month(mut self, month: impl Into<String>) -> Self {
        self.calendar_month = Some(month.into());
        self
    }
}

/// Validated planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub session_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: String,
    pub equipment_id: String,
    pub calendar_focus: CalendarFocus,
}

impl PlanRequest {
    /// Validate raw inputs. Location and equipment must be non-empty, the date
    /// must parse, and the calendar focus defaults to the session month.
    pub fn from_input(input: &SessionInput) -> PlannerResult<Self> {
        let location = input.location.trim();
        if location.is_empty() {
            return Err(PlannerError::invalid_input_with_context(
                "location must not be empty",
                ErrorContext::new("validate_request").with_field("location"),
            ));
        }
        let equipment = input.equipment.trim();
        if equipment.is_empty() {
            return Err(PlannerError::invalid_input_with_context(
                "equipment must not be empty",
                ErrorContext::new("validate_request").with_field("equipment"),
            ));
        }

        let session_date = crate::services::moon_phase::parse_session_date(&input.date)?;
        let start_time = parse_optional_time(input.start_time.as_deref(), "startTime")?;
        let end_time = parse_optional_time(input.end_time.as_deref(), "endTime")?;

        let calendar_focus = match input.calendar_month.as_deref().map(str::trim) {
            Some(month) if !month.is_empty() => CalendarFocus::parse(month)?,
            _ => CalendarFocus::of_date(session_date),
        };

        Ok(Self {
            session_date,
            start_time,
            end_time,
            location: location.to_string(),
            equipment_id: equipment.to_string(),
            calendar_focus,
        })
    }

    /// Re-check the non-empty invariants on a request built by hand.
    pub fn validate(&self) -> PlannerResult<()> {
        if self.location.trim().is_empty() {
            return Err(PlannerError::invalid_input_with_context(
                "location must not be empty",
                ErrorContext::new("validate_request").with_field("location"),
            ));
        }
        if self.equipment_id.trim().is_empty() {
            return Err(PlannerError::invalid_input_with_context(
                "equipment must not be empty",
                ErrorContext::new("validate_request").with_field("equipment"),
            ));
        }
        Ok(())
    }
}

fn parse_optional_time(value: Option<&str>, field: &str) -> PlannerResult<Option<NaiveTime>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(Some)
        .map_err(|e| {
            PlannerError::invalid_input_with_context(
                format!("'{}' is not a HH:MM time", raw),
                ErrorContext::new("validate_request")
                    .with_field(field)
                    .with_details(e.to_string()),
            )
        })
}
