use super::models::{Attendee, Event, EventDateTime, ReminderMethod, ReminderOverride, Reminders};
use crate::error::{other_error, ManagerResult};
use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

pub const DEFAULT_TITLE: &str = "Action Item -or- Meeting";
pub const DEFAULT_LOCATION: &str = "Your Desk";
pub const DEFAULT_DESCRIPTION: &str = "Action Item -or- Meeting, Please do this!";
pub const DEFAULT_RECURRENCE: &str = "RRULE:FREQ=DAILY;COUNT=2";
pub const DEFAULT_ATTENDEES: [&str; 2] = ["lpage@example.com", "sbrin@example.com"];

/// Event payload with caller overrides kept apart from the fixed schedule.
///
/// Only the title, location and description can be changed; start, end,
/// timezone, recurrence, attendees and reminders always come from the template.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTemplate {
    title: String,
    location: String,
    description: String,
}

impl Default for EventTemplate {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

impl EventTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Produce the request body for `events.insert`
    pub fn build(&self) -> ManagerResult<Event> {
        let timezone = chrono_tz::America::Los_Angeles;
        let day = schedule_day()?;

        Ok(Event {
            summary: Some(self.title.clone()),
            location: Some(self.location.clone()),
            description: Some(self.description.clone()),
            start: Some(zoned(day.and_hms_opt(9, 0, 0), timezone)?),
            end: Some(zoned(day.and_hms_opt(17, 0, 0), timezone)?),
            recurrence: vec![DEFAULT_RECURRENCE.to_string()],
            attendees: DEFAULT_ATTENDEES.iter().map(|email| Attendee::new(*email)).collect(),
            reminders: Some(Reminders {
                use_default: false,
                overrides: vec![
                    ReminderOverride {
                        method: ReminderMethod::Email,
                        minutes: 24 * 60,
                    },
                    ReminderOverride {
                        method: ReminderMethod::Popup,
                        minutes: 10,
                    },
                ],
            }),
            ..Default::default()
        })
    }
}

fn schedule_day() -> ManagerResult<NaiveDate> {
    NaiveDate::from_ymd_opt(2015, 5, 28).ok_or_else(|| other_error("Invalid template date"))
}

/// Render a wall-clock time in `timezone` with the matching UTC offset
fn zoned(local: Option<NaiveDateTime>, timezone: Tz) -> ManagerResult<EventDateTime> {
    let local = local.ok_or_else(|| other_error("Invalid template time"))?;
    let date_time = timezone
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| other_error(&format!("{} does not exist unambiguously in {}", local, timezone)))?;

    Ok(EventDateTime {
        date_time: Some(date_time.to_rfc3339()),
        date: None,
        time_zone: Some(timezone.name().to_string()),
    })
}
