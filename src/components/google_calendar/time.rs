use super::models::{Event, EventDateTime};
use crate::error::{other_error, ManagerResult};
use chrono::{DateTime, NaiveDate, Utc};

/// Get event start time as a UTC instant. All-day events start at midnight UTC.
pub fn get_event_start(event: &Event) -> ManagerResult<Option<DateTime<Utc>>> {
    match &event.start {
        Some(start) => parse_event_time(start),
        None => Ok(None),
    }
}

pub fn parse_event_time(time: &EventDateTime) -> ManagerResult<Option<DateTime<Utc>>> {
    if let Some(date_time) = &time.date_time {
        let dt = DateTime::parse_from_rfc3339(date_time)
            .map_err(|e| other_error(&format!("Failed to parse datetime '{}': {}", date_time, e)))?;
        Ok(Some(dt.with_timezone(&Utc)))
    } else if let Some(date) = &time.date {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| other_error(&format!("Failed to parse date '{}': {}", date, e)))?;
        let dt = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| other_error("Failed to create datetime"))?;
        Ok(Some(dt.and_utc()))
    } else {
        Ok(None)
    }
}

/// Short human readable form used when printing event lists
pub fn display_start(event: &Event) -> String {
    let Some(start) = &event.start else {
        return "no start".to_string();
    };
    start
        .date_time
        .clone()
        .or_else(|| start.date.clone())
        .unwrap_or_else(|| "no start".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_starting(start: EventDateTime) -> Event {
        Event {
            start: Some(start),
            ..Default::default()
        }
    }

    #[test]
    fn test_timed_event_start_is_normalized_to_utc() {
        let event = event_starting(EventDateTime {
            date_time: Some("2015-05-28T09:00:00-07:00".to_string()),
            ..Default::default()
        });
        let start = get_event_start(&event).unwrap().unwrap();
        assert_eq!(start.to_rfc3339(), "2015-05-28T16:00:00+00:00");
    }

    #[test]
    fn test_all_day_event_starts_at_midnight() {
        let event = event_starting(EventDateTime {
            date: Some("2024-06-01".to_string()),
            ..Default::default()
        });
        let start = get_event_start(&event).unwrap().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert_eq!(display_start(&event), "2024-06-01");
    }

    #[test]
    fn test_missing_start() {
        assert!(get_event_start(&Event::default()).unwrap().is_none());
        assert_eq!(display_start(&Event::default()), "no start");
    }

    #[test]
    fn test_garbage_datetime_is_an_error() {
        let event = event_starting(EventDateTime {
            date_time: Some("tomorrow-ish".to_string()),
            ..Default::default()
        });
        assert!(get_event_start(&event).is_err());
    }
}
