use super::credential::Credential;
use super::models::{Event, EventList};
use super::template::EventTemplate;
use crate::error::{config_error, credential_error, Error, ManagerResult};
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

/// Calendar every request goes to
pub const PRIMARY_CALENDAR: &str = "primary";
/// Number of events returned by `list_recent_events` when the caller has no preference
pub const DEFAULT_EVENT_COUNT: u32 = 10;

/// Handle for the Calendar API, bound to one valid credential.
///
/// Only [`SessionManager::initialize`](super::SessionManager::initialize) creates
/// one, so a client without a credential cannot exist.
#[derive(Debug)]
pub struct CalendarClient {
    client: Client,
    credential: Credential,
    events_url: Url,
}

impl CalendarClient {
    pub(crate) fn new(client: Client, credential: Credential, api_base_url: &str) -> ManagerResult<Self> {
        if credential.access_token().is_none() {
            return Err(credential_error("Cannot bind calendar client without an access token"));
        }

        let events_url = events_url(api_base_url)?;
        Ok(Self {
            client,
            credential,
            events_url,
        })
    }

    /// Credential the client is bound to
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Get up to `count` upcoming events on the primary calendar, soonest first
    pub async fn list_recent_events(&self, count: u32) -> ManagerResult<Vec<Event>> {
        if count == 0 {
            return Err(Error::InvalidInput("count must be a positive integer".to_string()));
        }

        let time_min = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        info!("Getting the upcoming {} events", count);

        let mut url = self.events_url.clone();
        url.query_pairs_mut()
            .append_pair("timeMin", &time_min)
            .append_pair("maxResults", &count.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        debug!("GET {}", url);
        let response = self.client.get(url).bearer_auth(self.token()).send().await?;
        let response = check_status(response).await?;

        let mut list: EventList = decode(response).await?;
        list.items.truncate(count as usize);
        Ok(list.items)
    }

    /// Insert an event built from `template` on the primary calendar
    pub async fn create_event(&self, template: &EventTemplate) -> ManagerResult<Event> {
        let body = template.build()?;

        debug!("POST {}", self.events_url);
        let response = self
            .client
            .post(self.events_url.clone())
            .bearer_auth(self.token())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let created: Event = decode(response).await?;
        info!(
            "Event created: {}",
            created.html_link.as_deref().unwrap_or("<no link>")
        );
        Ok(created)
    }

    /// Insert the template event with the given title, location and description
    pub async fn create_event_with(
        &self,
        title: &str,
        location: &str,
        description: &str,
    ) -> ManagerResult<Event> {
        let template = EventTemplate::new()
            .title(title)
            .location(location)
            .description(description);
        self.create_event(&template).await
    }

    fn token(&self) -> &str {
        // Checked in `new`
        self.credential.access_token().unwrap_or_default()
    }
}

fn events_url(api_base_url: &str) -> ManagerResult<Url> {
    let url_str = format!(
        "{}/calendars/{}/events",
        api_base_url.trim_end_matches('/'),
        PRIMARY_CALENDAR
    );
    Url::parse(&url_str).map_err(|e| config_error(&format!("Failed to parse URL: {}", e)))
}

/// Pass non-success responses through untouched
async fn check_status(response: Response) -> ManagerResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await?;
    Err(Error::Api { status, body })
}

/// Transport failures stay `Http`, malformed bodies become `Serialization`
async fn decode<T: DeserializeOwned>(response: Response) -> ManagerResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| Error::Serialization(format!("Failed to parse Calendar API response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url_for_primary_calendar() {
        let url = events_url("https://www.googleapis.com/calendar/v3/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
    }

    #[test]
    fn test_client_requires_access_token() {
        let credential = Credential {
            token: None,
            refresh_token: None,
            token_uri: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scopes: Vec::new(),
            expiry: None,
        };
        let result = CalendarClient::new(Client::new(), credential, "https://example.com");
        assert!(matches!(result, Err(Error::Credential(_))));
    }
}
