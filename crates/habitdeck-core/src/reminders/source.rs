//! Reminder sources.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ReminderError;

/// Server-supplied reminder state. Missing fields mean "nothing due".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSignal {
    #[serde(default)]
    pub alert: bool,
    #[serde(default)]
    pub message: String,
}

impl ReminderSignal {
    pub fn due(message: &str) -> Self {
        Self {
            alert: true,
            message: message.to_string(),
        }
    }
}

#[async_trait]
pub trait ReminderSource: Send + Sync {
    async fn fetch(&self) -> Result<ReminderSignal, ReminderError>;
}

/// Polls `GET {base}/get_reminders`.
#[derive(Debug, Clone)]
pub struct HttpReminderSource {
    client: Client,
    endpoint: Url,
}

impl HttpReminderSource {
    pub const PATH: &'static str = "/get_reminders";
    /// Per-request ceiling; half the default poll interval.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// # Errors
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ReminderError> {
        Self::with_timeout(base_url, Self::REQUEST_TIMEOUT)
    }

    /// Source whose requests give up after `timeout`, connect included.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ReminderError> {
        let endpoint = Url::parse(base_url)?.join(Self::PATH)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ReminderSource for HttpReminderSource {
    async fn fetch(&self) -> Result<ReminderSignal, ReminderError> {
        let resp = self.client.get(self.endpoint.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReminderError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_rooted_at_origin() {
        let source = HttpReminderSource::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(source.endpoint().as_str(), "http://127.0.0.1:5000/get_reminders");

        let nested = HttpReminderSource::new("https://habits.example/app/").unwrap();
        assert_eq!(nested.endpoint().as_str(), "https://habits.example/get_reminders");
    }

    #[test]
    fn rejects_relative_base() {
        assert!(matches!(
            HttpReminderSource::new("not a url"),
            Err(ReminderError::Endpoint(_))
        ));
    }

    #[test]
    fn signal_defaults_missing_fields() {
        let signal: ReminderSignal = serde_json::from_str("{}").unwrap();
        assert_eq!(signal, ReminderSignal::default());
        let signal: ReminderSignal = serde_json::from_str(r#"{"alert":false}"#).unwrap();
        assert!(!signal.alert);
        let signal: ReminderSignal =
            serde_json::from_str(r#"{"alert":true,"message":"Drink water"}"#).unwrap();
        assert_eq!(signal, ReminderSignal::due("Drink water"));
    }
}
