use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::analytics::AnalyticsReport;
use crate::common::{DirectoryUser, Message, MessageOrigin, OutgoingMessage, Role};
use crate::config::AppConfig;
use crate::error::ApiError;

use super::auth::{TokenSource, token_source};

const MESSAGES_PATH: &str = "api/chat/messages";
const SEND_PATH: &str = "api/chat/send";
const DIRECTORY_PATH: &str = "api/admin/users/only-users";
const ANALYTICS_PATH: &str = "api/admin/analytics";

#[derive(Debug, Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Option<Vec<WireMessage>>,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Option<Vec<DirectoryUser>>,
}

/// A stored message as the chat service returns it.
#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    from_id: Option<String>,
    #[serde(default)]
    from_role: Option<String>,
    #[serde(default)]
    to_id: Option<String>,
    #[serde(default)]
    to_role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Message {
            id: wire.id,
            sender_id: wire.from_id.unwrap_or_default(),
            sender_role: wire.from_role.and_then(|role| role.parse().ok()),
            recipient_id: wire.to_id.unwrap_or_default(),
            recipient_role: wire.to_role.and_then(|role| role.parse::<Role>().ok()),
            content: wire.content.unwrap_or_default(),
            sent_at: wire.timestamp.as_deref().and_then(parse_timestamp),
            origin: MessageOrigin::Persisted,
        }
    }
}

/// The service writes naive ISO-8601 (`2024-05-01T12:30:45.123456`) in UTC;
/// RFC 3339 with an offset is accepted as well.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

/// REST client for the chat service.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|err| ApiError::Url(format!("{base}: {err}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Client for the configured server, timeout and credentials.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            Duration::from_millis(config.request_timeout_ms),
            token_source(config),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::Url(format!("{path}: {err}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.execute(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Full thread for `thread_id` (the non-admin participant), oldest first.
    pub async fn fetch_messages(&self, thread_id: &str) -> Result<Vec<Message>, ApiError> {
        let request = self
            .http
            .get(self.endpoint(MESSAGES_PATH)?)
            .query(&[("user_id", thread_id)]);
        let envelope: MessagesEnvelope = self.get_json(request).await?;
        Ok(envelope
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(Message::from)
            .collect())
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<(), ApiError> {
        let request = self.http.post(self.endpoint(SEND_PATH)?).json(message);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn fetch_directory(&self) -> Result<Vec<DirectoryUser>, ApiError> {
        let request = self.http.get(self.endpoint(DIRECTORY_PATH)?);
        let envelope: UsersEnvelope = self.get_json(request).await?;
        Ok(envelope.users.unwrap_or_default())
    }

    pub async fn fetch_analytics(&self) -> Result<AnalyticsReport, ApiError> {
        let request = self.http.get(self.endpoint(ANALYTICS_PATH)?);
        self.get_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;
    use crate::network::auth::StaticToken;

    #[test]
    fn parses_naive_server_timestamps_as_utc() {
        let parsed = parse_timestamp("2024-05-01T12:30:45.123456").unwrap();
        assert_eq!(parsed.day(), 1);
        assert_eq!(parsed.hour(), 12);
        assert_eq!(parsed.nanosecond(), 123_456_000);

        let whole = parse_timestamp("2024-05-01T12:30:45").unwrap();
        assert_eq!(whole.second(), 45);
    }

    #[test]
    fn parses_offsets() {
        let parsed = parse_timestamp("2024-05-01T14:30:45+02:00").unwrap();
        assert_eq!(parsed.hour(), 12);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn wire_message_maps_to_persisted() {
        let wire: WireMessage = serde_json::from_str(
            r#"{"_id":"m1","from_id":"u1","from_role":"user","to_id":"admin",
                "to_role":"admin","content":"hi","timestamp":"2024-05-01T12:00:00"}"#,
        )
        .unwrap();
        let message = Message::from(wire);
        assert_eq!(message.id, "m1");
        assert_eq!(message.sender_role, Some(Role::User));
        assert_eq!(message.recipient_role, Some(Role::Admin));
        assert_eq!(message.origin, MessageOrigin::Persisted);
        assert!(message.sent_at.is_some());
    }

    #[test]
    fn sparse_wire_message_still_maps() {
        let wire: WireMessage =
            serde_json::from_str(r#"{"_id":"m2","from_role":"owner","timestamp":null}"#).unwrap();
        let message = Message::from(wire);
        assert_eq!(message.sender_role, None);
        assert_eq!(message.content, "");
        assert_eq!(message.sent_at, None);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ApiClient::new(
            "http://127.0.0.1:5000",
            Duration::from_secs(1),
            Arc::new(StaticToken::default()),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(MESSAGES_PATH).unwrap().as_str(),
            "http://127.0.0.1:5000/api/chat/messages"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let result = ApiClient::new(
            "not a url",
            Duration::from_secs(1),
            Arc::new(StaticToken::default()),
        );
        assert!(matches!(result, Err(ApiError::Url(_))));
    }
}
