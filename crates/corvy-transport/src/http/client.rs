//! HTTP client transport implementation.

use std::time::Duration;

use async_trait::async_trait;
use corvy_core::{BotIdentity, Cursor, FetchBatch, Transport, TransportError, TransportResult};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use tracing::{debug, info, trace};

use super::wire::{SendMessageBody, decode_batch, decode_identity};

pub const DEFAULT_BASE_URL: &str = "https://corvy.chat/api/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpTransport`].
#[derive(Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`Transport`] over the platform's REST API with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_url(&self) -> String {
        format!("{}/auth", self.base_url)
    }

    fn messages_url(&self, cursor: Cursor) -> String {
        format!("{}/messages?cursor={}", self.base_url, cursor.value())
    }

    fn send_url(&self, flock_id: u64, nest_id: u64) -> String {
        format!(
            "{}/flocks/{flock_id}/nests/{nest_id}/messages",
            self.base_url
        )
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn execute(&self, url: &str, request: RequestBuilder) -> TransportResult<String> {
        let resp = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| connection_failed(url, &e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| connection_failed(url, &e))?;
        trace!(%url, status = status.as_u16(), bytes = body.len(), "HTTP response");

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn connection_failed(url: &str, err: &reqwest::Error) -> TransportError {
    TransportError::ConnectionFailed {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn authenticate(&self) -> TransportResult<BotIdentity> {
        let url = self.auth_url();
        let body = match self.execute(&url, self.client.post(&url)).await {
            Ok(body) => body,
            Err(TransportError::Http { status, body })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                return Err(TransportError::authentication(format!(
                    "HTTP {status}: {body}"
                )));
            }
            Err(e) => return Err(e),
        };

        let identity = decode_identity(&body)?;
        info!(bot = %identity.name, "Authenticated with Corvy");
        Ok(identity)
    }

    async fn fetch_since(&self, cursor: Cursor) -> TransportResult<FetchBatch> {
        let url = self.messages_url(cursor);
        let body = self.execute(&url, self.client.get(&url)).await?;
        let batch = decode_batch(&body)?;
        if !batch.messages.is_empty() {
            debug!(%cursor, count = batch.messages.len(), "Fetched messages");
        }
        Ok(batch)
    }

    async fn post_message(&self, flock_id: u64, nest_id: u64, content: &str) -> TransportResult<()> {
        let url = self.send_url(flock_id, nest_id);
        let request = self.client.post(&url).json(&SendMessageBody { content });
        self.execute(&url, request).await?;
        debug!(flock_id, nest_id, "Message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig::new("secret").base_url(base)).unwrap()
    }

    #[test]
    fn test_urls() {
        let t = transport("https://corvy.chat/api/v2/");
        assert_eq!(t.base_url(), "https://corvy.chat/api/v2");
        assert_eq!(t.auth_url(), "https://corvy.chat/api/v2/auth");
        assert_eq!(
            t.messages_url(Cursor::new(105)),
            "https://corvy.chat/api/v2/messages?cursor=105"
        );
        assert_eq!(
            t.messages_url(Cursor::START),
            "https://corvy.chat/api/v2/messages?cursor=0"
        );
        assert_eq!(
            t.send_url(3, 4),
            "https://corvy.chat/api/v2/flocks/3/nests/4/messages"
        );
    }

    #[test]
    fn test_config_debug_hides_token() {
        let config = HttpTransportConfig::new("hunter2");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_failure() {
        // Nothing listens on port 1.
        let t = HttpTransport::new(
            HttpTransportConfig::new("secret")
                .base_url("http://127.0.0.1:1")
                .timeout(Duration::from_secs(2)),
        )
        .unwrap();

        match t.fetch_since(Cursor::START).await {
            Err(TransportError::ConnectionFailed { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:1/messages?cursor=0");
            }
            other => panic!("expected connection failure, got {other:?}"),
        }
    }
}
