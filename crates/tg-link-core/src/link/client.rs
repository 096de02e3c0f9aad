use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::outcome::{classify_status, LinkOutcome};
use crate::secret::SharedSecret;

pub const LINK_PATH: &str = "/api/telegram/link";
pub const SECRET_HEADER: &str = "X-Telegram-Secret";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "tg-link/0.1.0";

/// Errors raised while constructing the client. Per-request failures are never
/// errors; they are folded into [`LinkOutcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid backend URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Payload sent to the backend linking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRequest {
    pub student_id: String,
    #[serde(rename = "telegram_chat_id")]
    pub chat_id: String,
}

impl LinkRequest {
    pub fn new(student_id: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            chat_id: chat_id.into(),
        }
    }
}

/// Anything able to perform one linking attempt.
pub trait LinkBackend: Send + Sync {
    fn link(
        &self,
        req: &LinkRequest,
        secret: &SharedSecret,
    ) -> impl Future<Output = LinkOutcome> + Send;
}

/// HTTP client for `POST /api/telegram/link`. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct SecureLinkClient {
    http: Client,
    endpoint: Url,
    timeout: Duration,
}

impl SecureLinkClient {
    /// Build a client for the backend rooted at `base_url`.
    pub fn new(base_url: &Url) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&format!(
            "{}{LINK_PATH}",
            base_url.as_str().trim_end_matches('/')
        ))?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            endpoint,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, req: &LinkRequest, secret: &SharedSecret) -> LinkOutcome {
        let response = match self
            .http
            .post(self.endpoint.clone())
            .header(SECRET_HEADER, secret.expose())
            .json(req)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return classify_send_error(&err),
        };

        let status = response.status();
        // The timeout covers the body as well; a stalled body is still a timeout.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return classify_transport_error(&err),
        };

        classify_status(status, &body)
    }
}

impl LinkBackend for SecureLinkClient {
    async fn link(&self, req: &LinkRequest, secret: &SharedSecret) -> LinkOutcome {
        self.send(req, secret).await
    }
}

/// Failures before any response arrived. A peer that accepts the connection and
/// then closes or resets it is still a connection failure.
fn classify_send_error(err: &reqwest::Error) -> LinkOutcome {
    if !err.is_timeout() && !err.is_connect() && connection_dropped(err) {
        return LinkOutcome::ConnectionFailure;
    }
    classify_transport_error(err)
}

fn classify_transport_error(err: &reqwest::Error) -> LinkOutcome {
    if err.is_timeout() {
        LinkOutcome::Timeout
    } else if err.is_connect() {
        LinkOutcome::ConnectionFailure
    } else {
        LinkOutcome::UnexpectedFailure {
            detail: error_chain(err),
        }
    }
}

fn connection_dropped(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Render an error with all of its causes, outermost first.
fn error_chain(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
