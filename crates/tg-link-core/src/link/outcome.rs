use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Telegram успешно подключен!";
pub const DEFAULT_SERVER_ERROR: &str = "Внутренняя ошибка сервера";

/// Fully classified result of one linking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Success { message: String },
    Unauthorized,
    NotFound,
    BadRequest,
    ServerError { message: String },
    UnknownStatus { code: u16, body: String },
    Timeout,
    ConnectionFailure,
    ConfigurationMissing,
    MalformedCommand,
    UnexpectedFailure { detail: String },
}

impl LinkOutcome {
    pub fn tag(&self) -> OutcomeTag {
        match self {
            LinkOutcome::Success { .. } => OutcomeTag::Success,
            LinkOutcome::Unauthorized => OutcomeTag::Unauthorized,
            LinkOutcome::NotFound => OutcomeTag::NotFound,
            LinkOutcome::BadRequest => OutcomeTag::BadRequest,
            LinkOutcome::ServerError { .. } => OutcomeTag::ServerError,
            LinkOutcome::UnknownStatus { .. } => OutcomeTag::UnknownStatus,
            LinkOutcome::Timeout => OutcomeTag::Timeout,
            LinkOutcome::ConnectionFailure => OutcomeTag::ConnectionFailure,
            LinkOutcome::ConfigurationMissing => OutcomeTag::ConfigurationMissing,
            LinkOutcome::MalformedCommand => OutcomeTag::MalformedCommand,
            LinkOutcome::UnexpectedFailure { .. } => OutcomeTag::UnexpectedFailure,
        }
    }

    /// Fault class used to pick log severity and for operator dashboards.
    pub fn class(&self) -> OutcomeClass {
        match self {
            LinkOutcome::Success { .. } => OutcomeClass::Linked,
            LinkOutcome::Unauthorized => OutcomeClass::AuthorizationFault,
            LinkOutcome::NotFound => OutcomeClass::ResourceNotFound,
            LinkOutcome::BadRequest => OutcomeClass::ValidationFault,
            LinkOutcome::ServerError { .. } => OutcomeClass::BackendFault,
            LinkOutcome::UnknownStatus { .. } => OutcomeClass::ProtocolAnomaly,
            LinkOutcome::Timeout => OutcomeClass::TransportTimeout,
            LinkOutcome::ConnectionFailure => OutcomeClass::TransportConnectionFailure,
            LinkOutcome::ConfigurationMissing => OutcomeClass::ConfigurationFault,
            LinkOutcome::MalformedCommand => OutcomeClass::UserInputFault,
            LinkOutcome::UnexpectedFailure { .. } => OutcomeClass::UnclassifiedFailure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LinkOutcome::Success { .. })
    }
}

/// Stable identifier of a [`LinkOutcome`] variant, used as the log tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeTag {
    Success,
    Unauthorized,
    NotFound,
    BadRequest,
    ServerError,
    UnknownStatus,
    Timeout,
    ConnectionFailure,
    ConfigurationMissing,
    MalformedCommand,
    UnexpectedFailure,
}

impl OutcomeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeTag::Success => "success",
            OutcomeTag::Unauthorized => "unauthorized",
            OutcomeTag::NotFound => "not_found",
            OutcomeTag::BadRequest => "bad_request",
            OutcomeTag::ServerError => "server_error",
            OutcomeTag::UnknownStatus => "unknown_status",
            OutcomeTag::Timeout => "timeout",
            OutcomeTag::ConnectionFailure => "connection_failure",
            OutcomeTag::ConfigurationMissing => "configuration_missing",
            OutcomeTag::MalformedCommand => "malformed_command",
            OutcomeTag::UnexpectedFailure => "unexpected_failure",
        }
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Linked,
    ConfigurationFault,
    UserInputFault,
    AuthorizationFault,
    ResourceNotFound,
    ValidationFault,
    BackendFault,
    ProtocolAnomaly,
    TransportTimeout,
    TransportConnectionFailure,
    UnclassifiedFailure,
}

/// Map a backend response onto an outcome. Every status lands in exactly one variant.
///
/// Bodies of 200 and 500 responses must be JSON; a missing or non-string field
/// falls back to the default text, while a non-JSON body is an unexpected failure.
pub fn classify_status(status: StatusCode, body: &str) -> LinkOutcome {
    match status.as_u16() {
        200 => match json_field(body, "message") {
            Ok(message) => LinkOutcome::Success {
                message: message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_owned()),
            },
            Err(err) => unparsable_body(200, &err),
        },
        401 => LinkOutcome::Unauthorized,
        404 => LinkOutcome::NotFound,
        400 => LinkOutcome::BadRequest,
        500 => match json_field(body, "error") {
            Ok(message) => LinkOutcome::ServerError {
                message: message.unwrap_or_else(|| DEFAULT_SERVER_ERROR.to_owned()),
            },
            Err(err) => unparsable_body(500, &err),
        },
        code => LinkOutcome::UnknownStatus {
            code,
            body: body.to_owned(),
        },
    }
}

fn json_field(body: &str, field: &str) -> Result<Option<String>, serde_json::Error> {
    let payload: Value = serde_json::from_str(body)?;
    Ok(payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned))
}

fn unparsable_body(code: u16, err: &serde_json::Error) -> LinkOutcome {
    LinkOutcome::UnexpectedFailure {
        detail: format!("status {code} with non-JSON body: {err}"),
    }
}
