//! Account-linking bridge between the Telegram bot and the laundry queue backend.
//!
//! A `/start <student_id>` deep link is validated by [`handler::LinkHandler`],
//! sent to the backend by [`link::SecureLinkClient`], and turned into a chat
//! reply plus a log record by [`translate::ResponseTranslator`].

pub mod commands;
pub mod config;
pub mod handler;
pub mod link;
pub mod logging;
pub mod secret;
pub mod translate;

pub use commands::{BotCommand, CommandRouter, Routed};
pub use config::{BridgeConfig, ConfigError};
pub use handler::{CommandInvocation, LinkHandler, ReplyChannel, ReplyError};
pub use link::{LinkBackend, LinkOutcome, LinkRequest, OutcomeTag, SecureLinkClient};
pub use logging::{LogSink, MemoryLogSink, TracingLogSink};
pub use secret::SharedSecret;
pub use translate::{Locale, LogRecord, ResponseTranslator, Severity, Translation};
