//! Parsing and routing of chat text commands (`/start <token>`, `/help`).

use crate::handler::{LinkHandler, ReplyChannel};
use crate::link::{LinkBackend, LinkOutcome};
use crate::logging::{LogSink, TracingLogSink};

/// Commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// `/start` with the deep-link payload split into arguments.
    Start { args: Vec<String> },
    Help,
    Unknown(String),
}

impl BotCommand {
    /// Parse a chat message. Returns `None` for plain text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        // Group chats address commands as `/start@bot_name`.
        let name = head.split('@').next().unwrap_or_default().to_ascii_lowercase();
        let command = match name.as_str() {
            "start" => BotCommand::Start {
                args: tokens.map(ToOwned::to_owned).collect(),
            },
            "help" => BotCommand::Help,
            _ => BotCommand::Unknown(name),
        };
        Some(command)
    }
}

/// What the router did with an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Linked(LinkOutcome),
    Instructions,
    Help,
    Ignored,
}

/// Dispatches chat messages to the link handler or to static replies.
#[derive(Debug, Clone)]
pub struct CommandRouter<B, S = TracingLogSink> {
    handler: LinkHandler<B, S>,
}

impl<B, S> CommandRouter<B, S>
where
    B: LinkBackend,
    S: LogSink,
{
    pub fn new(handler: LinkHandler<B, S>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &LinkHandler<B, S> {
        &self.handler
    }

    pub async fn dispatch<R>(&self, text: &str, chat_id: &str, reply: &R) -> Routed
    where
        R: ReplyChannel,
    {
        let translator = self.handler.translator();
        match BotCommand::parse(text) {
            Some(BotCommand::Start { args }) if args.is_empty() => {
                send_static(reply, translator.connect_instructions(), chat_id).await;
                Routed::Instructions
            }
            Some(BotCommand::Start { args }) => {
                Routed::Linked(self.handler.respond(&args, chat_id, reply).await)
            }
            Some(BotCommand::Help) => {
                send_static(reply, translator.help_text(), chat_id).await;
                Routed::Help
            }
            Some(BotCommand::Unknown(name)) => {
                tracing::debug!(command = %name, chat_id, "ignoring unknown command");
                Routed::Ignored
            }
            None => Routed::Ignored,
        }
    }
}

async fn send_static<R: ReplyChannel>(reply: &R, text: &str, chat_id: &str) {
    if let Err(err) = reply.send(text).await {
        tracing::warn!(error = %err, chat_id, "failed to deliver reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{CountingBackend, RecordingReply};
    use crate::secret::SharedSecret;
    use crate::translate::{Locale, ResponseTranslator};

    fn router(backend: CountingBackend) -> CommandRouter<CountingBackend> {
        let handler = LinkHandler::new(backend, SharedSecret::new("secret"))
            .with_translator(ResponseTranslator::new(Locale::En));
        CommandRouter::new(handler)
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            BotCommand::parse("/start abc-123"),
            Some(BotCommand::Start {
                args: vec!["abc-123".into()]
            })
        );
        assert_eq!(
            BotCommand::parse("  /start@keiin_dorm_laundry_bot   abc "),
            Some(BotCommand::Start {
                args: vec!["abc".into()]
            })
        );
        assert_eq!(
            BotCommand::parse("/start"),
            Some(BotCommand::Start { args: vec![] })
        );
        assert_eq!(BotCommand::parse("/HELP"), Some(BotCommand::Help));
        assert_eq!(
            BotCommand::parse("/queue"),
            Some(BotCommand::Unknown("queue".into()))
        );
        assert_eq!(BotCommand::parse("hello there"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[tokio::test]
    async fn start_with_payload_links() {
        let backend = CountingBackend::returning(LinkOutcome::Success {
            message: "Linked!".into(),
        });
        let reply = RecordingReply::default();
        let routed = router(backend.clone())
            .dispatch("/start student-9", "77", &reply)
            .await;

        assert!(matches!(routed, Routed::Linked(LinkOutcome::Success { .. })));
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.seen()[0].student_id, "student-9");
        assert!(reply.sent()[0].contains("Linked!"));
    }

    #[tokio::test]
    async fn bare_start_sends_instructions_without_network() {
        let backend = CountingBackend::returning(LinkOutcome::NotFound);
        let reply = RecordingReply::default();
        let routed = router(backend.clone()).dispatch("/start", "77", &reply).await;

        assert_eq!(routed, Routed::Instructions);
        assert_eq!(backend.calls(), 0);
        assert!(reply.sent()[0].contains("Connect Telegram"));
    }

    #[tokio::test]
    async fn help_and_plain_text() {
        let backend = CountingBackend::returning(LinkOutcome::NotFound);
        let reply = RecordingReply::default();
        let router = router(backend.clone());

        assert_eq!(router.dispatch("/help", "1", &reply).await, Routed::Help);
        assert_eq!(router.dispatch("what is this", "1", &reply).await, Routed::Ignored);
        assert_eq!(router.dispatch("/queue", "1", &reply).await, Routed::Ignored);

        assert_eq!(reply.sent().len(), 1);
        assert!(reply.sent()[0].contains("/help"));
        assert_eq!(backend.calls(), 0);
    }
}
