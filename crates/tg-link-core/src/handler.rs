use std::future::Future;

use thiserror::Error;

use crate::link::{LinkBackend, LinkOutcome, LinkRequest};
use crate::logging::{LogSink, TracingLogSink};
use crate::secret::SharedSecret;
use crate::translate::ResponseTranslator;

/// Outbound channel accepting one text reply per invocation.
pub trait ReplyChannel: Send + Sync {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), ReplyError>> + Send;
}

/// Errors surfaced by reply channels.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply channel closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One command as delivered by the chat runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub args: Vec<String>,
    pub chat_id: String,
}

impl CommandInvocation {
    pub fn new<I, S>(args: I, chat_id: impl ToString) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            chat_id: chat_id.to_string(),
        }
    }
}

/// Validates linking commands and runs them against the backend.
///
/// Holds no per-invocation state, so one handler can serve concurrent chats.
#[derive(Debug, Clone)]
pub struct LinkHandler<B, S = TracingLogSink> {
    backend: B,
    secret: Option<SharedSecret>,
    translator: ResponseTranslator,
    sink: S,
}

impl<B> LinkHandler<B, TracingLogSink>
where
    B: LinkBackend,
{
    pub fn new(backend: B, secret: Option<SharedSecret>) -> Self {
        Self {
            backend,
            secret,
            translator: ResponseTranslator::default(),
            sink: TracingLogSink,
        }
    }
}

impl<B, S> LinkHandler<B, S>
where
    B: LinkBackend,
    S: LogSink,
{
    pub fn with_translator(mut self, translator: ResponseTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_sink<T: LogSink>(self, sink: T) -> LinkHandler<B, T> {
        LinkHandler {
            backend: self.backend,
            secret: self.secret,
            translator: self.translator,
            sink,
        }
    }

    pub fn translator(&self) -> &ResponseTranslator {
        &self.translator
    }

    /// Run one linking invocation. Never fails; every path yields an outcome and
    /// exactly one log record.
    pub async fn handle<A: AsRef<str>>(&self, args: &[A], chat_id: &str) -> LinkOutcome {
        let student_id = args
            .first()
            .map(|arg| arg.as_ref().trim())
            .filter(|arg| !arg.is_empty());

        let outcome = match (&self.secret, student_id) {
            (None, _) => LinkOutcome::ConfigurationMissing,
            (Some(_), None) => LinkOutcome::MalformedCommand,
            (Some(secret), Some(student_id)) => {
                let request = LinkRequest::new(student_id, chat_id);
                self.backend.link(&request, secret).await
            }
        };

        let mut record = self.translator.translate(&outcome).log;
        if let Some(student_id) = student_id {
            record = record.with_correlation_id(student_id);
        }
        self.sink.emit(&record);
        outcome
    }

    /// Run [`handle`](Self::handle) and deliver the translated reply.
    pub async fn respond<A, R>(&self, args: &[A], chat_id: &str, reply: &R) -> LinkOutcome
    where
        A: AsRef<str>,
        R: ReplyChannel,
    {
        let outcome = self.handle(args, chat_id).await;
        let message = self.translator.translate(&outcome).user_message;
        if let Err(err) = reply.send(&message).await {
            tracing::warn!(
                error = %err,
                chat_id,
                outcome = %outcome.tag(),
                "failed to deliver link reply"
            );
        }
        outcome
    }

    pub async fn run<R>(&self, invocation: &CommandInvocation, reply: &R) -> LinkOutcome
    where
        R: ReplyChannel,
    {
        self.respond(&invocation.args, &invocation.chat_id, reply).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Backend double returning a canned outcome and counting calls.
    #[derive(Debug, Clone)]
    pub struct CountingBackend {
        calls: Arc<AtomicUsize>,
        outcome: LinkOutcome,
        seen: Arc<Mutex<Vec<LinkRequest>>>,
    }

    impl CountingBackend {
        pub fn returning(outcome: LinkOutcome) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                outcome,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn seen(&self) -> Vec<LinkRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl LinkBackend for CountingBackend {
        async fn link(&self, req: &LinkRequest, _secret: &SharedSecret) -> LinkOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(req.clone());
            self.outcome.clone()
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingReply {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingReply {
        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ReplyChannel for RecordingReply {
        async fn send(&self, text: &str) -> Result<(), ReplyError> {
            self.sent.lock().unwrap().push(text.to_owned());
            Ok(())
        }
    }

    pub struct ClosedReply;

    impl ReplyChannel for ClosedReply {
        async fn send(&self, _text: &str) -> Result<(), ReplyError> {
            Err(ReplyError::Closed)
        }
    }
}
