//! Turns link outcomes into chat replies and structured log records.

use std::fmt;
use std::str::FromStr;

use crate::link::{LinkOutcome, OutcomeClass, OutcomeTag};

const BODY_SNIPPET_CHARS: usize = 200;

/// Language used for user-facing replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl FromStr for Locale {
    type Err = InvalidLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" => Ok(Locale::Ru),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(InvalidLocale(other.to_owned())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported locale '{0}'")]
pub struct InvalidLocale(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Structured record emitted once per linking invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub tag: OutcomeTag,
    pub correlation_id: Option<String>,
    pub detail: Option<String>,
}

impl LogRecord {
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub user_message: String,
    pub log: LogRecord,
}

/// Pure mapping from [`LinkOutcome`] to reply text and log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTranslator {
    locale: Locale,
}

impl ResponseTranslator {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn translate(&self, outcome: &LinkOutcome) -> Translation {
        Translation {
            user_message: self.user_message(outcome),
            log: log_record(outcome),
        }
    }

    fn user_message(&self, outcome: &LinkOutcome) -> String {
        match (self.locale, outcome) {
            (Locale::Ru, LinkOutcome::Success { message }) => format!(
                "✅ {message}\n\nТеперь вы будете получать уведомления о статусе очереди."
            ),
            (Locale::En, LinkOutcome::Success { message }) => {
                format!("✅ {message}\n\nYou will now receive queue status notifications.")
            }
            (Locale::Ru, LinkOutcome::Unauthorized) => {
                "❌ Ошибка авторизации. Обратитесь к администратору.".into()
            }
            (Locale::En, LinkOutcome::Unauthorized) => {
                "❌ Authorization error. Please contact the administrator.".into()
            }
            (Locale::Ru, LinkOutcome::NotFound) => "❌ Студент не найден в базе данных.\n\n\
                 Убедитесь, что вы используете правильную ссылку из приложения."
                .into(),
            (Locale::En, LinkOutcome::NotFound) => "❌ Student not found.\n\n\
                 Make sure you are using the link from the app."
                .into(),
            (Locale::Ru, LinkOutcome::BadRequest) => "❌ Ошибка: неверные данные запроса.".into(),
            (Locale::En, LinkOutcome::BadRequest) => "❌ Error: invalid request data.".into(),
            (Locale::Ru, LinkOutcome::ServerError { message }) => format!(
                "❌ Ошибка сервера: {message}\n\nПопробуйте позже или обратитесь к администратору."
            ),
            (Locale::En, LinkOutcome::ServerError { message }) => format!(
                "❌ Server error: {message}\n\nTry again later or contact the administrator."
            ),
            (Locale::Ru, LinkOutcome::UnknownStatus { code, .. }) => {
                format!("❌ Неизвестная ошибка (код: {code})\n\nОбратитесь к администратору.")
            }
            (Locale::En, LinkOutcome::UnknownStatus { code, .. }) => {
                format!("❌ Unknown error (code: {code})\n\nPlease contact the administrator.")
            }
            (Locale::Ru, LinkOutcome::Timeout) => {
                "❌ Превышено время ожидания ответа от сервера.\n\nПопробуйте позже.".into()
            }
            (Locale::En, LinkOutcome::Timeout) => {
                "❌ The server took too long to respond.\n\nPlease try again later.".into()
            }
            (Locale::Ru, LinkOutcome::ConnectionFailure) => "❌ Ошибка подключения к серверу.\n\n\
                 Проверьте интернет-соединение или попробуйте позже."
                .into(),
            (Locale::En, LinkOutcome::ConnectionFailure) => "❌ Could not connect to the server.\n\n\
                 Check your connection or try again later."
                .into(),
            (Locale::Ru, LinkOutcome::ConfigurationMissing) => {
                "❌ Ошибка конфигурации бота. Обратитесь к администратору.".into()
            }
            (Locale::En, LinkOutcome::ConfigurationMissing) => {
                "❌ Bot configuration error. Please contact the administrator.".into()
            }
            (Locale::Ru, LinkOutcome::MalformedCommand) => "❌ Неправильный формат команды!\n\n\
                 Используйте ссылку из приложения для подключения Telegram."
                .into(),
            (Locale::En, LinkOutcome::MalformedCommand) => "❌ Invalid command format!\n\n\
                 Use the link from the app to connect Telegram."
                .into(),
            (Locale::Ru, LinkOutcome::UnexpectedFailure { .. }) => {
                "❌ Произошла непредвиденная ошибка.\n\nОбратитесь к администратору.".into()
            }
            (Locale::En, LinkOutcome::UnexpectedFailure { .. }) => {
                "❌ An unexpected error occurred.\n\nPlease contact the administrator.".into()
            }
        }
    }

    /// Reply for a bare `/start` without a linking token.
    pub fn connect_instructions(&self) -> &'static str {
        match self.locale {
            Locale::Ru => {
                "👋 Чтобы подключить Telegram — откройте сайт Keiin Laundry и нажмите кнопку \
                 \"Подключить Telegram\"."
            }
            Locale::En => {
                "👋 To connect Telegram, open the Keiin Laundry site and press \
                 \"Connect Telegram\"."
            }
        }
    }

    pub fn help_text(&self) -> &'static str {
        match self.locale {
            Locale::Ru => {
                "🧺 Бот очереди на стирку\n\n\
                 Доступные команды:\n\
                 /start - Подключить уведомления (по ссылке из приложения)\n\
                 /help - Показать эту справку\n\n\
                 Как подключить уведомления:\n\
                 1. Откройте приложение очереди\n\
                 2. Нажмите \"Подключить Telegram\"\n\
                 3. Перейдите по ссылке и нажмите Start\n\
                 4. Готово! ✅"
            }
            Locale::En => {
                "🧺 Laundry queue bot\n\n\
                 Available commands:\n\
                 /start - Connect notifications (via the link from the app)\n\
                 /help - Show this help\n\n\
                 How to connect notifications:\n\
                 1. Open the queue app\n\
                 2. Press \"Connect Telegram\"\n\
                 3. Follow the link and press Start\n\
                 4. Done! ✅"
            }
        }
    }
}

fn log_record(outcome: &LinkOutcome) -> LogRecord {
    let detail = match outcome {
        LinkOutcome::Success { message } | LinkOutcome::ServerError { message } => {
            Some(message.clone())
        }
        LinkOutcome::UnknownStatus { code, body } => {
            Some(format!("status {code}: {}", snippet(body)))
        }
        LinkOutcome::UnexpectedFailure { detail } => Some(detail.clone()),
        _ => None,
    };
    LogRecord {
        severity: severity_for(outcome.class()),
        tag: outcome.tag(),
        correlation_id: None,
        detail,
    }
}

fn severity_for(class: OutcomeClass) -> Severity {
    match class {
        OutcomeClass::Linked => Severity::Info,
        OutcomeClass::ConfigurationFault
        | OutcomeClass::AuthorizationFault
        | OutcomeClass::UnclassifiedFailure => Severity::Error,
        OutcomeClass::UserInputFault
        | OutcomeClass::ResourceNotFound
        | OutcomeClass::ValidationFault
        | OutcomeClass::BackendFault
        | OutcomeClass::ProtocolAnomaly
        | OutcomeClass::TransportTimeout
        | OutcomeClass::TransportConnectionFailure => Severity::Warn,
    }
}

fn snippet(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
