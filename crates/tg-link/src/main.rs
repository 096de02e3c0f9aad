use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tg_link_core::config::parse_timeout;
use tg_link_core::{
    BridgeConfig, CommandRouter, Locale, ReplyChannel, ReplyError, ResponseTranslator, Routed,
};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "tg_link=info,tg_link_core=info";

#[derive(Parser, Debug)]
#[command(author, version, about = "Telegram account-linking bridge")]
struct Cli {
    /// Backend base URL (overrides BASE_URL)
    #[arg(long = "base-url", global = true)]
    base_url: Option<String>,
    /// Reply language: ru or en (overrides TG_LINK_LOCALE)
    #[arg(long, global = true)]
    locale: Option<Locale>,
    /// Request timeout in seconds (overrides TG_LINK_TIMEOUT_SECS)
    #[arg(long = "timeout-secs", global = true, value_parser = parse_timeout_arg)]
    timeout_secs: Option<Duration>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Link a student to a chat, as `/start <student_id>` would
    Link(LinkArgs),
    /// Route one raw chat message through the bot command router
    Message(MessageArgs),
    /// Print the bot help text
    HelpText,
}

#[derive(Args, Debug)]
struct LinkArgs {
    /// Student identifier from the app deep link
    student_id: String,
    /// Telegram chat id of the session
    #[arg(long = "chat-id", allow_negative_numbers = true)]
    chat_id: i64,
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Telegram chat id of the session
    #[arg(long = "chat-id", allow_negative_numbers = true)]
    chat_id: i64,
    /// Message text, e.g. `/start abc123`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    text: Vec<String>,
}

/// Reply channel printing each message to stdout.
struct StdoutReply;

impl ReplyChannel for StdoutReply {
    async fn send(&self, text: &str) -> Result<(), ReplyError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

fn parse_timeout_arg(raw: &str) -> Result<Duration, String> {
    parse_timeout(raw).map_err(|err| err.to_string())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Link(args) => link(&config, args).await,
        Commands::Message(args) => message(&config, args).await,
        Commands::HelpText => {
            println!("{}", ResponseTranslator::new(config.locale()).help_text());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::from_env().context("failed to load configuration")?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(locale) = cli.locale {
        config = config.with_locale(locale);
    }
    if let Some(timeout) = cli.timeout_secs {
        config = config.with_timeout(timeout);
    }
    if config.secret().is_none() {
        tracing::error!("TELEGRAM_WEBHOOK_SECRET not configured; linking requests will be refused");
    }
    tracing::debug!(
        base_url = %config.base_url(),
        locale = %config.locale(),
        timeout_secs = config.timeout().as_secs(),
        "configuration loaded"
    );
    Ok(config)
}

async fn link(config: &BridgeConfig, args: LinkArgs) -> Result<ExitCode> {
    let handler = config.handler().context("failed to build link client")?;
    let outcome = handler
        .respond(&[args.student_id], &args.chat_id.to_string(), &StdoutReply)
        .await;
    Ok(exit_code(outcome.is_success()))
}

async fn message(config: &BridgeConfig, args: MessageArgs) -> Result<ExitCode> {
    let router = CommandRouter::new(config.handler().context("failed to build link client")?);
    let text = args.text.join(" ");
    let routed = router
        .dispatch(&text, &args.chat_id.to_string(), &StdoutReply)
        .await;
    let ok = match routed {
        Routed::Linked(outcome) => outcome.is_success(),
        Routed::Instructions | Routed::Help => true,
        Routed::Ignored => {
            tracing::info!(text = %text, "message is not a bot command; nothing sent");
            true
        }
    };
    Ok(exit_code(ok))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
