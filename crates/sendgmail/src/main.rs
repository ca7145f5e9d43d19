//! `sendgmail` - relays a message from stdin through the Gmail API.
//!
//! Meant to be used as git's `sendemail.sendmailCmd`: the message is read
//! from stdin, sent with an `OAuth2` bearer token kept in the OS keyring,
//! and any prompt needed to obtain that token goes to the console.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod console;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;
use console::ConsoleTerminal;
use sendgmail_core::terminal::Detached;
use sendgmail_core::{
    KeyringStore, Relay, RelayConfig, SecretStore, Terminal, TokenState, TokenStore,
};
use sendgmail_mime::RawMessage;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "sendgmail=warn,sendgmail_core=warn,sendgmail_oauth=warn";

/// Log filter for `--verbose`.
const VERBOSE_FILTER: &str = "sendgmail=debug,sendgmail_core=debug,sendgmail_oauth=debug";

/// Relay a message from stdin through the Gmail API
#[derive(Parser, Debug)]
#[command(name = "sendgmail", version, about)]
struct Args {
    /// Mail-send endpoint
    #[arg(long, env = "SENDGMAIL_SEND_URL", value_name = "URL")]
    send_url: Option<String>,

    /// `OAuth2` token endpoint
    #[arg(long, env = "SENDGMAIL_TOKEN_URL", value_name = "URL")]
    token_url: Option<String>,

    /// `OAuth2` authorization endpoint
    #[arg(long, env = "SENDGMAIL_AUTH_URL", value_name = "URL")]
    auth_url: Option<String>,

    /// Never prompt; fail if credentials have to be entered
    #[arg(long)]
    non_interactive: bool,

    /// Show the state of the stored credentials and exit
    #[arg(long, conflicts_with = "forget")]
    status: bool,

    /// Delete the stored credentials and exit
    #[arg(long)]
    forget: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Sendmail arguments from git send-email (ignored)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    sendmail_args: Vec<String>,
}

impl Args {
    fn relay_config(&self) -> anyhow::Result<RelayConfig> {
        let mut config = RelayConfig::gmail()?;
        if let Some(url) = &self.send_url {
            config = config.with_send_url(url)?;
        }
        if let Some(url) = &self.token_url {
            config = config.with_token_url(url)?;
        }
        if let Some(url) = &self.auth_url {
            config = config.with_auth_url(url)?;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.relay_config()?;
    let vault: Arc<dyn SecretStore> = Arc::new(KeyringStore::new(config.vault_user.clone()));
    debug!(identity = %config.identity(), "Using vault entry");

    if args.forget {
        return forget(&config, vault);
    }
    if args.status {
        return status(&config, vault);
    }
    if !args.sendmail_args.is_empty() {
        debug!(args = ?args.sendmail_args, "Ignoring sendmail arguments");
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!(
            "sendgmail reads the message from standard input. \
             Pipe a message into it or use it as git's sendemail.sendmailCmd."
        );
    }
    let message = RawMessage::from_reader(stdin.lock()).context("Failed to read message")?;
    info!(bytes = message.message_len(), "Read message");

    let terminal: Arc<dyn Terminal> = if args.non_interactive {
        Arc::new(Detached)
    } else {
        Arc::new(ConsoleTerminal::detect())
    };

    let mut relay = Relay::from_config(&config, vault, terminal);
    relay.send(&message).await?;
    Ok(())
}

/// Prints the state of the stored token without prompting.
fn status(config: &RelayConfig, vault: Arc<dyn SecretStore>) -> anyhow::Result<()> {
    let token = TokenStore::new(vault, config.identity()).load()?;
    let state = TokenState::of(token.as_ref(), Utc::now());

    match token {
        Some(token) if state == TokenState::Ready => {
            println!("{}: {state} (expires {})", config.identity(), token.expires_at());
        }
        _ => println!("{}: {state}", config.identity()),
    }
    Ok(())
}

/// Deletes the stored token.
fn forget(config: &RelayConfig, vault: Arc<dyn SecretStore>) -> anyhow::Result<()> {
    if TokenStore::new(vault, config.identity()).delete()? {
        println!("Removed stored credentials for {}", config.identity());
    } else {
        println!("No stored credentials for {}", config.identity());
    }
    Ok(())
}

/// One line describing why the run failed.
fn report(error: &anyhow::Error) -> String {
    match error.downcast_ref::<sendgmail_core::Error>() {
        Some(sendgmail_core::Error::TokenRefreshFailed(failure))
            if failure.detail.code() == Some("invalid_grant") =>
        {
            format!("{error} Run sendgmail --forget and send again to authorize anew.")
        }
        Some(_) => error.to_string(),
        None => format!("{error:#}"),
    }
}
