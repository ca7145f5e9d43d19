//! Shared fixtures for core integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use sendgmail_core::{MemoryStore, RelayConfig, Terminal};
use sendgmail_oauth::Token;
use serde_json::json;
use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "client-1.apps.googleusercontent.com";
pub const CLIENT_SECRET: &str = "client-secret-1";
pub const REFRESH_TOKEN: &str = "refresh-1";

/// Terminal that answers prompts from a script and records what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    interactive: bool,
    lines: Mutex<VecDeque<String>>,
    confirms: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedTerminal {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_lines(self, lines: &[&str]) -> Self {
        self.lines
            .lock()
            .unwrap()
            .extend(lines.iter().map(|line| (*line).to_string()));
        self
    }

    pub fn with_confirms(self, answers: &[bool]) -> Self {
        self.confirms.lock().unwrap().extend(answers);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_line(&self, prompt: &str) -> io::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.lines
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
    }
}

impl Terminal for ScriptedTerminal {
    fn has_interactive_input(&self) -> bool {
        self.interactive
    }

    fn prompt_masked(&self, prompt: &str) -> io::Result<String> {
        self.next_line(prompt)
    }

    fn prompt_line(&self, prompt: &str) -> io::Result<String> {
        self.next_line(prompt)
    }

    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.confirms.lock().unwrap().pop_front().unwrap_or(false))
    }
}

/// Gmail configuration pointed at the mock server.
pub fn config(server: &MockServer) -> RelayConfig {
    RelayConfig::gmail()
        .unwrap()
        .with_send_url(&format!("{}/send", server.uri()))
        .unwrap()
        .with_token_url(&format!("{}/token", server.uri()))
        .unwrap()
}

/// A token that went through the authorization-code exchange.
pub fn granted_token(access_token: &str, expires_in: i64) -> Token {
    Token {
        access_token: Some(access_token.to_string()),
        expires_in,
        refresh_token: Some(REFRESH_TOKEN.to_string()),
        scope: Some("https://www.googleapis.com/auth/gmail.send".to_string()),
        token_type: Some("Bearer".to_string()),
        ..Token::new(CLIENT_ID, CLIENT_SECRET)
    }
}

/// Puts `token` into the vault as if it had been written at `written`.
pub fn store(vault: &MemoryStore, config: &RelayConfig, token: &Token, written: DateTime<Utc>) {
    vault.insert(config.identity(), serde_json::to_vec(token).unwrap(), written);
}

/// Reads the token the vault holds for `config`.
pub fn stored(vault: &MemoryStore, config: &RelayConfig) -> Token {
    use sendgmail_core::SecretStore;

    let secret = vault.get(&config.identity()).unwrap().unwrap();
    let token: Token = serde_json::from_slice(&secret.payload).unwrap();
    token.with_issued_at(secret.last_written)
}

/// Token endpoint answering a refresh with `access_token`.
pub fn refresh_mock(access_token: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains(format!("refresh_token={REFRESH_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/gmail.send",
            "token_type": "Bearer"
        })))
}

/// A token holding client credentials only.
pub fn credentials_only() -> Token {
    Token::new(CLIENT_ID, CLIENT_SECRET)
}
