//! Relays an encoded message to the mail-send endpoint.

use crate::account::{SecretStore, TokenStore};
use crate::auth::TokenManager;
use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::terminal::{Terminal, offer_retry};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use sendgmail_mime::RawMessage;
use sendgmail_oauth::{EndpointFailure, ErrorPaths, OAuthClient};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Action name for the send call.
pub const SEND_EMAIL_REQUEST: &str = "send email request";

/// How many times a rejected access token may be refreshed and the send
/// repeated within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    /// Allows `retries` forced refreshes.
    #[must_use]
    pub const fn new(retries: u32) -> Self {
        Self { remaining: retries }
    }

    /// Takes one retry from the budget. Returns false if none is left.
    pub const fn try_spend(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Retries left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Default for RetryBudget {
    /// One forced refresh per run.
    fn default() -> Self {
        Self::new(1)
    }
}

/// Sends messages with a valid bearer token.
///
/// A 401 from the send endpoint spends one unit of the [`RetryBudget`]:
/// the access token is discarded, refreshed and the send repeated. Any
/// other refusal is shown to the user, who may ask to send again; without
/// interactive input it is final.
pub struct Relay {
    tokens: TokenManager,
    terminal: Arc<dyn Terminal>,
    send_url: Url,
    service: String,
    http_client: Client,
}

impl Relay {
    /// Builds a relay from configuration.
    ///
    /// The token endpoint and the send endpoint share one HTTP client.
    #[must_use]
    pub fn from_config(
        config: &RelayConfig,
        vault: Arc<dyn SecretStore>,
        terminal: Arc<dyn Terminal>,
    ) -> Self {
        let http_client = Client::new();
        let oauth = OAuthClient::new(config.provider.clone()).with_http_client(http_client.clone());
        let store = TokenStore::new(vault, config.identity());
        let tokens = TokenManager::new(oauth, store, Arc::clone(&terminal));

        Self {
            tokens,
            terminal,
            send_url: config.send_url.clone(),
            service: config.provider.name.clone(),
            http_client,
        }
    }

    /// Sends `message`, allowing one forced refresh on a 401.
    ///
    /// # Errors
    ///
    /// Returns an error if no access token can be obtained, the transport
    /// fails, or the endpoint refuses the message for good.
    pub async fn send(&mut self, message: &RawMessage) -> Result<()> {
        self.send_with_budget(message, &mut RetryBudget::default()).await
    }

    /// Sends `message`, spending `budget` on 401 responses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SendUnauthorized`] on a 401 once the budget is spent,
    /// [`Error::SendFailed`] on any other refusal that is not retried, and
    /// token or transport errors as they occur.
    pub async fn send_with_budget(
        &mut self,
        message: &RawMessage,
        budget: &mut RetryBudget,
    ) -> Result<()> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let access_token = self.tokens.valid_access_token().await?;

            debug!(attempt, bytes = message.message_len(), "Sending message");
            let response = self
                .http_client
                .post(self.send_url.clone())
                .header(CONTENT_TYPE, "application/json")
                .bearer_auth(&access_token)
                .body(message.body())
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                info!(attempt, %status, "Message accepted");
                return Ok(());
            }

            let failure = EndpointFailure::from_response(
                &self.service,
                SEND_EMAIL_REQUEST,
                response,
                ErrorPaths::GOOGLE_API,
            )
            .await;

            if failure.is_unauthorized() {
                if budget.try_spend() {
                    warn!("Access token rejected, refreshing and sending again");
                    self.tokens.force_expire();
                    continue;
                }
                return Err(Error::SendUnauthorized(failure));
            }

            warn!("{failure}");
            if !offer_retry(self.terminal.as_ref(), &failure)? {
                return Err(Error::SendFailed(failure));
            }
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("tokens", &self.tokens)
            .field("send_url", &self.send_url)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget() {
        let mut budget = RetryBudget::default();
        assert_eq!(budget.remaining(), 1);
        assert!(budget.try_spend());
        assert!(!budget.try_spend());
        assert_eq!(budget.remaining(), 0);

        assert!(!RetryBudget::new(0).try_spend());
    }
}
