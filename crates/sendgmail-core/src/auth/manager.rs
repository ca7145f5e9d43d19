//! Drives a token from stored credentials to a usable access token.

use super::TokenState;
use crate::account::TokenStore;
use crate::error::{Error, Result};
use crate::terminal::{Terminal, ask_secret, offer_retry};
use chrono::Utc;
use sendgmail_oauth::{EndpointFailure, OAuthClient, Token};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prompt for the OAuth client ID on first run.
const CLIENT_ID_PROMPT: &str = "Enter Client ID:\n(Hint: create an OAuth client of type \
    \"Desktop app\" for the Gmail API in the Google Cloud console if you haven't already.)";

/// Prompt for the OAuth client secret on first run.
const CLIENT_SECRET_PROMPT: &str = "Enter Client Secret:";

/// Server error codes meaning the user's authorization was not accepted.
const DENIED_CODES: [&str; 2] = ["access_denied", "invalid_grant"];

/// Outcome of one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The token moved to its next state.
    Advanced,
    /// The step failed and the user asked to run it again.
    Retry,
}

/// Owns the relay's token and every change made to it.
///
/// The manager holds the current [`Token`] value and is the only writer to
/// the [`TokenStore`]. Each transition produces a new token, persists it,
/// and replaces the held value with the persisted one.
pub struct TokenManager {
    client: OAuthClient,
    store: TokenStore,
    terminal: Arc<dyn Terminal>,
    token: Option<Token>,
}

impl TokenManager {
    /// Creates a manager; nothing is loaded until first use.
    #[must_use]
    pub fn new(client: OAuthClient, store: TokenStore, terminal: Arc<dyn Terminal>) -> Self {
        Self {
            client,
            store,
            terminal,
            token: None,
        }
    }

    /// Current state of the held token.
    #[must_use]
    pub fn state(&self) -> TokenState {
        TokenState::of(self.token.as_ref(), Utc::now())
    }

    /// The held token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Loads the stored token without prompting.
    ///
    /// Returns the resulting state; [`TokenState::Uninitialized`] means the
    /// vault has no entry yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault fails.
    pub fn load(&mut self) -> Result<TokenState> {
        self.token = self.store.load()?;
        Ok(self.state())
    }

    /// Returns an unexpired access token, authorizing or refreshing first if
    /// needed.
    ///
    /// May prompt for client credentials (first run) and for an
    /// authorization code (no refresh token yet). Every new token is
    /// persisted before it is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault fails, a prompt is needed but nobody can
    /// answer, or the token endpoint refuses and no retry is requested.
    pub async fn valid_access_token(&mut self) -> Result<String> {
        loop {
            match self.state() {
                TokenState::Uninitialized => {
                    if self.load()? == TokenState::Uninitialized {
                        self.enroll()?;
                    }
                }
                TokenState::NeedsAuthorization => {
                    self.authorize().await?;
                }
                TokenState::NeedsAccessToken => {
                    if self.refresh().await? == Step::Advanced {
                        return self.access_token();
                    }
                }
                TokenState::Ready => return self.access_token(),
            }
        }
    }

    /// Drops the held access token so the next
    /// [`valid_access_token`](Self::valid_access_token) refreshes it.
    ///
    /// The refresh token is kept and nothing is written to the vault.
    pub fn force_expire(&mut self) {
        if let Some(token) = &self.token {
            debug!("Discarding cached access token");
            self.token = Some(token.without_access_token());
        }
    }

    /// Asks for client credentials and stores them.
    fn enroll(&mut self) -> Result<()> {
        info!("No stored credentials for {}", self.store.identity());
        let client_id = ask_secret(self.terminal.as_ref(), CLIENT_ID_PROMPT)?;
        let client_secret = ask_secret(self.terminal.as_ref(), CLIENT_SECRET_PROMPT)?;
        self.persist(&Token::new(client_id, client_secret))
    }

    /// Exchanges a user-supplied authorization code for a token pair.
    async fn authorize(&mut self) -> Result<Step> {
        let token = self.current()?;
        let url = self.client.authorization_url(&token.client_id);
        let code = ask_secret(
            self.terminal.as_ref(),
            &format!("Go to {url}, authorize the application and enter the resulting authorization code:"),
        )?;

        match self.client.exchange_code(&token, &code).await {
            Ok(granted) => {
                self.persist(&granted)?;
                if !granted.has_refresh_token() {
                    warn!("Token endpoint granted no refresh token");
                    return Err(sendgmail_oauth::Error::InvalidResponse(
                        "authorization server did not grant a refresh token".into(),
                    )
                    .into());
                }
                info!("Authorization code exchanged");
                Ok(Step::Advanced)
            }
            Err(sendgmail_oauth::Error::Endpoint(failure)) => {
                warn!("{failure}");
                self.retry_or(failure, classify_exchange_failure)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Obtains a new access token with the refresh token.
    async fn refresh(&mut self) -> Result<Step> {
        let token = self.current()?;

        match self.client.refresh(&token).await {
            Ok(refreshed) => {
                info!("Access token refreshed");
                self.persist(&refreshed)?;
                Ok(Step::Advanced)
            }
            Err(sendgmail_oauth::Error::Endpoint(failure)) => {
                warn!("{failure}");
                self.retry_or(failure, Error::TokenRefreshFailed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn retry_or(&self, failure: EndpointFailure, fail: impl FnOnce(EndpointFailure) -> Error) -> Result<Step> {
        if offer_retry(self.terminal.as_ref(), &failure)? {
            debug!(action = failure.action, "Retrying at the user's request");
            Ok(Step::Retry)
        } else {
            Err(fail(failure))
        }
    }

    fn persist(&mut self, token: &Token) -> Result<()> {
        self.token = Some(self.store.save(token)?);
        Ok(())
    }

    fn current(&self) -> Result<Token> {
        self.token
            .clone()
            .ok_or_else(|| Error::Config("token used before it was loaded".into()))
    }

    fn access_token(&self) -> Result<String> {
        self.token
            .as_ref()
            .and_then(|token| token.access_token.clone())
            .ok_or_else(|| {
                sendgmail_oauth::Error::InvalidResponse("no access token granted".into()).into()
            })
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("store", &self.store)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

fn classify_exchange_failure(failure: EndpointFailure) -> Error {
    if failure
        .detail
        .code()
        .is_some_and(|code| DENIED_CODES.contains(&code))
    {
        Error::AuthorizationDenied(failure)
    } else {
        Error::TokenExchangeFailed(failure)
    }
}
