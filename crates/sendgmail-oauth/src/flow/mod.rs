//! Token endpoint client.

mod code;

use crate::api_error::{EndpointFailure, ErrorPaths};
use crate::error::Result;
use crate::provider::Provider;
use crate::token::{Token, TokenResponse};
use reqwest::Client;
use tracing::debug;

/// Action name for the authorization-code exchange.
pub const TOKEN_REQUEST: &str = "token request";

/// Action name for the refresh-token grant.
pub const TOKEN_REFRESH: &str = "token refresh";

/// `OAuth2` client for one provider.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            http_client: Client::new(),
        }
    }

    /// Uses an existing HTTP client (shared connection pool).
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Refreshes an access token using the token's refresh token.
    ///
    /// The returned token keeps the client credentials and, when the server
    /// does not send a new one, the refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRefreshToken`](crate::Error::NoRefreshToken) if the
    /// token has none, [`Error::Endpoint`](crate::Error::Endpoint) if the
    /// server rejects the refresh, or a transport error.
    pub async fn refresh(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = self.request_token(TOKEN_REFRESH, &params).await?;
        Ok(token.with_refresh(response))
    }

    /// Posts a form to the token endpoint.
    async fn request_token(&self, action: &'static str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        debug!(action, url = %self.provider.token_url, "Calling token endpoint");

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let failure =
                EndpointFailure::from_response(&self.provider.name, action, response, ErrorPaths::OAUTH)
                    .await;
            debug!(action, status = %failure.status, code = ?failure.detail.code(), "Token endpoint refused");
            return Err(failure.into());
        }

        Ok(response.json().await?)
    }
}
