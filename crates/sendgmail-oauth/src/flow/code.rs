//! Authorization Code Flow with an out-of-band redirect.
//!
//! The user opens the authorization URL in a browser, approves access and
//! pastes the code shown by the provider back into the terminal.

use super::{OAuthClient, TOKEN_REQUEST};
use crate::error::Result;
use crate::token::Token;
use url::Url;

impl OAuthClient {
    /// Builds the authorization URL for user consent.
    #[must_use]
    pub fn authorization_url(&self, client_id: &str) -> Url {
        let mut url = self.provider.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &self.provider.redirect_uri)
            .append_pair("scope", &self.provider.scopes.join(" "))
            .append_pair("response_type", "code");
        url
    }

    /// Exchanges an authorization code for an access/refresh token pair.
    ///
    /// The returned token keeps the client credentials of `token`. The
    /// server is expected to grant a refresh token; callers check
    /// [`Token::has_refresh_token`] before relying on one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`](crate::Error::Endpoint) if the server
    /// rejects the code, or a transport error.
    pub async fn exchange_code(&self, token: &Token, code: &str) -> Result<Token> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("redirect_uri", self.provider.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self.request_token(TOKEN_REQUEST, &params).await?;
        Ok(token.with_grant(response))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::flow::OAuthClient;
    use crate::provider::Provider;

    #[test]
    fn test_authorization_url() {
        let client = OAuthClient::new(Provider::google().unwrap());
        let url = client.authorization_url("test client");

        assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.as_str().contains("client_id=test+client"));
        assert!(url.as_str().contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
        assert!(
            url.as_str()
                .contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.send")
        );
        assert!(url.as_str().ends_with("response_type=code"));
    }
}
