//! # sendgmail-oauth
//!
//! `OAuth2` client for sending mail through the Gmail API.
//!
//! ## Features
//!
//! - **Authorization Code Flow**: out-of-band redirect, code pasted by the user
//! - **Token refresh**: keeps the refresh token and client credentials across grants
//! - **Error bodies**: message and code extraction for token and API errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use sendgmail_oauth::{OAuthClient, Provider, Token};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new(Provider::google()?);
//!     let token = Token::new("your_client_id", "your_secret");
//!
//!     println!("Visit: {}", client.authorization_url(&token.client_id));
//!     let token = client.exchange_code(&token, "code_from_browser").await?;
//!
//!     // Later, once the access token has expired
//!     let token = client.refresh(&token).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod api_error;
mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use api_error::{EndpointFailure, ErrorDetail, ErrorPaths};
pub use error::{Error, Result};
pub use flow::{OAuthClient, TOKEN_REFRESH, TOKEN_REQUEST};
pub use provider::Provider;
pub use token::{Token, TokenResponse};
