//! Sending messages.
//!
//! This module ties the token lifecycle to the Gmail API send call.

pub mod relay;

pub use relay::{Relay, RetryBudget, SEND_EMAIL_REQUEST};
