//! Error bodies returned by Google endpoints.
//!
//! Both the OAuth token endpoint and the Gmail API describe failures in a
//! JSON body, but at different paths. [`ErrorDetail::parse`] extracts the
//! human-readable message and the machine code from either shape and
//! degrades gracefully when the body is not what it should be.

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::fmt;

/// JSON pointers to the message and code inside an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPaths {
    /// Pointer to the human-readable message.
    pub message: &'static str,
    /// Pointer to the machine-readable error code.
    pub code: &'static str,
}

impl ErrorPaths {
    /// RFC 6749 token endpoint errors: `{"error": ..., "error_description": ...}`.
    pub const OAUTH: Self = Self {
        message: "/error_description",
        code: "/error",
    };

    /// Google API errors: `{"error": {"message": ..., "errors": [{"reason": ...}]}}`.
    pub const GOOGLE_API: Self = Self {
        message: "/error/message",
        code: "/error/errors/0/reason",
    };
}

/// What could be learned from an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    /// A JSON body; either field may be missing.
    Reported {
        /// Human-readable message.
        message: Option<String>,
        /// Machine-readable code (e.g. `invalid_grant`).
        code: Option<String>,
    },
    /// The body was not JSON.
    UnexpectedType(String),
    /// The body claimed to be JSON but could not be parsed.
    Unreadable,
}

impl ErrorDetail {
    /// Extracts the error detail from a response body.
    ///
    /// A missing content type is treated as JSON.
    #[must_use]
    pub fn parse(content_type: Option<&str>, body: &[u8], paths: ErrorPaths) -> Self {
        if let Some(mime) = content_type.map(essence)
            && !mime.eq_ignore_ascii_case("application/json")
        {
            return Self::UnexpectedType(mime.to_string());
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(json) => Self::Reported {
                message: json.pointer(paths.message).and_then(value_text),
                code: json.pointer(paths.code).and_then(value_text),
            },
            Err(_) => Self::Unreadable,
        }
    }

    /// Machine-readable error code, if one was reported.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Reported { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the body could not be parsed.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Unreadable)
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reported { message, code } => {
                f.write_str(message.as_deref().unwrap_or("unexpected error"))?;
                if let Some(code) = code {
                    write!(f, " (code '{code}')")?;
                }
                Ok(())
            }
            Self::UnexpectedType(mime) => write!(f, "unexpected error of type {mime}"),
            Self::Unreadable => f.write_str("unreadable error"),
        }
    }
}

/// Media type without parameters.
fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// Text of a JSON value; `null` counts as absent.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A request that a Google endpoint answered with a non-success status.
#[derive(Debug, Clone)]
pub struct EndpointFailure {
    /// Service name shown to the user (e.g. "Google").
    pub service: String,
    /// What was being attempted (e.g. "token refresh").
    pub action: &'static str,
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Detail extracted from the response body.
    pub detail: ErrorDetail,
}

impl EndpointFailure {
    /// Reads the body of a failed response.
    ///
    /// A body that cannot be read is reported as [`ErrorDetail::Unreadable`].
    pub async fn from_response(
        service: impl Into<String>,
        action: &'static str,
        response: reqwest::Response,
        paths: ErrorPaths,
    ) -> Self {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let detail = match response.bytes().await {
            Ok(body) => ErrorDetail::parse(content_type.as_deref(), &body, paths),
            Err(_) => ErrorDetail::Unreadable,
        };

        Self {
            service: service.into(),
            action,
            status,
            detail,
        }
    }

    /// Returns true for HTTP 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} returned {} with status code {}.",
            self.service, self.action, self.detail, self.status
        )
    }
}
