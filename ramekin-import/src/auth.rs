//! Per-run credentials sent to the remote platform.

use std::fmt;

use base64::Engine;

/// Value of the `Authorization` header for one import run.
///
/// Obtained once before listing and never refreshed: if the remote session
/// expires mid-run, the affected recipes fail like any other item error.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthToken {
    /// Token from a login exchange, sent as `Bearer <token>`.
    Bearer(String),
    /// Pre-encoded `username:password`, sent as `Basic <encoded>`.
    Basic(String),
}

impl AuthToken {
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthToken::Bearer(token.into())
    }

    pub fn basic(username: &str, password: &str) -> Self {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        AuthToken::Basic(encoded)
    }

    pub fn header_value(&self) -> String {
        match self {
            AuthToken::Bearer(token) => format!("Bearer {}", token),
            AuthToken::Basic(encoded) => format!("Basic {}", encoded),
        }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthToken::Bearer(_) => f.write_str("AuthToken::Bearer(<redacted>)"),
            AuthToken::Basic(_) => f.write_str("AuthToken::Basic(<redacted>)"),
        }
    }
}
