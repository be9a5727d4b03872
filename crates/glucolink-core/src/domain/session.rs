//! Upstream authentication session
//!
//! This module defines the [`AuthTicket`] issued by a LibreLink Up login and
//! the [`AuthSession`] that owns the single live ticket of a running relay.
//!
//! ## Lifecycle
//!
//! ```text
//! empty ──establish()──→ valid ──(now >= expires)──→ expired
//!   ↑                      │                            │
//!   └──────invalidate()────┴────────invalidate()────────┘
//! ```
//!
//! The session does no locking of its own; the sync engine keeps it behind
//! a mutex so only one tick touches it at a time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Authentication ticket returned by a successful upstream login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTicket {
    /// Opaque bearer token
    pub token: String,
    /// Expiry as Unix timestamp (seconds)
    pub expires: i64,
    /// Ticket lifetime in milliseconds (informational)
    pub duration: i64,
}

impl AuthTicket {
    /// Creates a new ticket
    pub fn new(token: impl Into<String>, expires: i64, duration: i64) -> Self {
        Self {
            token: token.into(),
            expires,
            duration,
        }
    }

    /// Returns true if the token is non-empty and `now` is before expiry
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.token.is_empty() && now < self.expires
    }
}

/// Credentials attached to every authenticated upstream request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Bearer token from the live ticket
    pub bearer_token: String,
    /// Hex SHA-256 of the logged-in user id, when known
    pub account_id_hash: Option<String>,
}

/// Holder of the current upstream ticket and derived identity
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    ticket: Option<AuthTicket>,
    account_id: Option<String>,
}

impl AuthSession {
    /// Creates an empty (invalid) session
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a ticket is held and has not expired yet
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }

    /// Validity check against an explicit clock reading (Unix seconds)
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.ticket
            .as_ref()
            .map(|t| t.is_valid_at(now))
            .unwrap_or(false)
    }

    /// Drops the ticket and the account identity. Never fails.
    pub fn invalidate(&mut self) {
        self.ticket = None;
        self.account_id = None;
    }

    /// Stores a freshly issued ticket together with the account's user id
    pub fn establish(&mut self, ticket: AuthTicket, account_id: impl Into<String>) {
        self.ticket = Some(ticket);
        self.account_id = Some(account_id.into()).filter(|id: &String| !id.is_empty());
    }

    /// Returns the held ticket, if any
    pub fn ticket(&self) -> Option<&AuthTicket> {
        self.ticket.as_ref()
    }

    /// Returns the raw account (user) id, if any
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Headers for an authenticated request, or `None` without a usable token
    pub fn auth_headers(&self) -> Option<AuthHeaders> {
        let ticket = self.ticket.as_ref().filter(|t| !t.token.is_empty())?;
        Some(AuthHeaders {
            bearer_token: ticket.token.clone(),
            account_id_hash: self.account_id.as_deref().map(hash_account_id),
        })
    }
}

/// Hex-encoded SHA-256 digest of an account id
pub fn hash_account_id(account_id: &str) -> String {
    format!("{:x}", Sha256::digest(account_id.as_bytes()))
}
