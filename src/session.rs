// SPDX-License-Identifier: MIT

//! Server-side session store.
//!
//! Maps opaque session IDs (delivered to the browser in a cookie) to user IDs
//! with a rolling expiry. Sessions live in process memory; an expired or
//! unknown ID resolves to no user, and destroying an unknown session is a
//! no-op.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

use crate::error::AppError;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "replix_sid";

/// Entropy of a session ID in bytes.
const SESSION_ID_BYTES: usize = 32;

/// A single authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// In-process session store shared across requests.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    rng: SystemRandom,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store whose sessions expire `ttl_secs` after last activity.
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Generate a random URL-safe identifier.
    pub fn generate_id(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Create a session for the given user and return its ID.
    pub fn create_session(&self, user_id: &str) -> Result<String, AppError> {
        let session_id = self.generate_id()?;
        self.sessions.insert(
            session_id.clone(),
            Session {
                user_id: user_id.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(session_id)
    }

    /// Resolve a session ID to its user ID.
    ///
    /// Returns `None` for unknown, malformed, or expired IDs. A successful
    /// resolve extends the session's expiry (rolling).
    pub fn resolve_session(&self, session_id: &str) -> Option<String> {
        let now = Utc::now();

        // The shard lock must be released before `remove`, so the expired
        // path falls through instead of removing inside the match.
        let expired = match self.sessions.get_mut(session_id) {
            Some(mut session) => {
                if session.expires_at > now {
                    session.expires_at = now + self.ttl;
                    return Some(session.user_id.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.sessions.remove(session_id);
        }
        None
    }

    /// Destroy a session. Destroying an unknown session is a no-op.
    pub fn destroy_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Remove all expired sessions; returns how many were evicted.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        before - self.sessions.len()
    }

    /// Number of live session records (including not-yet-purged expired ones).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
