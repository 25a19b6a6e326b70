//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User credential record stored in Firestore.
///
/// One document per authenticated channel owner, keyed by `id`. Holds the
/// Google identity plus the current OAuth token pair for the YouTube API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Process-assigned opaque ID (also used as document ID)
    pub id: String,
    /// Google account ID (unique, one-to-one with `id`)
    pub google_id: String,
    /// Email address (unique)
    pub email: String,
    /// Display name
    pub name: String,
    /// Current short-lived bearer token for the YouTube API
    pub access_token: String,
    /// Long-lived token used to mint new access tokens.
    /// Only present if Google issued one; once set, never cleared.
    pub refresh_token: Option<String>,
    /// When the user first connected (RFC 3339)
    pub created_at: String,
    /// Last credential update (RFC 3339)
    pub updated_at: String,
}

/// Public profile view returned by `/auth/me`.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}
