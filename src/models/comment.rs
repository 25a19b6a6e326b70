// SPDX-License-Identifier: MIT

//! Comment summary model and sentiment labels.

use serde::{Deserialize, Serialize};

/// Sentiment label attached to a comment by bulk categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Reduced view of a top-level comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub id: String,
    pub author: String,
    /// Author profile image URL
    pub author_image: String,
    pub text: String,
    /// Publish time (RFC 3339)
    pub published_at: String,
    pub like_count: i64,
    /// Set by `/ai/categorize-comments`; absent on plain listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}
