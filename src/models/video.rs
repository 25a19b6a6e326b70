// SPDX-License-Identifier: MIT

//! Video summary model returned to the browser.

use serde::{Deserialize, Serialize};

/// Reduced view of a channel upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    /// Medium-size thumbnail URL
    pub thumbnail: String,
    /// Publish time (RFC 3339)
    pub published_at: String,
}
