// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod ai;
pub mod google_oauth;
pub mod youtube;

pub use ai::{AiService, CategorizedComments};
pub use google_oauth::{GoogleOAuthService, OAuthError};
pub use youtube::{YouTubeClient, YouTubeService};
