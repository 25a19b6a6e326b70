// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod comment;
pub mod user;
pub mod video;

pub use comment::{CommentSummary, Sentiment};
pub use user::User;
pub use video::VideoSummary;
