// SPDX-License-Identifier: MIT

//! RepliX: reply to your YouTube channel's comments with AI-drafted help.
//!
//! This crate provides the backend API: Google OAuth sign-in, channel video
//! and comment listing, comment/reply posting, and AI reply generation plus
//! bulk sentiment categorization.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;

use config::Config;
use db::FirestoreDb;
use services::{AiService, GoogleOAuthService, YouTubeService};
use session::SessionStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub sessions: SessionStore,
    pub oauth: GoogleOAuthService,
    pub youtube: YouTubeService,
    pub ai: AiService,
}
