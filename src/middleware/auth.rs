// SPDX-License-Identifier: MIT

//! Session authentication middleware.

use crate::error::AppError;
use crate::session::SESSION_COOKIE;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticated user extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires a resolvable session.
///
/// Rejects with 401 before the handler runs any other work. A successful
/// resolve rolls the session's expiry forward.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let user_id = state
        .sessions
        .resolve_session(&session_id)
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
