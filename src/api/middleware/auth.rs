//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves its hash against
//! the users table, and injects [`Principal`] into request extensions
//! for downstream handlers.

use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{hash_token_hex, ApiContext, Principal};
use crate::db::repository::user as user_repo;
use crate::models::User;

/// Require a valid bearer token. On success the request carries a
/// `Principal` extension.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let user = authenticate_bearer(&ctx, req.headers())?;
    req.extensions_mut().insert(Principal { user });

    Ok(next.run(req).await)
}

/// Resolve the bearer token in `headers` to a user. Shared with the
/// history-update handler, which accepts either a session or an action
/// token and therefore sits outside this middleware.
pub fn authenticate_bearer(ctx: &ApiContext, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let conn = ctx.open_db()?;
    user_repo::find_user_by_token_hash(&conn, &hash_token_hex(token))?
        .ok_or(ApiError::Unauthorized)
}
