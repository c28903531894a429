//! Manual sweep trigger for external cron services.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::scheduler::{run_sweep, SweepContext, SweepInstant, SweepOutcome};

/// `POST /api/cron/sweep` — run one sweep now.
///
/// Guarded by the shared cron secret rather than a user session: the
/// caller is an external scheduler, not a person. With no secret
/// configured the endpoint is disabled outright.
pub async fn trigger(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<SweepOutcome>, ApiError> {
    let Some(expected) = &ctx.cron_secret else {
        return Err(ApiError::NotFound("Manual sweep is not enabled".into()));
    };
    let presented = headers
        .get("X-Cron-Secret")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if presented != expected {
        return Err(ApiError::Unauthorized);
    }

    let mut conn = ctx.open_db()?;
    let sweep_ctx =
        SweepContext { notifier: ctx.notifier.clone(), tokens: ctx.tokens.clone() };
    let at = SweepInstant::from_utc(Utc::now(), ctx.timezone);

    let outcome = run_sweep(&mut conn, &sweep_ctx, &at).await?;
    Ok(Json(outcome))
}
