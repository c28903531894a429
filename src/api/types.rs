//! Shared types for the HTTP API layer.

use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::api::error::ApiError;
use crate::authorization::ActionTokenStore;
use crate::db::sqlite::open_database;
use crate::models::User;
use crate::notify::Notifier;
use crate::ocr::OcrClient;
use crate::reference::ReferenceData;

/// Shared state for the API router.
///
/// Middleware accesses it via `Extension<ApiContext>` (injected as the
/// outermost layer); endpoint handlers via `State<ApiContext>`.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
    pub reference: Arc<ReferenceData>,
    pub tokens: Arc<ActionTokenStore>,
    pub notifier: Arc<dyn Notifier>,
    pub ocr: Arc<Option<OcrClient>>,
    pub timezone: Tz,
    pub cron_secret: Option<String>,
}

impl ApiContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_path: PathBuf,
        reference: Arc<ReferenceData>,
        tokens: Arc<ActionTokenStore>,
        notifier: Arc<dyn Notifier>,
        ocr: Option<OcrClient>,
        timezone: Tz,
        cron_secret: Option<String>,
    ) -> Self {
        Self {
            db_path: Arc::new(db_path),
            reference,
            tokens,
            notifier,
            ocr: Arc::new(ocr),
            timezone,
            cron_secret,
        }
    }

    /// Open a connection for the current request. Connections are
    /// per-request; the WAL journal lets them coexist with the sweep
    /// loop's own connection.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(open_database(&self.db_path)?)
    }
}

/// The authenticated user behind a request, injected into request
/// extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
}

/// Hash a bearer token to the hex digest stored in `users.api_token_hash`.
pub fn hash_token_hex(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
