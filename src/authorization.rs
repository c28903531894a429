//! Short-lived action tokens for out-of-band reminder responses.
//!
//! Every dispatched reminder carries a token that lets its push action
//! buttons mark the dose taken or missed without a logged-in session.
//! Tokens are single-use, expire after ten minutes, and are bound to
//! one user, one history record, and one purpose. Only the SHA-256
//! hash of the token is kept in memory; a restart invalidates all
//! outstanding tokens, which simply means those push buttons stop
//! working — the web UI path is unaffected.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Token lifetime (10 minutes).
const ACTION_TOKEN_TTL_SECS: u64 = 600;

/// What a token authorizes. One variant today; the purpose is stored
/// and checked so a future token kind cannot be replayed against the
/// status-update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPurpose {
    UpdateReminderStatus,
}

/// What a validated token proves about its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionClaims {
    pub user_id: Uuid,
    pub history_id: Uuid,
    pub purpose: ActionPurpose,
}

struct TokenEntry {
    claims: ActionClaims,
    expires: Instant,
}

/// In-memory store of outstanding action tokens, keyed by token hash.
pub struct ActionTokenStore {
    tokens: Mutex<HashMap<[u8; 32], TokenEntry>>,
    ttl: Duration,
}

impl ActionTokenStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(ACTION_TOKEN_TTL_SECS))
    }

    fn with_ttl(ttl: Duration) -> Self {
        Self { tokens: Mutex::new(HashMap::new()), ttl }
    }

    /// Mint a fresh token for one history record. Returns the plaintext
    /// token; only its hash is retained.
    pub fn mint(&self, user_id: Uuid, history_id: Uuid, purpose: ActionPurpose) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let entry = TokenEntry {
            claims: ActionClaims { user_id, history_id, purpose },
            expires: Instant::now() + self.ttl,
        };

        let mut tokens = self.tokens.lock().unwrap();
        // Opportunistic cleanup keeps the map bounded by the dispatch
        // rate rather than by uptime.
        let now = Instant::now();
        tokens.retain(|_, e| e.expires > now);
        tokens.insert(hash_token(&token), entry);

        token
    }

    /// Validate a presented token and consume it. Returns the claims on
    /// success; expired, unknown, wrong-purpose, and already-used tokens
    /// all fail identically.
    pub fn validate_and_consume(
        &self,
        token: &str,
        purpose: ActionPurpose,
    ) -> Option<ActionClaims> {
        let hash = hash_token(token);
        let mut tokens = self.tokens.lock().unwrap();
        let entry = tokens.remove(&hash)?;

        if entry.expires <= Instant::now() || entry.claims.purpose != purpose {
            return None;
        }
        Some(entry.claims)
    }
}

impl Default for ActionTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}
