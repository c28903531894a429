//! Background sweep loop — wakes at every minute boundary.
//!
//! Pattern: spawn task → sleep to the next minute → run one sweep →
//! repeat, with a oneshot shutdown channel so the server can stop the
//! loop gracefully.

use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use chrono_tz::Tz;
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::clock::{Clock, SweepInstant};
use super::sweep::{run_sweep, SweepContext};

/// Handle to the running sweep loop.
pub struct SweepLoopHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl SweepLoopHandle {
    /// Signal the loop to stop after its current iteration.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Sweep loop shutdown signal sent");
        }
    }
}

impl Drop for SweepLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// How long until the next minute boundary, from the given clock.
fn until_next_minute(clock: &dyn Clock) -> Duration {
    let now = clock.now_utc();
    let into_minute = u64::from(now.second()) * 1000 + u64::from(now.timestamp_subsec_millis());
    Duration::from_millis(60_000u64.saturating_sub(into_minute).max(1))
}

/// Spawn the minute sweep loop on its own connection.
///
/// The loop owns its connection outright; it never contends with
/// request handlers for one. A failed sweep is logged and the loop
/// carries on — the next minute gets a fresh attempt.
pub fn start_sweep_loop(
    mut conn: Connection,
    ctx: SweepContext,
    clock: Arc<dyn Clock>,
    timezone: Tz,
) -> SweepLoopHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        tracing::info!(%timezone, "Reminder sweep loop started");
        loop {
            let wait = until_next_minute(clock.as_ref());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown_rx => {
                    tracing::info!("Reminder sweep loop stopped");
                    return;
                }
            }

            let at = SweepInstant::from_utc(clock.now_utc(), timezone);
            if let Err(e) = run_sweep(&mut conn, &ctx, &at).await {
                tracing::error!(minute = %at.minute, "Sweep failed: {e}");
            }
        }
    });

    SweepLoopHandle { shutdown_tx: Some(shutdown_tx) }
}
