//! Time source abstraction for the sweep.
//!
//! Reminder times are wall-clock strings in the deployment timezone, so
//! every sweep converts "now" into a local date and an "HH:MM" minute
//! before touching the database.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::DoseSlot;

/// Source of the current instant. Production uses [`SystemClock`];
/// tests pin a fixed time.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One sweep's view of "now", already projected into the local zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepInstant {
    pub today: NaiveDate,
    /// Local wall-clock minute, "HH:MM".
    pub minute: String,
    /// The unprojected instant, used to stamp history rows.
    pub now_utc: DateTime<Utc>,
}

impl SweepInstant {
    pub fn from_utc(now: DateTime<Utc>, tz: Tz) -> Self {
        let local = now.with_timezone(&tz);
        Self {
            today: NaiveDate::from_ymd_opt(local.year(), local.month(), local.day())
                .unwrap_or_else(|| local.date_naive()),
            minute: format!("{:02}:{:02}", local.hour(), local.minute()),
            now_utc: now,
        }
    }

    /// Human label for this minute's dosing slot, used in notification
    /// copy. Minutes outside the four batch slots (manually created
    /// reminders) get a neutral label.
    pub fn slot_label(&self) -> &'static str {
        DoseSlot::from_dispatch_time(&self.minute)
            .map(|slot| slot.label())
            .unwrap_or("Scheduled")
    }
}
