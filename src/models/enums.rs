use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(ReminderStatus {
    Active => "active",
    Expired => "expired",
});

str_enum!(HistoryStatus {
    Pending => "pending",
    Sent => "sent",
    Taken => "taken",
    Missed => "missed",
    Failed => "failed",
});

/// Which channels a user wants reminder delivery on (push is driven by
/// the presence of a push token, not by this preference).
str_enum!(NotifyBy {
    Email => "email",
    Whatsapp => "whatsapp",
    Both => "both",
});

/// Channel(s) actually used for a history row's dispatch attempt.
str_enum!(NotificationMethod {
    Email => "email",
    Whatsapp => "whatsapp",
    Both => "both",
    Push => "push",
    None => "none",
});

/// One of the four fixed dosing slots a dash-pattern frequency encodes.
///
/// Serialized with its display label ("Morning", ...) since that is the
/// form prescriptions and interaction breakdowns expose to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DoseSlot {
    pub const ALL: [DoseSlot; 4] =
        [DoseSlot::Morning, DoseSlot::Afternoon, DoseSlot::Evening, DoseSlot::Night];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }

    /// The wall-clock minute a reminder for this slot fires at.
    pub fn dispatch_time(&self) -> &'static str {
        match self {
            Self::Morning => "08:00",
            Self::Afternoon => "13:00",
            Self::Evening => "18:00",
            Self::Night => "21:00",
        }
    }

    pub fn from_dispatch_time(time: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.dispatch_time() == time)
    }

    /// Index into a parsed 4-element frequency array.
    pub fn index(&self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Evening => 2,
            Self::Night => 3,
        }
    }
}
