//! Application constants and environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;

/// Application-level constants
pub const APP_NAME: &str = "Dosera";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP API.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Reminder times are interpreted in this zone unless overridden.
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Get the application data directory
/// ~/Dosera/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Dosera")
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_path: PathBuf,
    /// Directory holding the medicine dictionary, alias, and
    /// interaction JSON files.
    pub reference_dir: PathBuf,
    pub timezone: Tz,
    pub ocr_url: Option<String>,
    pub push_url: Option<String>,
    pub email_url: Option<String>,
    pub whatsapp_url: Option<String>,
    /// Shared secret for the manual sweep trigger endpoint.
    pub cron_secret: Option<String>,
}

impl Config {
    /// Build configuration from environment variables, with sensible
    /// defaults for everything but the provider endpoints (which stay
    /// unset until configured — see `HttpNotifier`).
    pub fn from_env() -> Self {
        let timezone = std::env::var("DOSERA_TIMEZONE")
            .ok()
            .and_then(|name| match Tz::from_str(&name) {
                Ok(tz) => Some(tz),
                Err(_) => {
                    tracing::warn!(%name, "Unknown timezone, falling back to {DEFAULT_TIMEZONE}");
                    None
                }
            })
            .unwrap_or(chrono_tz::Asia::Kolkata);

        Self {
            bind_addr: std::env::var("DOSERA_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            database_path: std::env::var("DOSERA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| app_data_dir().join("dosera.db")),
            reference_dir: std::env::var("DOSERA_REFERENCE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            timezone,
            ocr_url: std::env::var("DOSERA_OCR_URL").ok(),
            push_url: std::env::var("DOSERA_PUSH_URL").ok(),
            email_url: std::env::var("DOSERA_EMAIL_URL").ok(),
            whatsapp_url: std::env::var("DOSERA_WHATSAPP_URL").ok(),
            cron_secret: std::env::var("DOSERA_CRON_SECRET").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Dosera"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn default_timezone_parses() {
        assert_eq!(Tz::from_str(DEFAULT_TIMEZONE).unwrap(), chrono_tz::Asia::Kolkata);
    }
}
