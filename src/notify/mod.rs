//! Notification dispatch across push / WhatsApp / email channels.
//!
//! The scheduler only depends on the [`Notifier`] contract; concrete
//! transports (FCM-style push, a mail API, a WhatsApp provider) are
//! external collaborators reached over HTTP in [`http::HttpNotifier`].

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NotificationMethod, NotifyBy, Reminder, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Push,
    Email,
    Whatsapp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{channel} provider rejected the request ({status}): {detail}")]
    Provider {
        channel: &'static str,
        status: u16,
        detail: String,
    },

    #[error("No {0} endpoint configured")]
    NotConfigured(&'static str),
}

/// Context attached to a push notification so its action buttons can
/// report taken/missed back without a browser session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PushContext {
    pub history_id: String,
    pub action_token: String,
}

/// Template variables for the WhatsApp reminder message.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WhatsAppVars {
    pub user_name: String,
    pub medicine_name: String,
    pub dosage: String,
    pub slot: String,
}

/// Channel capability set the scheduler dispatches through.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_push(
        &self,
        token: &str,
        title: &str,
        body: &str,
        context: &PushContext,
    ) -> Result<(), NotifyError>;

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;

    async fn send_whatsapp(&self, to: &str, vars: &WhatsAppVars) -> Result<(), NotifyError>;
}

/// What a dispatch attempt produced, channel by channel.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub delivered: Vec<Channel>,
    pub failed: Vec<(Channel, NotifyError)>,
}

impl DispatchOutcome {
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }

    /// Collapse the delivered channel set into the history record's
    /// method field. Multiple successful channels are recorded as
    /// `both`; a channel that failed alongside a success is logged by
    /// the caller but gets no distinct status.
    pub fn method(&self) -> NotificationMethod {
        match self.delivered.as_slice() {
            [] => NotificationMethod::None,
            [Channel::Push] => NotificationMethod::Push,
            [Channel::Email] => NotificationMethod::Email,
            [Channel::Whatsapp] => NotificationMethod::Whatsapp,
            _ => NotificationMethod::Both,
        }
    }
}

/// Fan a reminder out to every channel the user's preferences select:
/// push whenever a token is registered, plus email and/or WhatsApp per
/// `notify_by`. Channel failures are collected, never propagated — one
/// provider outage must not abort the sweep.
pub async fn dispatch_reminder(
    notifier: &dyn Notifier,
    user: &User,
    reminder: &Reminder,
    slot_label: &str,
    push_context: &PushContext,
) -> DispatchOutcome {
    let title = format!("{slot_label} medication reminder");
    let body = format!("Time to take {} ({})", reminder.medicine_name, reminder.dosage);

    let mut outcome = DispatchOutcome { delivered: Vec::new(), failed: Vec::new() };

    if let Some(token) = &user.push_token {
        match notifier.send_push(token, &title, &body, push_context).await {
            Ok(()) => outcome.delivered.push(Channel::Push),
            Err(e) => outcome.failed.push((Channel::Push, e)),
        }
    }

    if matches!(user.notify_by, NotifyBy::Email | NotifyBy::Both) {
        match notifier.send_email(&user.email, &title, &body).await {
            Ok(()) => outcome.delivered.push(Channel::Email),
            Err(e) => outcome.failed.push((Channel::Email, e)),
        }
    }

    if matches!(user.notify_by, NotifyBy::Whatsapp | NotifyBy::Both) {
        match &user.whatsapp_number {
            Some(number) => {
                let vars = WhatsAppVars {
                    user_name: user.given_name().to_string(),
                    medicine_name: reminder.medicine_name.clone(),
                    dosage: reminder.dosage.clone(),
                    slot: slot_label.to_string(),
                };
                match notifier.send_whatsapp(number, &vars).await {
                    Ok(()) => outcome.delivered.push(Channel::Whatsapp),
                    Err(e) => outcome.failed.push((Channel::Whatsapp, e)),
                }
            }
            None => {
                tracing::debug!(user = %user.id, "WhatsApp preferred but no number on file");
            }
        }
    }

    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Records calls and fails whole channels on demand.
    pub(crate) struct MockNotifier {
        pub fail_push: bool,
        pub fail_email: bool,
        pub fail_whatsapp: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockNotifier {
        pub(crate) fn reliable() -> Self {
            Self {
                fail_push: false,
                fail_email: false,
                fail_whatsapp: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, channel: &str, fail: bool) -> Result<(), NotifyError> {
            self.calls.lock().unwrap().push(channel.to_string());
            if fail {
                return Err(NotifyError::Provider {
                    channel: "push",
                    status: 503,
                    detail: "unavailable".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send_push(
            &self,
            _token: &str,
            _title: &str,
            _body: &str,
            _context: &PushContext,
        ) -> Result<(), NotifyError> {
            self.record("push", self.fail_push)
        }

        async fn send_email(
            &self,
            _to: &str,
            _subject: &str,
            _body: &str,
        ) -> Result<(), NotifyError> {
            self.record("email", self.fail_email)
        }

        async fn send_whatsapp(
            &self,
            _to: &str,
            _vars: &WhatsAppVars,
        ) -> Result<(), NotifyError> {
            self.record("whatsapp", self.fail_whatsapp)
        }
    }

    pub(crate) fn sample_user(notify_by: NotifyBy, push_token: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            whatsapp_number: Some("+919900112233".into()),
            push_token: push_token.map(String::from),
            notify_by,
            notifications_enabled: true,
            api_token_hash: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn sample_reminder(user_id: Uuid) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id,
            prescription_id: Uuid::new_v4(),
            medicine_name: "Paracetamol".into(),
            dosage: "500mg".into(),
            time: "08:00".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            notify_by: NotifyBy::Email,
            status: crate::models::ReminderStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn push_context() -> PushContext {
        PushContext { history_id: Uuid::new_v4().to_string(), action_token: "tok".into() }
    }

    #[tokio::test]
    async fn dispatches_every_selected_channel() {
        let notifier = MockNotifier::reliable();
        let user = sample_user(NotifyBy::Both, Some("fcm-1"));
        let reminder = sample_reminder(user.id);

        let outcome =
            dispatch_reminder(&notifier, &user, &reminder, "Morning", &push_context()).await;

        assert!(outcome.any_delivered());
        assert_eq!(outcome.method(), NotificationMethod::Both);
        assert_eq!(
            *notifier.calls.lock().unwrap(),
            vec!["push".to_string(), "email".into(), "whatsapp".into()]
        );
    }

    #[tokio::test]
    async fn single_channel_records_its_own_method() {
        let notifier = MockNotifier::reliable();
        let user = sample_user(NotifyBy::Email, None);
        let reminder = sample_reminder(user.id);

        let outcome =
            dispatch_reminder(&notifier, &user, &reminder, "Morning", &push_context()).await;
        assert_eq!(outcome.method(), NotificationMethod::Email);
    }

    #[tokio::test]
    async fn partial_failure_still_reports_success() {
        let mut notifier = MockNotifier::reliable();
        notifier.fail_email = true;
        let user = sample_user(NotifyBy::Email, Some("fcm-1"));
        let reminder = sample_reminder(user.id);

        let outcome =
            dispatch_reminder(&notifier, &user, &reminder, "Morning", &push_context()).await;
        assert!(outcome.any_delivered());
        assert_eq!(outcome.method(), NotificationMethod::Push);
        assert_eq!(outcome.failed.len(), 1);
    }

    #[tokio::test]
    async fn total_failure_reports_none() {
        let mut notifier = MockNotifier::reliable();
        notifier.fail_email = true;
        let user = sample_user(NotifyBy::Email, None);
        let reminder = sample_reminder(user.id);

        let outcome =
            dispatch_reminder(&notifier, &user, &reminder, "Morning", &push_context()).await;
        assert!(!outcome.any_delivered());
        assert_eq!(outcome.method(), NotificationMethod::None);
    }
}
