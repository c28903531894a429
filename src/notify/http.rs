//! HTTP-backed [`Notifier`] talking to external provider endpoints.

use async_trait::async_trait;
use serde_json::json;

use super::{Notifier, NotifyError, PushContext, WhatsAppVars};

/// Sends each channel's payload to a configured provider URL. A channel
/// with no URL configured fails with [`NotifyError::NotConfigured`]
/// rather than being silently skipped, so misconfiguration shows up in
/// the dispatch outcome.
pub struct HttpNotifier {
    client: reqwest::Client,
    push_url: Option<String>,
    email_url: Option<String>,
    whatsapp_url: Option<String>,
}

impl HttpNotifier {
    pub fn new(
        push_url: Option<String>,
        email_url: Option<String>,
        whatsapp_url: Option<String>,
    ) -> Self {
        Self { client: reqwest::Client::new(), push_url, email_url, whatsapp_url }
    }

    async fn post_json(
        &self,
        channel: &'static str,
        url: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError::Provider { channel, status: status.as_u16(), detail });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_push(
        &self,
        token: &str,
        title: &str,
        body: &str,
        context: &PushContext,
    ) -> Result<(), NotifyError> {
        let url = self.push_url.as_deref().ok_or(NotifyError::NotConfigured("push"))?;
        self.post_json(
            "push",
            url,
            json!({
                "token": token,
                "title": title,
                "body": body,
                "data": context,
            }),
        )
        .await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = self.email_url.as_deref().ok_or(NotifyError::NotConfigured("email"))?;
        self.post_json(
            "email",
            url,
            json!({
                "to": to,
                "subject": subject,
                "body": body,
            }),
        )
        .await
    }

    async fn send_whatsapp(&self, to: &str, vars: &WhatsAppVars) -> Result<(), NotifyError> {
        let url = self.whatsapp_url.as_deref().ok_or(NotifyError::NotConfigured("whatsapp"))?;
        self.post_json(
            "whatsapp",
            url,
            json!({
                "to": to,
                "variables": vars,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_channel_is_an_error() {
        let notifier = HttpNotifier::new(None, None, None);
        let context = PushContext { history_id: "h".into(), action_token: "t".into() };
        let err = notifier.send_push("tok", "t", "b", &context).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured("push")));

        let err = notifier.send_email("a@b.c", "s", "b").await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured("email")));
    }
}
