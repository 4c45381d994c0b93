use reqwest::Client;
use serde_json::json;

/// Relays outgoing mail as a JSON POST to the configured mail gateway.
/// Delivery failures are logged and reported as `false`, never as an
/// error: account approval must not roll back because a mail bounced.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    gateway_url: Option<String>,
}

impl MailService {
    pub fn new(gateway_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            gateway_url,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str, html: Option<&str>) -> bool {
        let Some(url) = &self.gateway_url else {
            tracing::warn!("MAIL_GATEWAY_URL is not configured, dropping mail to {}", to);
            return false;
        };

        let payload = json!({
            "to": to,
            "subject": subject,
            "text": text,
            "html": html,
        });

        match self.client.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "mail gateway rejected message to {}", to);
                false
            }
            Err(err) => {
                tracing::warn!(error = ?err, "failed to reach mail gateway for {}", to);
                false
            }
        }
    }
}
