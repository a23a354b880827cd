//! SendGrid delivery through the v3 HTTP API.

use crate::error::{Result, StudioError};
use crate::sender::OutgoingMessage;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

const API_BASE: &str = "https://api.sendgrid.com/v3";

pub struct SendgridMailer {
    http: reqwest::Client,
    api_key: String,
    sender: String,
}

impl SendgridMailer {
    pub fn new(api_key: String, sender: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            sender,
        }
    }

    /// The scopes endpoint doubles as a cheap credential probe.
    pub async fn verify(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/scopes", API_BASE))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StudioError::Transport(format!(
                "SendGrid credential check failed: {}",
                response.status()
            )))
        }
    }

    pub async fn send(&self, message: &OutgoingMessage) -> Result<String> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.sender },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }]
        });

        let response = self
            .http
            .post(format!("{}/mail/send", API_BASE))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(StudioError::Transport(format!(
                "SendGrid send failed: {} {}",
                status, detail
            )));
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(to = %message.to, "sent mail via SendGrid");
        Ok(message_id)
    }
}
