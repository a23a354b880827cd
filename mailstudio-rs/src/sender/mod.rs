//! Outbound mail delivery
//!
//! Providers declare a type and carry a string-encoded config blob; the
//! blob is only parsed here, at send time, against the shape the declared
//! type expects. SMTP delivers through `lettre`; SendGrid goes through its
//! HTTP API. Mailgun and SES configs parse but have no transport yet.

pub mod sendgrid;
pub mod smtp;

use crate::error::{Result, StudioError};
use crate::models::{EmailProvider, ProviderType};
use serde::Deserialize;

pub use sendgrid::SendgridMailer;
pub use smtp::SmtpMailer;

/// Connection parameters for an SMTP provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpParams {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub auth: SmtpAuth,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpAuth {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}

/// Connection parameters for API-key providers (SendGrid, Mailgun, SES).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyParams {
    pub api_key: String,
}

/// One outbound message. The body is the already-rendered HTML of an
/// authored email.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// A ready-to-use transport built from a provider record.
pub enum Mailer {
    Smtp(SmtpMailer),
    Sendgrid(SendgridMailer),
}

impl Mailer {
    pub fn from_provider(provider: &EmailProvider) -> Result<Self> {
        match provider.provider_type {
            ProviderType::Smtp => {
                let params: SmtpParams = parse_config(provider)?;
                Ok(Mailer::Smtp(SmtpMailer::new(
                    &params,
                    &provider.sender_email,
                )?))
            }
            ProviderType::Sendgrid => {
                let params: ApiKeyParams = parse_config(provider)?;
                Ok(Mailer::Sendgrid(SendgridMailer::new(
                    params.api_key,
                    provider.sender_email.clone(),
                )))
            }
            ProviderType::Mailgun | ProviderType::AwsSes => {
                // Config shape is validated even though delivery is not
                // wired up for these types yet.
                let _params: ApiKeyParams = parse_config(provider)?;
                Err(StudioError::Transport(format!(
                    "no transport implementation for provider type {:?}",
                    provider.provider_type
                )))
            }
        }
    }

    /// Live connection probe against the provider's service.
    pub async fn verify(&self) -> Result<()> {
        match self {
            Mailer::Smtp(mailer) => mailer.verify().await,
            Mailer::Sendgrid(mailer) => mailer.verify().await,
        }
    }

    /// Deliver one message; returns the message id.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<String> {
        match self {
            Mailer::Smtp(mailer) => mailer.send(message).await,
            Mailer::Sendgrid(mailer) => mailer.send(message).await,
        }
    }
}

fn parse_config<T: serde::de::DeserializeOwned>(provider: &EmailProvider) -> Result<T> {
    serde_json::from_str(&provider.config).map_err(|e| {
        StudioError::Parse(format!(
            "invalid config for provider {}: {}",
            provider.name, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn provider(provider_type: ProviderType, config: &str) -> EmailProvider {
        EmailProvider {
            id: "p1".to_string(),
            name: "test".to_string(),
            provider_type,
            config: config.to_string(),
            sender_email: "noreply@example.com".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn smtp_config_parses_with_optional_fields_defaulted() {
        let p = provider(
            ProviderType::Smtp,
            r#"{"host":"smtp.example.com","port":587}"#,
        );
        let params: SmtpParams = parse_config(&p).unwrap();
        assert_eq!(params.host, "smtp.example.com");
        assert_eq!(params.port, 587);
        assert!(!params.secure);
        assert!(params.auth.user.is_empty());
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let p = provider(ProviderType::Smtp, "not json");
        assert!(matches!(
            Mailer::from_provider(&p),
            Err(StudioError::Parse(_))
        ));
    }

    #[test]
    fn unimplemented_types_fail_with_transport_error() {
        let p = provider(ProviderType::Mailgun, r#"{"apiKey":"key-123"}"#);
        assert!(matches!(
            Mailer::from_provider(&p),
            Err(StudioError::Transport(_))
        ));
    }

    #[test]
    fn declared_type_decides_the_expected_config_shape() {
        // An SMTP-shaped config on a SendGrid provider fails at parse
        // time, not at storage time.
        let p = provider(
            ProviderType::Sendgrid,
            r#"{"host":"smtp.example.com","port":587}"#,
        );
        assert!(matches!(
            Mailer::from_provider(&p),
            Err(StudioError::Parse(_))
        ));
    }
}
