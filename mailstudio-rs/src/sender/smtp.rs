//! SMTP delivery via lettre.

use crate::error::{Result, StudioError};
use crate::sender::{OutgoingMessage, SmtpParams};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::TlsParameters;
use lettre::transport::smtp::client::Tls;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;
use uuid::Uuid;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpMailer {
    /// `secure` selects implicit TLS; otherwise TLS is used when the
    /// server offers STARTTLS.
    pub fn new(params: &SmtpParams, sender: &str) -> Result<Self> {
        let mut builder = if params.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&params.host)
                .map_err(|e| StudioError::Transport(e.to_string()))?
        } else {
            let tls = TlsParameters::new(params.host.clone())
                .map_err(|e| StudioError::Transport(e.to_string()))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&params.host)
                .tls(Tls::Opportunistic(tls))
        };

        builder = builder.port(params.port);

        if !params.auth.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                params.auth.user.clone(),
                params.auth.pass.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender: sender.to_string(),
        })
    }

    pub async fn verify(&self) -> Result<()> {
        let reachable = self
            .transport
            .test_connection()
            .await
            .map_err(|e| StudioError::Transport(e.to_string()))?;

        if reachable {
            Ok(())
        } else {
            Err(StudioError::Transport(
                "SMTP server rejected the connection test".to_string(),
            ))
        }
    }

    pub async fn send(&self, message: &OutgoingMessage) -> Result<String> {
        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|_| StudioError::Parse(format!("invalid sender address: {}", self.sender)))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| StudioError::Parse(format!("invalid recipient address: {}", message.to)))?;

        let message_id = format!("<{}@mailstudio>", Uuid::new_v4());

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())
            .map_err(|e| StudioError::Transport(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| StudioError::Transport(e.to_string()))?;

        info!(to = %message.to, "sent mail via SMTP");
        Ok(message_id)
    }
}
