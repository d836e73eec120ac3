//! Email dispatch for confirmation and recovery messages

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

/// Email service for confirmation and password-recovery messages
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Whether an SMTP relay is configured at all
    pub fn is_configured(&self) -> bool {
        !self.config.smtp_host.is_empty()
    }

    /// Send the registration confirmation message with its code link
    pub async fn send_confirmation(&self, to_email: &str, code: &str) -> Result<()> {
        let body = format!(
            r#"<h1>Confirm your email address</h1>
<p>Click the link below to finish registration:</p>
<div><a href="{base}/auth/confirm-registration?code={code}">Confirm registration</a></div>
<p>If this wasn't you, ignore this message.</p>"#,
            base = self.config.public_base_url,
            code = code,
        );
        self.send(to_email, "Email confirmation", body).await
    }

    /// Send the password-recovery message with its code link
    pub async fn send_recovery(&self, to_email: &str, code: &str) -> Result<()> {
        let body = format!(
            r#"<h1>Password recovery</h1>
<p>To finish password recovery follow the link below:</p>
<div><a href="{base}/auth/password-recovery?recoveryCode={code}">Recover password</a></div>
<p>If this wasn't you, ignore this message.</p>"#,
            base = self.config.public_base_url,
            code = code,
        );
        self.send(to_email, "Password recovery", body).await
    }

    async fn send(&self, to_email: &str, subject: &str, body: String) -> Result<()> {
        if !self.is_configured() {
            tracing::info!(to = to_email, subject, "SMTP not configured, skipping email");
            return Ok(());
        }

        let email = Message::builder()
            .from(self
                .config
                .from
                .parse()
                .map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(self.config.smtp_port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_service_skips_sending() {
        let service = EmailService::new(EmailConfig::default());
        assert!(!service.is_configured());

        // No relay configured: succeeds without network access
        service
            .send_confirmation("bob@example.com", "code-1")
            .await
            .expect("Skipped send should succeed");
        service
            .send_recovery("bob@example.com", "code-2")
            .await
            .expect("Skipped send should succeed");
    }
}
