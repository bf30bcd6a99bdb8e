use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use mentorhub_common::AppError;
use crate::config::EmailConfig;

/// Transactional email. Every call site treats failures as non-fatal: the
/// triggering lifecycle transition has already committed by the time an
/// email goes out.
#[derive(Clone)]
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, AppError> {
        if !config.enabled {
            return Ok(Self {
                transport: AsyncSmtpTransport::<Tokio1Executor>::unencrypted_localhost(),
                config: config.clone(),
            });
        }

        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::Internal(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .pool_config(PoolConfig::new().max_size(10))
            .build();

        Ok(Self {
            transport,
            config: config.clone(),
        })
    }

    pub async fn send_booking_accepted(
        &self,
        to: &str,
        mentor_name: &str,
        calendar_url: Option<&str>,
    ) -> Result<(), AppError> {
        let subject = format!("{} accepted your mentorship request", mentor_name);
        let body = match calendar_url {
            Some(url) => format!(
                "Good news! {} accepted your mentorship request.\n\n\
                 Pick a time that works for you: {}\n",
                mentor_name, url
            ),
            None => format!(
                "Good news! {} accepted your mentorship request.\n\n\
                 They will reach out to schedule a session.\n",
                mentor_name
            ),
        };

        self.send_email(to, &subject, &body).await
    }

    pub async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), AppError> {
        let body = format!(
            "A password reset was requested for your account.\n\n\
             Reset token: {}\n\n\
             The token expires in 30 minutes. If you did not request this, ignore this email.\n",
            token
        );

        self.send_email(to, "Reset your MentorHub password", &body).await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::info!("Email service disabled, skipping email to: {}", to);
            return Ok(());
        }

        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to send email: {}", e)))?;

        tracing::info!("Email sent to: {}", to);
        Ok(())
    }
}
