//! Email notifier - Implements NotifierPort over SMTP (STARTTLS)

use std::time::Duration;

use application::error::ApplicationError;
use application::ports::NotifierPort;
use async_trait::async_trait;
use domain::entities::Alert;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use tracing::{info, instrument};

use crate::config::EmailConfig;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one plain-text email per alert
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("from", &self.from.email.to_string())
            .field("to", &self.to.email.to_string())
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    /// Build the SMTP transport
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the settings are incomplete, an address
    /// does not parse or the relay cannot be set up.
    pub fn from_config(config: &EmailConfig) -> Result<Self, ApplicationError> {
        if !config.is_complete() {
            return Err(ApplicationError::Configuration(
                "email notifications need smtp_host, username, password and to".into(),
            ));
        }

        let from = parse_mailbox("email.from", config.sender())?;
        let to = parse_mailbox("email.to", &config.to)?;
        let password = config
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| ApplicationError::Configuration(format!("SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.username.clone(), password))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    fn build_message(&self, alert: &Alert) -> Result<Message, ApplicationError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject(alert))
            .header(ContentType::TEXT_PLAIN)
            .body(format_alert_email(alert))
            .map_err(|e| ApplicationError::Notification(format!("building message: {e}")))
    }
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox, ApplicationError> {
    value
        .trim()
        .parse()
        .map_err(|e| ApplicationError::Configuration(format!("{field} '{value}': {e}")))
}

#[async_trait]
impl NotifierPort for EmailNotifier {
    #[instrument(skip(self, alert), fields(alert_id = %alert.id, location = %alert.location))]
    async fn send(&self, alert: &Alert) -> Result<(), ApplicationError> {
        let message = self.build_message(alert)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| ApplicationError::Notification(e.to_string()))?;

        info!(alert_type = %alert.alert_type, "Sent alert email");
        Ok(())
    }
}

/// Subject line for an alert email
#[must_use]
pub fn subject(alert: &Alert) -> String {
    format!("Weather Alert: {}", alert.title)
}

/// Plain-text body for an alert email
#[must_use]
pub fn format_alert_email(alert: &Alert) -> String {
    format!(
        "Weather Alert Notification\n\
         \n\
         Location: {location}\n\
         Alert Type: {kind}\n\
         Severity: {severity}\n\
         Time: {time}\n\
         \n\
         Description:\n\
         {description}\n\
         \n\
         This is an automated weather alert from Weathervane.",
        location = alert.location_name,
        kind = alert.alert_type.label(),
        severity = alert.severity.as_str().to_uppercase(),
        time = alert.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
        description = alert.description,
    )
}
