//! Log notifier - Implements NotifierPort by writing alerts to the log
//!
//! Used when email delivery is disabled or not fully configured.

use application::error::ApplicationError;
use application::ports::NotifierPort;
use async_trait::async_trait;
use domain::entities::Alert;
use tracing::warn;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotifierPort for LogNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), ApplicationError> {
        warn!(
            alert_id = %alert.id,
            location = %alert.location_name,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            description = %alert.description,
            "{}",
            alert.title
        );
        Ok(())
    }
}
