//! Alert notification port

use async_trait::async_trait;
use domain::entities::Alert;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for delivering alert notifications
///
/// Delivery failures are reported but never fatal to the caller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn NotifierPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn NotifierPort>();
    }
}
