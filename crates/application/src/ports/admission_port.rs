//! Admission control port
//!
//! Shared outbound request budget consulted before every provider call.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Port for rate-limited admission of outbound requests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdmissionPort: Send + Sync {
    /// Suspend until one more request fits in the budget, then record it
    async fn admit(&self);
}
