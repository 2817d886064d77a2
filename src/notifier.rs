// src/notifier.rs

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery-channel collaborator for one-time codes (email or SMS).
/// Delivery failures are reported to the caller but never roll back code
/// issuance.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, destination: &str, code: &str) -> Result<(), NotifyError>;
}

/// Default channel: logs the delivery instead of sending it. Real channels
/// plug in behind the same trait.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, destination: &str, _code: &str) -> Result<(), NotifyError> {
        tracing::info!("one-time code issued for {destination}");
        Ok(())
    }
}
