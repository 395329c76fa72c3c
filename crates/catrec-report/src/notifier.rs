use crate::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// A sender or recipient address could not be parsed.
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },
    /// The message itself could not be assembled.
    #[error("message build failed: {0}")]
    Build(String),
    /// The channel was unreachable or refused the message.
    #[error("delivery failed: {0}")]
    Transport(String),
}

/// Outbound notification channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Short identifier used in logs (e.g. `"smtp"`).
    fn channel_name(&self) -> &'static str;

    async fn send(&self, report: &Report) -> Result<(), NotifyError>;
}
