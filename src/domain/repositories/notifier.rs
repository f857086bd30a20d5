//! Notifier Trait
//!
//! Logging/notification sink consumed by the funding sources. Every transfer
//! and cancellation attempt is reported here, success or failure, as a
//! digested one-line summary.

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Record a message in the local log.
    fn log(&self, message: &str);

    /// Push a message to the operator's notification channel.
    async fn notify(&self, message: &str);

    /// Log and notify in one step, the pattern every side-effecting exchange
    /// call follows.
    async fn report(&self, message: &str) {
        self.log(message);
        self.notify(message).await;
    }
}
