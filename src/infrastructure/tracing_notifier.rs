//! Notifier backed by the tracing subscriber.
//!
//! Hosts without an external notification channel wire this in; digested
//! exchange results land in the structured log stream instead.

use crate::domain::repositories::notifier::Notifier;
use async_trait::async_trait;

#[derive(Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    fn log(&self, message: &str) {
        tracing::info!(target: "funding", "{}", message);
    }

    async fn notify(&self, message: &str) {
        tracing::warn!(target: "funding_notify", "{}", message);
    }
}
