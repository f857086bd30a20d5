pub mod exchange_client;
pub mod notifier;
