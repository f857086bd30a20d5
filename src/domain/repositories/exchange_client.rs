//! Exchange Client Trait
//!
//! This module defines the `ExchangeClient` trait, the surface the funding
//! core consumes from the (externally implemented, already authenticated)
//! exchange API. The abstraction keeps funding sources independent of any
//! concrete exchange and makes them easy to mock in tests.
//!
//! Transfer and cancellation outcomes are *values*, not faults: the exchange
//! answers with an [`ApiMessage`] that may carry an error, and the core logs
//! and notifies it rather than propagating. Only transport-level failures
//! surface as [`ExchangeError`].

use crate::domain::entities::order::OpenOrder;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Common result type for exchange operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Transport-level errors from the exchange API
#[derive(Debug, Error, Clone)]
pub enum ExchangeError {
    #[error("balance query failed: {0}")]
    BalanceQueryFailed(String),

    #[error("open order query failed: {0}")]
    OrderQueryFailed(String),

    #[error("network error: {0}")]
    NetworkError(String),
}

/// Result message returned by side-effecting exchange calls.
///
/// A populated `error` field means the exchange refused or failed the
/// operation; the call itself completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
    pub error: Option<String>,
}

impl ApiMessage {
    pub fn success(message: impl Into<String>) -> Self {
        ApiMessage {
            message: message.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ApiMessage {
            message: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// One-line human summary for logging and notification.
    pub fn digest(&self) -> String {
        match &self.error {
            Some(error) => format!("exchange error: {}", error),
            None => self.message.clone(),
        }
    }
}

/// Digest a side-effecting call's outcome, folding transport failures into
/// the same "failed message" shape the sources log and notify.
pub fn digest_result(result: &ExchangeResult<ApiMessage>) -> (String, bool) {
    match result {
        Ok(msg) => (msg.digest(), msg.is_success()),
        Err(e) => (format!("exchange error: {}", e), false),
    }
}

/// Exchange client trait providing the funding core's view of the exchange
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Query available balances for one named account.
    ///
    /// # Returns
    /// Mapping from currency symbol to available quantity. An account with
    /// no holdings yields an empty map.
    async fn account_balances(&self, account: &str) -> ExchangeResult<HashMap<String, Decimal>>;

    /// Move `amount` of `currency` between two accounts.
    async fn transfer(
        &self,
        currency: &str,
        amount: Decimal,
        from_account: &str,
        to_account: &str,
    ) -> ExchangeResult<ApiMessage>;

    /// List currently open orders, keyed by pair symbol.
    ///
    /// # Arguments
    /// * `scope` - exchange-defined order scope (e.g. "all")
    async fn open_orders(&self, scope: &str) -> ExchangeResult<HashMap<String, Vec<OpenOrder>>>;

    /// Cancel an open order on the exchange.
    async fn cancel_order(&self, pair: &str, order_id: &str) -> ExchangeResult<ApiMessage>;
}
