use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the funding core.
///
/// Exchange-reported transfer/cancel failures are *not* represented here:
/// those arrive as result messages and are logged and notified, never raised
/// (see `ApiMessage`). Only query transport failures and programming
/// invariant violations become `FundingError`s.
#[derive(Debug, Error, Clone)]
pub enum FundingError {
    #[error("balance query failed for account {account}: {reason}")]
    BalanceQueryFailed { account: String, reason: String },

    #[error("open order query failed for scope {scope}: {reason}")]
    OrderQueryFailed { scope: String, reason: String },

    #[error("amount must be non-negative, got {0}")]
    NegativeAmount(Decimal),
}
