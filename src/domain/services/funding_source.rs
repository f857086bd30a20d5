//! FundingSource Trait
//!
//! The polymorphic contract every funding source implements. Sources are
//! registered with the [`FundRegistry`](crate::domain::services::fund_registry::FundRegistry)
//! at a priority and drained in priority order by `prepare`.
//!
//! Sources never reach back into the registry: value freed beyond the
//! current request is returned as an [`ExcessCredit`] inside the
//! [`PrepareOutcome`], and the registry routes it to whichever source claims
//! the named account.

use crate::domain::errors::FundingError;
use crate::domain::value_objects::amount::Amount;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Value freed by a source beyond what the current request needed, to be
/// re-homed into the source tracking `account`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcessCredit {
    pub currency: String,
    pub account: String,
    pub amount: Amount,
}

/// Result of one source's `prepare` attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareOutcome {
    /// Unfulfilled portion of the requested amount, `0 <= residual <= request`.
    pub residual: Amount,
    /// Credits the registry must route before consulting the next source.
    pub credits: Vec<ExcessCredit>,
}

impl PrepareOutcome {
    /// Nothing drawn: the full request remains outstanding.
    pub fn untouched(amount: Amount) -> Self {
        PrepareOutcome {
            residual: amount,
            credits: Vec::new(),
        }
    }
}

/// A provider of currency balances that can be queried and drawn from.
#[async_trait]
pub trait FundingSource: Send + Sync {
    /// Identity of this source, matched against `update`'s name filter.
    fn name(&self) -> &str;

    /// Refresh internal state from the source's live backing data.
    ///
    /// A `Some` filter naming a different source makes the call a no-op,
    /// allowing selective refresh of one source without touching the rest.
    async fn update(&mut self, name_filter: Option<&str>) -> Result<(), FundingError>;

    /// Currencies for which this source currently holds a non-zero position.
    fn currencies(&self) -> BTreeSet<String>;

    /// Quantity currently available from this source for `currency`;
    /// zero if unknown.
    fn available_balance(&self, currency: &str) -> Amount;

    /// Out-of-band credit notification. Each source decides locally whether
    /// `account` matches its identity; non-matching sources ignore the call.
    fn add_balance(&mut self, currency: &str, account: &str, amount: Amount);

    /// Attempt to satisfy `amount` of `currency` into `account` from this
    /// source's held resources. May issue transfers or cancellations; always
    /// updates internal bookkeeping to reflect what was actually consumed.
    async fn prepare(
        &mut self,
        currency: &str,
        account: &str,
        amount: Amount,
    ) -> Result<PrepareOutcome, FundingError>;
}
