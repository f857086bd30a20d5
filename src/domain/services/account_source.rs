//! AccountBalanceSource - funding from one named account's spot balances

use crate::domain::errors::FundingError;
use crate::domain::repositories::exchange_client::{digest_result, ExchangeClient};
use crate::domain::repositories::notifier::Notifier;
use crate::domain::services::funding_source::{FundingSource, PrepareOutcome};
use crate::domain::value_objects::amount::Amount;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A funding source backed by one named account's balance snapshot.
///
/// `update` replaces the snapshot wholesale; between updates the tracked
/// balances only move through `prepare` draws and `add_balance` credits.
pub struct AccountBalanceSource {
    account: String,
    balances: HashMap<String, Amount>,
    exchange_client: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
}

impl AccountBalanceSource {
    pub fn new(
        account: impl Into<String>,
        exchange_client: Arc<dyn ExchangeClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            account: account.into(),
            balances: HashMap::new(),
            exchange_client,
            notifier,
        }
    }
}

#[async_trait]
impl FundingSource for AccountBalanceSource {
    fn name(&self) -> &str {
        &self.account
    }

    async fn update(&mut self, name_filter: Option<&str>) -> Result<(), FundingError> {
        if let Some(name) = name_filter {
            if name != self.account {
                return Ok(());
            }
        }

        tracing::debug!("updating account fund for {}", self.account);

        let snapshot = self
            .exchange_client
            .account_balances(&self.account)
            .await
            .map_err(|e| FundingError::BalanceQueryFailed {
                account: self.account.clone(),
                reason: e.to_string(),
            })?;

        // Wholesale replacement; an empty response is an empty snapshot.
        self.balances.clear();
        for (currency, value) in snapshot {
            match Amount::new(value) {
                Ok(amount) => {
                    self.balances.insert(currency, amount);
                }
                Err(_) => {
                    tracing::warn!(
                        "ignoring negative balance {} {} reported for account {}",
                        value,
                        currency,
                        self.account
                    );
                }
            }
        }

        Ok(())
    }

    fn currencies(&self) -> BTreeSet<String> {
        self.balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(currency, _)| currency.clone())
            .collect()
    }

    fn available_balance(&self, currency: &str) -> Amount {
        self.balances.get(currency).copied().unwrap_or(Amount::ZERO)
    }

    fn add_balance(&mut self, currency: &str, account: &str, amount: Amount) {
        if account != self.account {
            return;
        }

        tracing::debug!(
            "crediting {} {} back to account {}",
            amount,
            currency,
            account
        );
        let entry = self
            .balances
            .entry(currency.to_string())
            .or_insert(Amount::ZERO);
        *entry = entry.add(amount);
    }

    async fn prepare(
        &mut self,
        currency: &str,
        account: &str,
        amount: Amount,
    ) -> Result<PrepareOutcome, FundingError> {
        if !self.balances.contains_key(currency) {
            return Ok(PrepareOutcome::untouched(amount));
        }

        let transfer_amount = self.available_balance(currency).min(amount);

        // A draw into this source's own account needs no network call; the
        // funds are already where they are needed.
        if account != self.account && !transfer_amount.is_zero() {
            tracing::info!(
                "transferring {} {} from {} to {}",
                transfer_amount,
                currency,
                self.account,
                account
            );
            let result = self
                .exchange_client
                .transfer(currency, transfer_amount.value(), &self.account, account)
                .await;
            let (digest, succeeded) = digest_result(&result);
            self.notifier.report(&digest).await;

            if !succeeded {
                // The funds never moved: keep them on the books and leave
                // the demand for the next source in the chain.
                return Ok(PrepareOutcome::untouched(amount));
            }
        }

        if let Some(balance) = self.balances.get_mut(currency) {
            *balance = balance.saturating_sub(transfer_amount);
        }

        Ok(PrepareOutcome {
            residual: amount.saturating_sub(transfer_amount),
            credits: Vec::new(),
        })
    }
}
