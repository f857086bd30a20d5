//! FundRegistry - prioritized collection of funding sources
//!
//! The registry owns every registered funding source and drives the
//! allocation waterfall: `prepare` drains sources in ascending priority
//! order (registration order within a priority) until the request is
//! satisfied or every source is exhausted. It is an explicitly owned object
//! constructed once at startup and passed by reference into every call site.

use crate::domain::errors::FundingError;
use crate::domain::services::funding_source::FundingSource;
use crate::domain::value_objects::amount::Amount;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Default)]
pub struct FundRegistry {
    funds: BTreeMap<u32, Vec<Box<dyn FundingSource>>>,
}

impl FundRegistry {
    pub fn new() -> Self {
        Self {
            funds: BTreeMap::new(),
        }
    }

    /// Register a funding source at the given priority. Lower priorities are
    /// drained first; sources sharing a priority drain in registration
    /// order. Sources are permanent once added.
    pub fn add_fund(&mut self, source: Box<dyn FundingSource>, priority: u32) {
        tracing::debug!("registering fund {} at priority {}", source.name(), priority);
        self.funds.entry(priority).or_default().push(source);
    }

    /// Refresh every source, in priority then registration order. A `Some`
    /// filter refreshes only the source carrying that name.
    pub async fn update(&mut self, name_filter: Option<&str>) -> Result<(), FundingError> {
        for sources in self.funds.values_mut() {
            for source in sources.iter_mut() {
                source.update(name_filter).await?;
            }
        }
        Ok(())
    }

    /// Broadcast an out-of-band credit to every source; each decides locally
    /// whether the account is its own.
    pub fn add_balance(&mut self, currency: &str, account: &str, amount: Amount) {
        for sources in self.funds.values_mut() {
            for source in sources.iter_mut() {
                source.add_balance(currency, account, amount);
            }
        }
    }

    /// All currencies held by any source.
    pub fn currencies(&self) -> BTreeSet<String> {
        self.funds
            .values()
            .flatten()
            .flat_map(|source| source.currencies())
            .collect()
    }

    /// Total availability of one currency across all sources.
    pub fn available_balance(&self, currency: &str) -> Amount {
        self.funds
            .values()
            .flatten()
            .fold(Amount::ZERO, |total, source| {
                total.add(source.available_balance(currency))
            })
    }

    /// Total availability per currency across all sources. Sources reporting
    /// zero or nothing for a currency contribute no entry.
    pub fn available_balances(&self) -> HashMap<String, Amount> {
        let mut totals: HashMap<String, Amount> = HashMap::new();
        for source in self.funds.values().flatten() {
            for currency in source.currencies() {
                let balance = source.available_balance(&currency);
                if balance.is_zero() {
                    continue;
                }
                let entry = totals.entry(currency).or_insert(Amount::ZERO);
                *entry = entry.add(balance);
            }
        }
        totals
    }

    /// Satisfy `amount` of `currency` into `account` by draining sources in
    /// priority order. Each source's excess credits are routed before the
    /// next source is consulted. Returns the unfulfilled residual; a
    /// positive residual means the request could not be fully satisfied and
    /// is a normal return value, not an error.
    pub async fn prepare(
        &mut self,
        currency: &str,
        account: &str,
        amount: Amount,
    ) -> Result<Amount, FundingError> {
        tracing::info!("need {} of {} in account {}", amount, currency, account);

        let mut remaining = amount;
        let priorities: Vec<u32> = self.funds.keys().copied().collect();

        for priority in priorities {
            let count = self.funds.get(&priority).map_or(0, |sources| sources.len());
            for index in 0..count {
                let outcome = match self
                    .funds
                    .get_mut(&priority)
                    .and_then(|sources| sources.get_mut(index))
                {
                    Some(source) => source.prepare(currency, account, remaining).await?,
                    None => continue,
                };

                remaining = outcome.residual;
                for credit in outcome.credits {
                    self.add_balance(&credit.currency, &credit.account, credit.amount);
                }

                if remaining.is_zero() {
                    return Ok(remaining);
                }
            }
        }

        Ok(remaining)
    }
}
