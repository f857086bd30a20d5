//! OrderBookFundSource - funding from currently-open, cancellable orders

use crate::domain::entities::order::{OrderSide, TradingPair};
use crate::domain::errors::FundingError;
use crate::domain::repositories::exchange_client::{digest_result, ExchangeClient};
use crate::domain::repositories::notifier::Notifier;
use crate::domain::services::funding_source::{ExcessCredit, FundingSource, PrepareOutcome};
use crate::domain::value_objects::amount::Amount;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

/// An open order tracked by the source, keyed under the currency it would
/// release if cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackedOrder {
    pair: String,
    order_id: String,
    releasable: Amount,
}

/// A funding source backed by cancellable open orders.
///
/// Cancelling an order destroys it entirely; whatever it releases beyond the
/// current request is reported as an [`ExcessCredit`] to the exchange-holding
/// account rather than discarded. Orders are drained FIFO, oldest first, with
/// no regard to size or price.
pub struct OrderBookFundSource {
    name: String,
    /// Account where cancelled-order funds land before onward transfer.
    holding_account: String,
    order_scope: String,
    orders: HashMap<String, VecDeque<TrackedOrder>>,
    exchange_client: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
}

impl OrderBookFundSource {
    pub fn new(
        name: impl Into<String>,
        holding_account: impl Into<String>,
        order_scope: impl Into<String>,
        exchange_client: Arc<dyn ExchangeClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            name: name.into(),
            holding_account: holding_account.into(),
            order_scope: order_scope.into(),
            orders: HashMap::new(),
            exchange_client,
            notifier,
        }
    }
}

#[async_trait]
impl FundingSource for OrderBookFundSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update(&mut self, name_filter: Option<&str>) -> Result<(), FundingError> {
        if let Some(name) = name_filter {
            if name != self.name {
                return Ok(());
            }
        }

        tracing::debug!("updating open orders fund {}", self.name);

        let listed = self
            .exchange_client
            .open_orders(&self.order_scope)
            .await
            .map_err(|e| FundingError::OrderQueryFailed {
                scope: self.order_scope.clone(),
                reason: e.to_string(),
            })?;

        self.orders.clear();

        for (symbol, orders) in listed {
            let Some(pair) = TradingPair::parse(&symbol) else {
                tracing::warn!("skipping open orders under malformed pair {}", symbol);
                continue;
            };

            for order in orders {
                let currency = pair.released_currency(order.side).to_string();
                let quantity = match order.side {
                    OrderSide::Sell => order.amount,
                    OrderSide::Buy => order.total,
                };
                let Ok(releasable) = Amount::new(quantity) else {
                    tracing::warn!(
                        "skipping order {} on {} with negative quantity {}",
                        order.order_id,
                        symbol,
                        quantity
                    );
                    continue;
                };

                self.orders
                    .entry(currency)
                    .or_default()
                    .push_back(TrackedOrder {
                        pair: pair.symbol().to_string(),
                        order_id: order.order_id,
                        releasable,
                    });
            }
        }

        Ok(())
    }

    fn currencies(&self) -> BTreeSet<String> {
        self.orders
            .iter()
            .filter(|(currency, _)| !self.available_balance(currency).is_zero())
            .map(|(currency, _)| currency.clone())
            .collect()
    }

    fn available_balance(&self, currency: &str) -> Amount {
        match self.orders.get(currency) {
            Some(orders) => orders
                .iter()
                .fold(Amount::ZERO, |total, order| total.add(order.releasable)),
            None => Amount::ZERO,
        }
    }

    fn add_balance(&mut self, _currency: &str, _account: &str, _amount: Amount) {
        // Orders have no account identity; credits never land here.
    }

    async fn prepare(
        &mut self,
        currency: &str,
        account: &str,
        amount: Amount,
    ) -> Result<PrepareOutcome, FundingError> {
        let exchange_client = Arc::clone(&self.exchange_client);
        let notifier = Arc::clone(&self.notifier);
        let holding_account = self.holding_account.clone();

        let Some(queue) = self.orders.get_mut(currency) else {
            return Ok(PrepareOutcome::untouched(amount));
        };

        let mut remaining = amount;
        let mut credits = Vec::new();

        while !remaining.is_zero() {
            // An order leaves the queue exactly once, when selected.
            let Some(order) = queue.pop_front() else {
                break;
            };

            let transfer_amount = order.releasable.min(remaining);
            if transfer_amount.is_zero() {
                continue;
            }

            tracing::info!(
                "cancelling order {} on {} releasing {} {}, transferring {} to {}",
                order.order_id,
                order.pair,
                order.releasable,
                currency,
                transfer_amount,
                account
            );

            let cancel = exchange_client
                .cancel_order(&order.pair, &order.order_id)
                .await;
            let (digest, cancelled) = digest_result(&cancel);
            notifier.report(&digest).await;
            if !cancelled {
                // Still on the exchange's book but no longer tracked here;
                // the next update picks it up again.
                continue;
            }

            if account != holding_account {
                let transfer = exchange_client
                    .transfer(
                        currency,
                        transfer_amount.value(),
                        &holding_account,
                        account,
                    )
                    .await;
                let (digest, transferred) = digest_result(&transfer);
                notifier.report(&digest).await;
                if !transferred {
                    // Cancellation already deposited the full releasable
                    // quantity in the holding account; re-home all of it.
                    credits.push(ExcessCredit {
                        currency: currency.to_string(),
                        account: holding_account.clone(),
                        amount: order.releasable,
                    });
                    continue;
                }
            }

            let excess = order.releasable.saturating_sub(transfer_amount);
            if !excess.is_zero() {
                credits.push(ExcessCredit {
                    currency: currency.to_string(),
                    account: holding_account.clone(),
                    amount: excess,
                });
            }

            remaining = remaining.saturating_sub(transfer_amount);
        }

        Ok(PrepareOutcome {
            residual: remaining,
            credits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::order::OpenOrder;
    use crate::domain::repositories::exchange_client::{ApiMessage, ExchangeResult};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct MockExchangeClient {
        orders: HashMap<String, Vec<OpenOrder>>,
        cancel_fails: bool,
        transfer_fails: bool,
        cancels: Mutex<Vec<(String, String)>>,
        transfers: Mutex<Vec<(String, Decimal, String, String)>>,
    }

    impl MockExchangeClient {
        fn with_orders(orders: HashMap<String, Vec<OpenOrder>>) -> Self {
            Self {
                orders,
                cancel_fails: false,
                transfer_fails: false,
                cancels: Mutex::new(Vec::new()),
                transfers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExchangeClient for MockExchangeClient {
        async fn account_balances(
            &self,
            _account: &str,
        ) -> ExchangeResult<HashMap<String, Decimal>> {
            Ok(HashMap::new())
        }

        async fn transfer(
            &self,
            currency: &str,
            amount: Decimal,
            from_account: &str,
            to_account: &str,
        ) -> ExchangeResult<ApiMessage> {
            self.transfers.lock().unwrap().push((
                currency.to_string(),
                amount,
                from_account.to_string(),
                to_account.to_string(),
            ));
            if self.transfer_fails {
                Ok(ApiMessage::failure("transfer rejected"))
            } else {
                Ok(ApiMessage::success("transferred"))
            }
        }

        async fn open_orders(
            &self,
            _scope: &str,
        ) -> ExchangeResult<HashMap<String, Vec<OpenOrder>>> {
            Ok(self.orders.clone())
        }

        async fn cancel_order(&self, pair: &str, order_id: &str) -> ExchangeResult<ApiMessage> {
            self.cancels
                .lock()
                .unwrap()
                .push((pair.to_string(), order_id.to_string()));
            if self.cancel_fails {
                Ok(ApiMessage::failure("order already filled"))
            } else {
                Ok(ApiMessage::success("cancelled"))
            }
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        fn log(&self, _message: &str) {}
        async fn notify(&self, _message: &str) {}
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn log(&self, _message: &str) {}
        async fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn sell(order_id: &str, amount: Decimal) -> OpenOrder {
        OpenOrder {
            order_id: order_id.to_string(),
            side: OrderSide::Sell,
            amount,
            total: Decimal::ZERO,
        }
    }

    fn buy(order_id: &str, total: Decimal) -> OpenOrder {
        OpenOrder {
            order_id: order_id.to_string(),
            side: OrderSide::Buy,
            amount: Decimal::ZERO,
            total,
        }
    }

    fn source_with(
        orders: HashMap<String, Vec<OpenOrder>>,
    ) -> (OrderBookFundSource, Arc<MockExchangeClient>) {
        let client = Arc::new(MockExchangeClient::with_orders(orders));
        let source = OrderBookFundSource::new(
            "open-orders",
            "exchange",
            "all",
            client.clone(),
            Arc::new(SilentNotifier),
        );
        (source, client)
    }

    #[tokio::test]
    async fn test_update_groups_orders_by_released_currency() {
        let (mut source, _client) = source_with(HashMap::from([(
            "BTC_ETH".to_string(),
            vec![sell("1", dec!(2.5)), buy("2", dec!(0.4))],
        )]));

        source.update(None).await.unwrap();

        // Sell releases the second currency by its amount, buy releases the
        // first by its total.
        assert_eq!(source.available_balance("ETH").value(), dec!(2.5));
        assert_eq!(source.available_balance("BTC").value(), dec!(0.4));
    }

    #[tokio::test]
    async fn test_update_skips_malformed_pairs() {
        let (mut source, _client) = source_with(HashMap::from([(
            "BTCETH".to_string(),
            vec![sell("1", dec!(2.5))],
        )]));

        source.update(None).await.unwrap();

        assert!(source.currencies().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_other_name_filter_is_noop() {
        let (mut source, _client) = source_with(HashMap::from([(
            "BTC_ETH".to_string(),
            vec![sell("1", dec!(2.5))],
        )]));

        source.update(Some("exchange")).await.unwrap();
        assert_eq!(source.available_balance("ETH"), Amount::ZERO);

        source.update(Some("open-orders")).await.unwrap();
        assert_eq!(source.available_balance("ETH").value(), dec!(2.5));
    }

    #[tokio::test]
    async fn test_prepare_unknown_currency_returns_amount() {
        let (mut source, client) = source_with(HashMap::from([(
            "BTC_ETH".to_string(),
            vec![sell("1", dec!(2.5))],
        )]));
        source.update(None).await.unwrap();

        let amount = Amount::new(dec!(1)).unwrap();
        let outcome = source.prepare("DOGE", "lending", amount).await.unwrap();

        assert_eq!(outcome.residual, amount);
        assert!(client.cancels.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_cancels_transfers_and_credits_excess() {
        let (mut source, client) = source_with(HashMap::from([(
            "BTC_ETH".to_string(),
            vec![sell("17", dec!(5))],
        )]));
        source.update(None).await.unwrap();

        let outcome = source
            .prepare("ETH", "lending", Amount::new(dec!(2)).unwrap())
            .await
            .unwrap();

        assert!(outcome.residual.is_zero());
        assert_eq!(
            outcome.credits,
            vec![ExcessCredit {
                currency: "ETH".to_string(),
                account: "exchange".to_string(),
                amount: Amount::new(dec!(3)).unwrap(),
            }]
        );
        assert_eq!(
            *client.cancels.lock().unwrap(),
            vec![("BTC_ETH".to_string(), "17".to_string())]
        );
        assert_eq!(
            *client.transfers.lock().unwrap(),
            vec![(
                "ETH".to_string(),
                dec!(2),
                "exchange".to_string(),
                "lending".to_string()
            )]
        );
        // The cancelled order is gone from tracking.
        assert_eq!(source.available_balance("ETH"), Amount::ZERO);
    }

    #[tokio::test]
    async fn test_prepare_drains_orders_fifo() {
        let (mut source, client) = source_with(HashMap::from([(
            "BTC_ETH".to_string(),
            vec![sell("first", dec!(1)), sell("second", dec!(10))],
        )]));
        source.update(None).await.unwrap();

        let outcome = source
            .prepare("ETH", "lending", Amount::new(dec!(3)).unwrap())
            .await
            .unwrap();

        assert!(outcome.residual.is_zero());
        let cancels = client.cancels.lock().unwrap();
        assert_eq!(cancels[0].1, "first");
        assert_eq!(cancels[1].1, "second");
        // 1 from the first order, 2 from the second; 8 excess re-homed.
        assert_eq!(
            outcome.credits,
            vec![ExcessCredit {
                currency: "ETH".to_string(),
                account: "exchange".to_string(),
                amount: Amount::new(dec!(8)).unwrap(),
            }]
        );
    }

    #[tokio::test]
    async fn test_prepare_to_holding_account_skips_transfer() {
        let (mut source, client) = source_with(HashMap::from([(
            "BTC_ETH".to_string(),
            vec![sell("1", dec!(5))],
        )]));
        source.update(None).await.unwrap();

        let outcome = source
            .prepare("ETH", "exchange", Amount::new(dec!(5)).unwrap())
            .await
            .unwrap();

        assert!(outcome.residual.is_zero());
        assert!(outcome.credits.is_empty());
        assert_eq!(client.cancels.lock().unwrap().len(), 1);
        assert!(client.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_failed_cancel_contributes_nothing() {
        let client = Arc::new(MockExchangeClient {
            orders: HashMap::from([("BTC_ETH".to_string(), vec![sell("1", dec!(5))])]),
            cancel_fails: true,
            transfer_fails: false,
            cancels: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let mut source = OrderBookFundSource::new(
            "open-orders",
            "exchange",
            "all",
            client.clone(),
            notifier.clone(),
        );
        source.update(None).await.unwrap();

        let amount = Amount::new(dec!(2)).unwrap();
        let outcome = source.prepare("ETH", "lending", amount).await.unwrap();

        assert_eq!(outcome.residual, amount);
        assert!(outcome.credits.is_empty());
        assert!(client.transfers.lock().unwrap().is_empty());
        // The refused cancellation was still reported.
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec!["exchange error: order already filled".to_string()]
        );
    }

    #[tokio::test]
    async fn test_prepare_failed_transfer_credits_full_releasable() {
        let client = Arc::new(MockExchangeClient {
            orders: HashMap::from([("BTC_ETH".to_string(), vec![sell("1", dec!(5))])]),
            cancel_fails: false,
            transfer_fails: true,
            cancels: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let mut source = OrderBookFundSource::new(
            "open-orders",
            "exchange",
            "all",
            client.clone(),
            notifier.clone(),
        );
        source.update(None).await.unwrap();

        let amount = Amount::new(dec!(2)).unwrap();
        let outcome = source.prepare("ETH", "lending", amount).await.unwrap();

        // The order was destroyed but its funds never left the holding
        // account: everything it released is credited back there.
        assert_eq!(outcome.residual, amount);
        assert_eq!(
            outcome.credits,
            vec![ExcessCredit {
                currency: "ETH".to_string(),
                account: "exchange".to_string(),
                amount: Amount::new(dec!(5)).unwrap(),
            }]
        );
        // Both attempts were reported: the cancel succeeded, the transfer not.
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec![
                "cancelled".to_string(),
                "exchange error: transfer rejected".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_add_balance_is_noop() {
        let (mut source, _client) = source_with(HashMap::new());

        source.add_balance("ETH", "exchange", Amount::new(dec!(3)).unwrap());

        assert_eq!(source.available_balance("ETH"), Amount::ZERO);
    }
}
