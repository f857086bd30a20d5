//! Plugin lifecycle and registry bootstrap
//!
//! The host process builds the registry exactly once, before any `update` or
//! `prepare`: built-in account sources are registered first, then every
//! plugin's initialization hook runs once to contribute additional sources
//! at a priority of its choosing.

use crate::config::FundingConfig;
use crate::domain::repositories::exchange_client::ExchangeClient;
use crate::domain::repositories::notifier::Notifier;
use crate::domain::services::account_source::AccountBalanceSource;
use crate::domain::services::fund_registry::FundRegistry;
use crate::domain::services::order_book_source::OrderBookFundSource;
use std::sync::Arc;

/// Priority of the lending account source.
pub const PRIORITY_LENDING: u32 = 0;
/// Priority of the exchange and margin account sources.
pub const PRIORITY_SPOT_ACCOUNTS: u32 = 5;
/// Priority of the open-orders source; drained only when accounts run dry.
pub const PRIORITY_OPEN_ORDERS: u32 = 50;

/// Shared collaborators handed to plugins when they construct sources.
#[derive(Clone)]
pub struct PluginContext {
    pub config: FundingConfig,
    pub exchange_client: Arc<dyn ExchangeClient>,
    pub notifier: Arc<dyn Notifier>,
}

/// A plugin contributes funding sources during bootstrap.
pub trait FundingPlugin: Send + Sync {
    /// Called exactly once, before any `update` or `prepare` on the registry.
    fn on_init(&self, registry: &mut FundRegistry, ctx: &PluginContext);
}

/// Registers an [`OrderBookFundSource`] over the exchange's open orders.
pub struct OpenOrdersPlugin;

impl FundingPlugin for OpenOrdersPlugin {
    fn on_init(&self, registry: &mut FundRegistry, ctx: &PluginContext) {
        registry.add_fund(
            Box::new(OrderBookFundSource::new(
                "open-orders",
                ctx.config.holding_account.clone(),
                ctx.config.order_scope.clone(),
                ctx.exchange_client.clone(),
                ctx.notifier.clone(),
            )),
            PRIORITY_OPEN_ORDERS,
        );
    }
}

/// Built-in account identities and the priority each registers at.
const BUILTIN_ACCOUNTS: [(&str, u32); 3] = [
    ("lending", PRIORITY_LENDING),
    ("exchange", PRIORITY_SPOT_ACCOUNTS),
    ("margin", PRIORITY_SPOT_ACCOUNTS),
];

/// Build the registry: one account source per configured built-in account,
/// then every plugin's hook, in the order given.
pub fn bootstrap(
    config: &FundingConfig,
    exchange_client: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
    plugins: &[Box<dyn FundingPlugin>],
) -> FundRegistry {
    let mut registry = FundRegistry::new();

    for (account, priority) in BUILTIN_ACCOUNTS {
        if !config.has_account(account) {
            continue;
        }
        registry.add_fund(
            Box::new(AccountBalanceSource::new(
                account,
                exchange_client.clone(),
                notifier.clone(),
            )),
            priority,
        );
    }

    for account in &config.accounts {
        if !BUILTIN_ACCOUNTS.iter().any(|(name, _)| name == account) {
            tracing::warn!("no built-in funding source for account '{}'", account);
        }
    }

    let ctx = PluginContext {
        config: config.clone(),
        exchange_client,
        notifier,
    };
    for plugin in plugins {
        plugin.on_init(&mut registry, &ctx);
    }

    registry
}
