//! Open-order entities as reported by the exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of an open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// An open order as listed by the exchange for one trading pair.
///
/// `amount` is denominated in the pair's second currency, `total` in the
/// first; which of the two an order would release on cancellation depends on
/// its side (see `TradingPair::released_currency`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub side: OrderSide,
    pub amount: Decimal,
    pub total: Decimal,
}

/// A trading pair in the exchange's `FIRST_SECOND` wire format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    symbol: String,
    split: usize,
}

impl TradingPair {
    /// Parse a `FIRST_SECOND` pair symbol. Returns `None` when either side
    /// is empty or the separator is missing.
    pub fn parse(symbol: &str) -> Option<Self> {
        let split = symbol.find('_')?;
        if split == 0 || split == symbol.len() - 1 {
            return None;
        }
        Some(TradingPair {
            symbol: symbol.to_string(),
            split,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn first(&self) -> &str {
        &self.symbol[..self.split]
    }

    pub fn second(&self) -> &str {
        &self.symbol[self.split + 1..]
    }

    /// The currency an order on this pair would release if cancelled, and
    /// the field it is quantified by: a sell order locks the second currency
    /// (its `amount`), a buy order locks the first (its `total`).
    pub fn released_currency(&self, side: OrderSide) -> &str {
        match side {
            OrderSide::Sell => self.second(),
            OrderSide::Buy => self.first(),
        }
    }
}
