use crate::domain::errors::FundingError;
use rust_decimal::Decimal;

/// A non-negative monetary quantity.
///
/// All balances, requests and residuals in the funding core are `Amount`s, so
/// the non-negativity invariant is enforced at construction rather than
/// re-checked at every arithmetic step. Backed by an arbitrary-precision
/// decimal; binary floats never enter balance accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, FundingError> {
        if value >= Decimal::ZERO {
            Ok(Amount(value))
        } else {
            Err(FundingError::NegativeAmount(value))
        }
    }

    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn min(self, other: Amount) -> Amount {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Sum of two amounts. Closed over non-negatives, so never fails.
    pub fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }

    /// Difference floored at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        if other.0 >= self.0 {
            Amount::ZERO
        } else {
            Amount(self.0 - other.0)
        }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
