//! Type-safe price representation using decimal arithmetic.
//!
//! Prices use [`rust_decimal::Decimal`] throughout; floating point never
//! touches money. Cart totals are sums of `line_total` values, so the
//! arithmetic helpers live here next to the type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// The price of `quantity` units at this unit price.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.amount * Decimal::from(quantity)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }

    /// ISO 4217 code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_exactly() {
        let price = Price::new(Decimal::new(1099, 2), CurrencyCode::USD);
        assert_eq!(price.line_total(3), Decimal::new(3297, 2));
        assert_eq!(price.line_total(0), Decimal::ZERO);
    }

    #[test]
    fn display_rounds_to_cents() {
        let price = Price::new(Decimal::new(5, 0), CurrencyCode::USD);
        assert_eq!(price.display(), "$5.00");
        let price = Price::new(Decimal::new(199, 1), CurrencyCode::EUR);
        assert_eq!(price.display(), "\u{20ac}19.90");
    }
}
