//! Type-safe price representation using decimal arithmetic.
//!
//! Prices shown to Swiss customers are rounded to the nearest 5 Rappen
//! (0.05 CHF), the smallest coin in circulation. Shopify still charges the
//! exact amount, so the rounded figure is marked with a `*` hint wherever
//! the two differ.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not supported.
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (francs, not Rappen).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

/// Breakdown of how Swiss rounding changed a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundingAdjustment {
    /// Amount before rounding.
    pub original: Decimal,
    /// Amount after rounding to 0.05.
    pub rounded: Decimal,
    /// `rounded - original`.
    pub adjustment: Decimal,
    /// Signed display string, e.g. `+CHF 0.02`.
    pub adjustment_formatted: String,
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

    /// Create a price in Swiss francs.
    #[must_use]
    pub const fn chf(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::CHF)
    }

    /// Parse a price from Shopify's `MoneyV2` representation
    /// (`amount` as a decimal string plus a currency code).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal number or the
    /// currency is not one the store sells in.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| PriceError::InvalidAmount(amount.to_owned()))?;
        let currency_code = currency_code.parse()?;
        Ok(Self::new(amount, currency_code))
    }

    /// Amount rounded to the nearest 0.05, midpoints rounded up.
    ///
    /// ```
    /// use alltagsgold_core::Price;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Price::chf(Decimal::new(4783, 2));
    /// assert_eq!(price.swiss_rounded().amount, Decimal::new(4785, 2));
    /// ```
    #[must_use]
    pub fn swiss_rounded(&self) -> Self {
        Self::new(round_to_swiss_francs(self.amount), self.currency_code)
    }

    /// Whether Swiss rounding changes this price.
    #[must_use]
    pub fn needs_rounding(&self) -> bool {
        round_to_swiss_francs(self.amount) != self.amount
    }

    /// Format for Swiss display, e.g. `CHF 47.85`.
    ///
    /// With `show_hint`, a trailing `*` marks amounts that were changed by
    /// rounding.
    #[must_use]
    pub fn format_swiss(&self, show_hint: bool) -> String {
        let rounded = round_to_swiss_francs(self.amount);
        let hint = if show_hint && rounded != self.amount {
            "*"
        } else {
            ""
        };
        format!("{} {rounded:.2}{hint}", self.currency_code.code())
    }

    /// Describe the difference between the exact and the rounded amount.
    #[must_use]
    pub fn swiss_rounding_adjustment(&self) -> RoundingAdjustment {
        let rounded = round_to_swiss_francs(self.amount);
        let adjustment = rounded - self.amount;
        let sign = if adjustment.is_sign_negative() && !adjustment.is_zero() {
            "-"
        } else {
            "+"
        };
        RoundingAdjustment {
            original: self.amount,
            rounded,
            adjustment,
            adjustment_formatted: format!(
                "{sign}{} {:.2}",
                self.currency_code.code(),
                adjustment.abs()
            ),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency_code.code(), self.amount)
    }
}

/// Round an amount to the nearest 5 Rappen.
#[must_use]
pub fn round_to_swiss_francs(amount: Decimal) -> Decimal {
    let twenty = Decimal::from(20);
    let steps = (amount * twenty).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    (steps / twenty).round_dp(2)
}

/// ISO 4217 currency codes the store prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    CHF,
    EUR,
    USD,
    GBP,
}

impl CurrencyCode {
    /// The three-letter code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CHF => "CHF",
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHF" => Ok(Self::CHF),
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            _ => Err(PriceError::UnsupportedCurrency(s.to_owned())),
        }
    }
}
