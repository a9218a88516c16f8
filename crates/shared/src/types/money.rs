//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.
//!
//! Rounding always takes the currency explicitly. Intermediate sums stay at
//! full precision and are rounded once, right before a value is persisted or
//! returned.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "USD", "JPY").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    #[default]
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Canadian Dollar
    Cad,
    /// Australian Dollar
    Aud,
    /// Swiss Franc
    Chf,
    /// Singapore Dollar
    Sgd,
    /// Indonesian Rupiah
    Idr,
    /// Japanese Yen
    Jpy,
    /// South Korean Won
    Krw,
    /// Bahraini Dinar
    Bhd,
    /// Kuwaiti Dinar
    Kwd,
}

impl Currency {
    /// Number of decimal places of the currency's minor unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy | Self::Krw => 0,
            Self::Bhd | Self::Kwd => 3,
            Self::Usd
            | Self::Eur
            | Self::Gbp
            | Self::Cad
            | Self::Aud
            | Self::Chf
            | Self::Sgd
            | Self::Idr => 2,
        }
    }

    /// Rounds an amount to this currency's minor-unit precision.
    ///
    /// Uses Banker's Rounding (MidpointNearestEven).
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.minor_units(), RoundingStrategy::MidpointNearestEven)
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns this amount rounded to its currency's precision.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self::new(self.currency.round(self.amount), self.currency)
    }

    /// Rounds `amount` to the minor-unit precision of `currency`.
    #[must_use]
    pub fn round(amount: Decimal, currency: Currency) -> Decimal {
        currency.round(amount)
    }

    /// Sums signed amounts at full precision.
    ///
    /// An empty sequence yields zero. The result is not rounded.
    pub fn sum<I>(amounts: I, currency: Currency) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        Self::new(amounts.into_iter().sum(), currency)
    }

    /// Percentage of `part` relative to `whole`, rounded to 2 decimal places.
    ///
    /// Returns `None` when `whole` is zero, regardless of `part`.
    #[must_use]
    pub fn percentage(part: Decimal, whole: Decimal) -> Option<Decimal> {
        if whole.is_zero() {
            return None;
        }
        Some((part / whole * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Chf => "CHF",
            Self::Sgd => "SGD",
            Self::Idr => "IDR",
            Self::Jpy => "JPY",
            Self::Krw => "KRW",
            Self::Bhd => "BHD",
            Self::Kwd => "KWD",
        };
        f.write_str(code)
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "CAD" => Ok(Self::Cad),
            "AUD" => Ok(Self::Aud),
            "CHF" => Ok(Self::Chf),
            "SGD" => Ok(Self::Sgd),
            "IDR" => Ok(Self::Idr),
            "JPY" => Ok(Self::Jpy),
            "KRW" => Ok(Self::Krw),
            "BHD" => Ok(Self::Bhd),
            "KWD" => Ok(Self::Kwd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
