use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ISO 4217 currency together with the number of decimal places of its
/// smallest denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency {
    code: &'static str,
    exponent: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurrencyError {
    Unsupported(String),
    InvalidAmount(f64),
}

impl fmt::Display for CurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyError::Unsupported(code) => write!(f, "Unsupported currency: {code}"),
            CurrencyError::InvalidAmount(amount) => write!(f, "Invalid amount: {amount}"),
        }
    }
}

impl std::error::Error for CurrencyError {}

const fn currency(code: &'static str, exponent: u32) -> Currency {
    Currency { code, exponent }
}

impl Currency {
    /// Algerian dinar. Amounts are tracked in whole dinars.
    pub const DZD: Currency = currency("DZD", 0);
    pub const USD: Currency = currency("USD", 2);
    pub const EUR: Currency = currency("EUR", 2);
    pub const GBP: Currency = currency("GBP", 2);
    pub const JPY: Currency = currency("JPY", 0);
    pub const KRW: Currency = currency("KRW", 0);
    pub const KWD: Currency = currency("KWD", 3);

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Number of smallest units in one major unit.
    pub fn multiplier(&self) -> i64 {
        10_i64.pow(self.exponent)
    }

    pub fn all() -> &'static [Currency] {
        SUPPORTED
    }
}

static SUPPORTED: &[Currency] = &[
    Currency::DZD,
    // zero-decimal
    Currency::JPY,
    Currency::KRW,
    currency("VND", 0),
    currency("CLP", 0),
    currency("ISK", 0),
    currency("XOF", 0),
    currency("XAF", 0),
    // three-decimal
    Currency::KWD,
    currency("BHD", 3),
    currency("OMR", 3),
    currency("JOD", 3),
    currency("TND", 3),
    currency("IQD", 3),
    currency("LYD", 3),
    // centesimal
    Currency::USD,
    Currency::EUR,
    Currency::GBP,
    currency("CAD", 2),
    currency("AUD", 2),
    currency("NZD", 2),
    currency("CHF", 2),
    currency("SEK", 2),
    currency("NOK", 2),
    currency("DKK", 2),
    currency("PLN", 2),
    currency("MAD", 2),
    currency("EGP", 2),
    currency("SAR", 2),
    currency("AED", 2),
    currency("QAR", 2),
    currency("TRY", 2),
    currency("INR", 2),
    currency("CNY", 2),
    currency("HKD", 2),
    currency("SGD", 2),
    currency("BRL", 2),
    currency("MXN", 2),
    currency("NGN", 2),
    currency("ZAR", 2),
];

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        SUPPORTED
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .copied()
            .ok_or_else(|| CurrencyError::Unsupported(code.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// Convert a decimal amount into an integer count of the currency's smallest
/// denomination, rounding half away from zero.
pub fn to_smallest_unit(amount: f64, currency: Currency) -> Result<i64, CurrencyError> {
    if !amount.is_finite() {
        return Err(CurrencyError::InvalidAmount(amount));
    }

    let scaled = (amount * currency.multiplier() as f64).round();

    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
        return Err(CurrencyError::InvalidAmount(amount));
    }

    Ok(scaled as i64)
}

pub fn from_smallest_unit(units: i64, currency: Currency) -> f64 {
    units as f64 / currency.multiplier() as f64
}
