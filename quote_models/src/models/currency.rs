use std::cmp::Ordering;
use std::fmt;

use error_stack::{ResultExt, report};
use serde::{Deserialize, Serialize};

use crate::constants::chains::{ChainId, is_native_token_evm_address};
use crate::error::{Error, ModelResult};

/// Asset identity: network plus on-chain address plus decimal precision.
/// Two currencies are the same asset iff chain and address match
/// (addresses compared case-insensitively).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Currency {
    pub chain: ChainId,
    pub address: String,
    pub decimals: u8,
    pub symbol: Option<String>,
}

impl Currency {
    pub fn new(chain: ChainId, address: impl Into<String>, decimals: u8) -> Self {
        Self {
            chain,
            address: address.into(),
            decimals,
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// True for the chain's native asset placeholder addresses.
    pub fn is_native(&self) -> bool {
        is_native_token_evm_address(&self.address)
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.chain == other.chain && self.address.eq_ignore_ascii_case(&other.address)
    }
}

impl Eq for Currency {}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{symbol}"),
            None => write!(f, "{}@{}", self.address, self.chain),
        }
    }
}

/// A quantity of a specific currency, held as a raw integer in the
/// currency's smallest units. Comparisons are only defined between
/// amounts of the same currency; the checked variants report a
/// mismatch instead of silently comparing raw values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: Currency,
    pub raw: u128,
}

impl CurrencyAmount {
    pub fn from_raw(currency: Currency, raw: u128) -> Self {
        Self { currency, raw }
    }

    /// Builds an amount from a user-typed decimal string like "1.5",
    /// scaled by the currency's decimals.
    pub fn from_typed_str(currency: Currency, typed: &str) -> ModelResult<Self> {
        let raw = decimal_string_to_u128(typed, currency.decimals)
            .attach_printable_lazy(|| format!("Failed to parse typed amount {typed:?}"))?;
        Ok(Self { currency, raw })
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }

    pub fn checked_cmp(&self, other: &CurrencyAmount) -> ModelResult<Ordering> {
        if self.currency != other.currency {
            return Err(report!(Error::CurrencyMismatch(format!(
                "Cannot compare {} against {}",
                self.currency, other.currency
            ))));
        }
        Ok(self.raw.cmp(&other.raw))
    }

    pub fn checked_gt(&self, other: &CurrencyAmount) -> ModelResult<bool> {
        Ok(self.checked_cmp(other)? == Ordering::Greater)
    }

    pub fn checked_eq(&self, other: &CurrencyAmount) -> ModelResult<bool> {
        Ok(self.checked_cmp(other)? == Ordering::Equal)
    }

    /// Lossy conversion for display and logging only.
    pub fn as_f64(&self) -> f64 {
        u128_to_f64(self.raw, self.currency.decimals)
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.as_f64(), self.currency)
    }
}

/// Parses a decimal string into raw smallest units. Digits beyond the
/// currency's precision are truncated, not rounded.
pub fn decimal_string_to_u128(s: &str, decimals: u8) -> ModelResult<u128> {
    let decimals: usize = decimals.into();
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() > 2 {
        return Err(report!(Error::ParseError)
            .attach_printable(format!("More than one decimal point in {s:?}")));
    }

    let integer_part = if parts[0].is_empty() {
        0u128
    } else {
        parts[0].parse::<u128>().change_context(Error::ParseError)?
    };

    let decimal_part = if parts.len() > 1 && !parts[1].is_empty() {
        let decimal_str = parts[1];
        let trimmed = if decimal_str.len() > decimals {
            &decimal_str[..decimals]
        } else {
            decimal_str
        };

        if trimmed.is_empty() {
            0
        } else {
            let decimal_value = trimmed.parse::<u128>().change_context(Error::ParseError)?;
            let scaling_factor = 10u128.pow((decimals - trimmed.len()) as u32);
            decimal_value * scaling_factor
        }
    } else {
        0
    };

    integer_part
        .checked_mul(10u128.pow(decimals as u32))
        .and_then(|scaled| scaled.checked_add(decimal_part))
        .ok_or_else(|| {
            report!(Error::AmountOverflow(format!(
                "{s} does not fit in u128 at {decimals} decimals"
            )))
        })
}

pub fn u128_to_f64(value: u128, decimals: u8) -> f64 {
    // Divide in integer space first to minimize precision loss
    let divisor = 10u128.pow(decimals as u32);
    let whole_part = (value / divisor) as f64;
    let fractional_part = (value % divisor) as f64 / divisor as f64;

    whole_part + fractional_part
}
