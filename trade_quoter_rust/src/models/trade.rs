use error_stack::report;
use quote_models::models::currency::{Currency, CurrencyAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::TradeType;
use crate::error::{Error, QuoterResult};
use crate::models::quote::{QuoteResult, RouteHop};

/// Discrete status derived from the raw quote signals. Exactly one value
/// holds at any instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Inputs are unusable (missing currency, malformed route).
    Invalid,
    /// First fetch for the active request is in flight and there is no
    /// previous result to show.
    Loading,
    /// The service answered with no viable route, the fetch failed, or no
    /// request is active.
    NoRouteFound,
    /// A previous result is shown while a fetch for a newer request is
    /// still pending.
    Syncing,
    /// The shown result belongs to the active request.
    Valid,
}

/// Derived, immutable view of a quote as a concrete exchange. Rebuilt
/// from scratch whenever the inputs or the quote change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub input_amount: CurrencyAmount,
    pub output_amount: CurrencyAmount,
    pub trade_type: TradeType,
    pub route: Vec<Vec<RouteHop>>,
    pub gas_use_estimate_usd: Decimal,
}

impl Trade {
    /// Builds a trade from a raw quote plus the two currencies. Fails on
    /// an empty route, zero amounts, or route endpoints that disagree
    /// with the requested pair. Callers are expected to treat the failure
    /// as "no valid trade" rather than propagate it.
    pub fn from_quote(
        currency_in: &Currency,
        currency_out: &Currency,
        trade_type: TradeType,
        quote: &QuoteResult,
    ) -> QuoterResult<Trade> {
        if !quote.has_route() {
            return Err(report!(Error::RouteError("Quote carries no route".to_string())));
        }
        if quote.amount == 0 || quote.amount_quote == 0 {
            return Err(report!(Error::RouteError(
                "Quote carries a zero amount".to_string()
            )));
        }

        for path in &quote.route {
            validate_path_endpoints(path, currency_in, currency_out)?;
        }

        let (input_raw, output_raw) = match trade_type {
            TradeType::ExactIn => (quote.amount, quote.amount_quote),
            TradeType::ExactOut => (quote.amount_quote, quote.amount),
        };

        Ok(Trade {
            input_amount: CurrencyAmount::from_raw(currency_in.clone(), input_raw),
            output_amount: CurrencyAmount::from_raw(currency_out.clone(), output_raw),
            trade_type,
            route: quote.route.clone(),
            gas_use_estimate_usd: quote.gas_use_estimate_usd,
        })
    }
}

/// Every path must start at the input currency and end at the output
/// currency. Native-asset sides are exempt: pools hold the wrapped
/// representation, whose address this crate does not track.
fn validate_path_endpoints(
    path: &[RouteHop],
    currency_in: &Currency,
    currency_out: &Currency,
) -> QuoterResult<()> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Err(report!(Error::RouteError("Empty route path".to_string())));
    };

    if !currency_in.is_native() && first.token_in != *currency_in {
        return Err(report!(Error::RouteError(format!(
            "Route starts at {} but input is {}",
            first.token_in, currency_in
        ))));
    }
    if !currency_out.is_native() && last.token_out != *currency_out {
        return Err(report!(Error::RouteError(format!(
            "Route ends at {} but output is {}",
            last.token_out, currency_out
        ))));
    }
    Ok(())
}

/// What the consumer observes: a status plus, when one can be built, the
/// trade itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrade {
    pub status: TradeStatus,
    pub trade: Option<Trade>,
}

impl ResolvedTrade {
    pub fn new(status: TradeStatus, trade: Option<Trade>) -> Self {
        Self { status, trade }
    }

    pub fn without_trade(status: TradeStatus) -> Self {
        Self {
            status,
            trade: None,
        }
    }
}

impl Default for ResolvedTrade {
    fn default() -> Self {
        Self::without_trade(TradeStatus::Invalid)
    }
}
