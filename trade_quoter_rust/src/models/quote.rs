use quote_models::models::currency::{Currency, CurrencyAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TradeType;

/// Canonical quote request descriptor. Value equality is what drives
/// request de-duplication and polling continuation: the fetcher keeps
/// refetching while the active query compares equal, and cancels and
/// restarts when it does not.
///
/// Never constructed with a missing token or amount; the builder returns
/// `None` ("no request") instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteQuery {
    pub token_in: Currency,
    pub token_out: Currency,
    /// Specified-side amount: amount IN for exact IN trades, amount OUT
    /// for exact OUT trades.
    pub amount: CurrencyAmount,
    pub trade_type: TradeType,
    pub endpoint_override: Option<String>,
    pub provider_url: String,
}

/// One pool traversal within a quoted route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub pool: String,
    pub token_in: Currency,
    pub token_out: Currency,
}

/// Raw response from the quoting service. Immutable once received and
/// replaced wholesale on every successful fetch; nothing is ever merged
/// into an existing result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    /// Echo of the specified-side amount the quote was computed for.
    pub amount: u128,
    /// Quoted amount on the non-specified side: amount OUT for exact IN
    /// trades, amount IN for exact OUT trades.
    pub amount_quote: u128,
    /// Block the quote was computed against.
    pub block_number: u64,
    pub gas_use_estimate_usd: Decimal,
    /// Parallel route paths, each a sequence of pool hops. Empty means
    /// the service found no route.
    pub route: Vec<Vec<RouteHop>>,
}

impl QuoteResult {
    pub fn has_route(&self) -> bool {
        !self.route.is_empty()
    }
}
