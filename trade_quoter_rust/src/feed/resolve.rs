use quote_models::models::currency::Currency;
use tracing::debug;

use crate::TradeType;
use crate::error::ReportDisplayExt;
use crate::models::quote::{QuoteQuery, QuoteResult};
use crate::models::trade::{ResolvedTrade, Trade, TradeStatus};

/// Everything the resolver is allowed to look at. Signals are passed in
/// explicitly so resolution stays a pure function of its inputs.
#[derive(Clone, Copy, Debug)]
pub struct ResolveInputs<'a> {
    pub currency_in: Option<&'a Currency>,
    pub currency_out: Option<&'a Currency>,
    pub trade_type: TradeType,
    /// Active request, or `None` for the "no request" sentinel.
    pub query: Option<&'a QuoteQuery>,
    /// A fetch for the active request is in flight and there is no
    /// previous result to show in the meantime.
    pub fetching_first_load: bool,
    /// The most recent fetch attempt failed.
    pub errored: bool,
    /// The result on display, already passed through the block-validity
    /// filter. May belong to a superseded request while a newer fetch is
    /// pending.
    pub quote: Option<&'a QuoteResult>,
    /// The shown result belongs to a superseded request.
    pub syncing: bool,
}

/// Collapses the raw quote signals into one discrete status, first
/// matching rule wins:
///
/// 1. a missing currency side is `Invalid`;
/// 2. a first-load fetch with nothing to show is `Loading`;
/// 3. a failed fetch, an absent or routeless quote, or the "no request"
///    sentinel is `NoRouteFound`;
/// 4. a quote the trade cannot be built from is `Invalid` (the
///    construction failure is absorbed here, never propagated);
/// 5. otherwise `Valid`, or `Syncing` when the shown result belongs to a
///    superseded request and the fresh one is still pending.
pub fn resolve_trade(inputs: ResolveInputs<'_>) -> ResolvedTrade {
    let (Some(currency_in), Some(currency_out)) = (inputs.currency_in, inputs.currency_out)
    else {
        return ResolvedTrade::without_trade(TradeStatus::Invalid);
    };

    // a first load can only be in flight for an actual request; with the
    // "no request" sentinel active there is nothing to wait for
    if inputs.query.is_some() && inputs.fetching_first_load {
        return ResolvedTrade::without_trade(TradeStatus::Loading);
    }

    let no_route = inputs.errored
        || inputs.query.is_none()
        || !inputs.quote.is_some_and(QuoteResult::has_route);
    if no_route {
        return ResolvedTrade::without_trade(TradeStatus::NoRouteFound);
    }
    let Some(quote) = inputs.quote else {
        return ResolvedTrade::without_trade(TradeStatus::NoRouteFound);
    };

    match Trade::from_quote(currency_in, currency_out, inputs.trade_type, quote) {
        Ok(trade) => {
            let status = if inputs.syncing {
                TradeStatus::Syncing
            } else {
                TradeStatus::Valid
            };
            ResolvedTrade::new(status, Some(trade))
        }
        Err(report) => {
            debug!(reason = %report.format(), "UnusableQuote");
            ResolvedTrade::without_trade(TradeStatus::Invalid)
        }
    }
}
