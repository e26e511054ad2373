use error_stack::report;
use quote_models::models::currency::{Currency, CurrencyAmount};
use tracing::trace;

use crate::TradeType;
use crate::error::{Error, QuoterResult};
use crate::models::quote::QuoteQuery;

/// Passes the debounced amount through only while the consuming surface
/// is visible and the amount's chain is supported. Anything ambiguous
/// fails closed: downstream sees "no amount" and stops querying.
pub fn gate_amount(
    amount: Option<CurrencyAmount>,
    surface_visible: bool,
) -> Option<CurrencyAmount> {
    let amount = amount?;
    if !surface_visible {
        trace!("GateSuppressed: surface not visible");
        return None;
    }
    if !amount.currency.chain.is_supported() {
        trace!(chain = %amount.currency.chain, "GateSuppressed: unsupported chain");
        return None;
    }
    Some(amount)
}

/// Builds the canonical quote request, or `None` when no request should
/// be issued: a side of the pair is missing, the amount is zero, or both
/// sides resolve to the same asset.
///
/// A currency on a chain outside the allow-list is a hard error rather
/// than a skipped request, so callers can never silently query an
/// unsupported network.
pub fn build_quote_query(
    amount: Option<&CurrencyAmount>,
    other_currency: Option<&Currency>,
    trade_type: TradeType,
    endpoint_override: Option<&str>,
    provider_url: &str,
) -> QuoterResult<Option<QuoteQuery>> {
    let (Some(amount), Some(other_currency)) = (amount, other_currency) else {
        return Ok(None);
    };
    if amount.is_zero() {
        return Ok(None);
    }
    if amount.currency == *other_currency {
        return Ok(None);
    }

    for chain in [amount.currency.chain, other_currency.chain] {
        if !chain.is_supported() {
            return Err(report!(Error::UnsupportedChain(chain)));
        }
    }

    let (token_in, token_out) = match trade_type {
        TradeType::ExactIn => (amount.currency.clone(), other_currency.clone()),
        TradeType::ExactOut => (other_currency.clone(), amount.currency.clone()),
    };

    Ok(Some(QuoteQuery {
        token_in,
        token_out,
        amount: amount.clone(),
        trade_type,
        endpoint_override: endpoint_override.map(str::to_string),
        provider_url: provider_url.to_string(),
    }))
}
