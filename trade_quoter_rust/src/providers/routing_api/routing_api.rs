use std::num::NonZeroU32;

use async_trait::async_trait;
use error_stack::{ResultExt, report};
use quote_models::constants::chains::ChainId;
use quote_models::models::currency::Currency;
use quote_models::network::RateLimitWindow;
use quote_models::network::client_rate_limit::Client;
use quote_models::network::http::{handle_reqwest_response, value_to_sorted_querystring};
use serde_json::json;

use crate::error::{Error, QuoterResult};
use crate::models::quote::{QuoteQuery, QuoteResult, RouteHop};
use crate::providers::routing_api::responses::{RoutePoolInfo, RoutingQuoteResponse, TokenInfo};
use crate::providers::{QuoteProvider, rate_limited_client, unrestricted_client};

/// HTTP client for the route-quoting service. The service itself is a
/// black box: it receives the canonical pair/amount/direction payload and
/// answers with the best route it found plus the block it priced against.
#[derive(Debug, Clone)]
pub struct RoutingApiProvider {
    client: Client,
    api_key: Option<String>,
}

impl RoutingApiProvider {
    pub fn new() -> Self {
        Self {
            client: unrestricted_client(),
            api_key: None,
        }
    }

    pub fn with_rate_limit(limit: RateLimitWindow, burst: Option<NonZeroU32>) -> Self {
        Self {
            client: rate_limited_client(limit, burst),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for RoutingApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches a quote from the routing service for a token pair.
///
/// # Arguments
///
/// * `quote_query` - Canonical quote request data
pub async fn get_routing_api_quote(
    client: &Client,
    quote_query: &QuoteQuery,
    api_key: Option<&str>,
) -> QuoterResult<QuoteResult> {
    let query_value = json!({
        "tokenInAddress": quote_query.token_in.address,
        "tokenInChainId": quote_query.token_in.chain,
        "tokenOutAddress": quote_query.token_out.address,
        "tokenOutChainId": quote_query.token_out.chain,
        "amount": quote_query.amount.raw.to_string(),
        "type": quote_query.trade_type.as_str(),
    });
    let query_string =
        value_to_sorted_querystring(&query_value).change_context(Error::ModelsError)?;
    let base_url = quote_query
        .endpoint_override
        .as_deref()
        .unwrap_or(&quote_query.provider_url);
    let url = format!("{base_url}quote?{query_string}");

    let request = {
        let client = client.inner_client();
        let mut request = client.get(&url);
        if let Some(key) = api_key {
            request = request.header("x-api-key", key);
        }
        request
            .build()
            .change_context(Error::ReqwestError)
            .attach_printable("Error building routing API request")?
    };

    let response: RoutingQuoteResponse = handle_reqwest_response(
        client
            .execute(request)
            .await
            .change_context(Error::ReqwestError)?,
    )
    .await
    .change_context(Error::ResponseError)
    .attach_printable("Failed to decode routing API quote response")?;

    quote_result_from_response(response)
}

fn quote_result_from_response(response: RoutingQuoteResponse) -> QuoterResult<QuoteResult> {
    let mut route = Vec::with_capacity(response.route.len());
    for path in response.route {
        let mut hops = Vec::with_capacity(path.len());
        for pool in path {
            hops.push(route_hop_from_pool(pool)?);
        }
        route.push(hops);
    }

    Ok(QuoteResult {
        amount: response.amount,
        amount_quote: response.quote,
        block_number: response.blockNumber,
        gas_use_estimate_usd: response.gasUseEstimateUSD,
        route,
    })
}

fn route_hop_from_pool(pool: RoutePoolInfo) -> QuoterResult<RouteHop> {
    Ok(RouteHop {
        pool: pool.address,
        token_in: currency_from_token_info(pool.tokenIn)?,
        token_out: currency_from_token_info(pool.tokenOut)?,
    })
}

fn currency_from_token_info(token: TokenInfo) -> QuoterResult<Currency> {
    let chain = ChainId::try_from(token.chainId).map_err(|e| {
        report!(Error::ParseError)
            .attach_printable(format!("Unknown chain in route token: {e:?}"))
    })?;
    let mut currency = Currency::new(chain, token.address, token.decimals);
    if let Some(symbol) = token.symbol {
        currency = currency.with_symbol(symbol);
    }
    Ok(currency)
}

#[async_trait]
impl QuoteProvider for RoutingApiProvider {
    async fn fetch_quote(&self, query: &QuoteQuery) -> QuoterResult<QuoteResult> {
        get_routing_api_quote(&self.client, query, self.api_key.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TradeType;
    use crate::tests::{token_a, token_b};
    use quote_models::models::currency::CurrencyAmount;
    use rust_decimal::Decimal;

    fn sample_response() -> RoutingQuoteResponse {
        RoutingQuoteResponse {
            amount: 100,
            quote: 95,
            blockNumber: 1000,
            gasUseEstimateUSD: Decimal::new(125, 2),
            route: vec![vec![RoutePoolInfo {
                address: "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640".to_string(),
                tokenIn: TokenInfo {
                    chainId: 1,
                    address: token_a().address,
                    decimals: 18,
                    symbol: Some("TKA".to_string()),
                },
                tokenOut: TokenInfo {
                    chainId: 1,
                    address: token_b().address,
                    decimals: 6,
                    symbol: Some("TKB".to_string()),
                },
            }]],
        }
    }

    #[test]
    fn test_quote_result_from_response() {
        let result = quote_result_from_response(sample_response()).unwrap();
        assert_eq!(result.amount, 100);
        assert_eq!(result.amount_quote, 95);
        assert_eq!(result.block_number, 1000);
        assert_eq!(result.route[0][0].token_in, token_a());
        assert_eq!(result.route[0][0].token_out, token_b());
    }

    #[test]
    fn test_quote_result_rejects_unknown_chain() {
        let mut response = sample_response();
        response.route[0][0].tokenIn.chainId = 123456;
        assert!(quote_result_from_response(response).is_err());
    }

    #[test]
    fn test_query_url_is_canonical() {
        let query = QuoteQuery {
            token_in: token_a(),
            token_out: token_b(),
            amount: CurrencyAmount::from_raw(token_a(), 100),
            trade_type: TradeType::ExactIn,
            endpoint_override: None,
            provider_url: "http://localhost:0/".to_string(),
        };
        let query_value = json!({
            "tokenInAddress": query.token_in.address,
            "tokenInChainId": query.token_in.chain,
            "tokenOutAddress": query.token_out.address,
            "tokenOutChainId": query.token_out.chain,
            "amount": query.amount.raw.to_string(),
            "type": query.trade_type.as_str(),
        });
        let qs = value_to_sorted_querystring(&query_value).unwrap();
        assert_eq!(
            qs,
            format!(
                "amount=100&tokenInAddress={}&tokenInChainId=1&tokenOutAddress={}&tokenOutChainId=1&type=exactIn",
                token_a().address,
                token_b().address
            )
        );
    }
}
