use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

// QUOTE
#[allow(non_snake_case)]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenInfo {
    pub chainId: u32,
    pub address: String,
    pub decimals: u8,
    pub symbol: Option<String>,
}

#[allow(non_snake_case)]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoutePoolInfo {
    pub address: String,
    pub tokenIn: TokenInfo,
    pub tokenOut: TokenInfo,
}

#[allow(non_snake_case)]
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoutingQuoteResponse {
    /// Specified-side amount the quote was computed for, raw units.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
    /// Quoted amount on the other side, raw units.
    #[serde_as(as = "DisplayFromStr")]
    pub quote: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub blockNumber: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub gasUseEstimateUSD: Decimal,
    pub route: Vec<Vec<RoutePoolInfo>>,
}
