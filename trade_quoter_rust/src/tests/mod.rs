use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use error_stack::report;
use quote_models::constants::chains::ChainId;
use quote_models::models::currency::{Currency, CurrencyAmount};
use rust_decimal::Decimal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::TradeType;
use crate::error::{Error, QuoterResult};
use crate::models::quote::{QuoteQuery, QuoteResult, RouteHop};
use crate::providers::QuoteProvider;

pub fn init_tracing_in_tests() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().pretty().with_ansi(true))
        .try_init()
        .ok();
}

pub fn token_a() -> Currency {
    Currency::new(
        ChainId::Ethereum,
        "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
        18,
    )
    .with_symbol("TKA")
}

pub fn token_b() -> Currency {
    Currency::new(
        ChainId::Ethereum,
        "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
        6,
    )
    .with_symbol("TKB")
}

/// Single-hop quote from `token_in` to `token_out` at block 1000.
pub fn quote_between(
    token_in: &Currency,
    token_out: &Currency,
    amount: u128,
    amount_quote: u128,
) -> QuoteResult {
    QuoteResult {
        amount,
        amount_quote,
        block_number: 1000,
        gas_use_estimate_usd: Decimal::new(125, 2),
        route: vec![vec![RouteHop {
            pool: "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640".to_string(),
            token_in: token_in.clone(),
            token_out: token_out.clone(),
        }]],
    }
}

pub fn query_between(
    token_in: &Currency,
    token_out: &Currency,
    amount: u128,
    trade_type: TradeType,
) -> QuoteQuery {
    let specified = match trade_type {
        TradeType::ExactIn => token_in.clone(),
        TradeType::ExactOut => token_out.clone(),
    };
    QuoteQuery {
        token_in: token_in.clone(),
        token_out: token_out.clone(),
        amount: CurrencyAmount::from_raw(specified, amount),
        trade_type,
        endpoint_override: None,
        provider_url: "http://localhost:0/".to_string(),
    }
}

type MockHandler = Box<dyn Fn(&QuoteQuery) -> Result<QuoteResult, Error> + Send + Sync>;

/// Scriptable provider for feed and fetcher tests. Each call waits out
/// `delay` (virtual time under a paused runtime) before answering, so
/// tests can observe in-flight states deterministically.
pub struct MockProvider {
    delay: Duration,
    calls: AtomicUsize,
    handler: Mutex<MockHandler>,
}

impl MockProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            handler: Mutex::new(Box::new(|query| {
                Ok(quote_between(
                    &query.token_in,
                    &query.token_out,
                    query.amount.raw,
                    query.amount.raw.saturating_mul(95) / 100,
                ))
            })),
        }
    }

    pub fn set_handler(
        &self,
        handler: impl Fn(&QuoteQuery) -> Result<QuoteResult, Error> + Send + Sync + 'static,
    ) {
        *self.handler.lock().unwrap() = Box::new(handler);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    async fn fetch_quote(&self, query: &QuoteQuery) -> QuoterResult<QuoteResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = (self.handler.lock().unwrap())(query);
        result.map_err(|e| report!(e))
    }
}
