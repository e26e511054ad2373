pub mod routing_api;

use std::num::NonZeroU32;

use async_trait::async_trait;
use lazy_static::lazy_static;
use quote_models::network::RateLimitWindow;
use quote_models::network::client_rate_limit::{Client, RateLimitedClient};
use reqwest::Client as ReqwestClient;

use crate::error::QuoterResult;
use crate::models::quote::{QuoteQuery, QuoteResult};

lazy_static! {
    static ref HTTP_CLIENT: ReqwestClient = ReqwestClient::new();
}

/// One shared connection pool per process for providers without a rate
/// limit. reqwest clients are cheaply cloneable handles.
pub fn unrestricted_client() -> Client {
    Client::Unrestricted(HTTP_CLIENT.clone())
}

pub fn rate_limited_client(limit: RateLimitWindow, burst: Option<NonZeroU32>) -> Client {
    Client::RateLimited(RateLimitedClient::new(limit, burst))
}

/// Black-box quoting service. Requests must be idempotent reads: the
/// fetcher re-issues the same query on a fixed interval, and cancels by
/// dropping the in-flight future.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, query: &QuoteQuery) -> QuoterResult<QuoteResult>;
}
