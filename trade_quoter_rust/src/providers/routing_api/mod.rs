pub mod responses;
#[allow(clippy::module_inception)]
pub mod routing_api;

pub use routing_api::RoutingApiProvider;

pub const DEFAULT_ROUTING_API_URL: &str = "https://api.uniswap.org/v1/";
