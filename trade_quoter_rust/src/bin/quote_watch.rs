use std::process;
use std::sync::Arc;

use quote_models::constants::chains::ChainId;
use quote_models::log::init_tracing;
use quote_models::models::currency::Currency;
use quote_models::network::RateLimitWindow;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use trade_quoter_rust::TradeType;
use trade_quoter_rust::feed::blocks::LatestBlockOracle;
use trade_quoter_rust::feed::{QuoteFeed, QuoteFeedConfig};
use trade_quoter_rust::models::trade::TradeStatus;
use trade_quoter_rust::providers::routing_api::{DEFAULT_ROUTING_API_URL, RoutingApiProvider};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("quote_watch error: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    dotenv::dotenv().ok();
    init_tracing(false);

    let provider_url =
        std::env::var("ROUTING_API_URL").unwrap_or_else(|_| DEFAULT_ROUTING_API_URL.to_string());
    let api_key = std::env::var("ROUTING_API_KEY").ok();
    let rate_limit = std::env::var("ROUTING_API_RATE_LIMIT")
        .ok()
        .and_then(|s| RateLimitWindow::from_string(&s));

    let mut provider = match rate_limit {
        Some(limit) => RoutingApiProvider::with_rate_limit(limit, None),
        None => RoutingApiProvider::new(),
    };
    if let Some(key) = api_key {
        provider = provider.with_api_key(key);
    }

    let oracle = Arc::new(LatestBlockOracle::default());
    let config = QuoteFeedConfig {
        provider_url,
        ..QuoteFeedConfig::default()
    };
    let (handle, _feed_task) = QuoteFeed::spawn(config, Arc::new(provider), oracle.clone());

    // Trade state listener
    let mut state = handle.subscribe();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let resolved = state.borrow().clone();
            match (&resolved.status, &resolved.trade) {
                (TradeStatus::Valid | TradeStatus::Syncing, Some(trade)) => {
                    println!(
                        "[{}] {} -> {} (gas ~${})",
                        resolved.status,
                        trade.input_amount,
                        trade.output_amount,
                        trade.gas_use_estimate_usd
                    );
                }
                (status, _) => println!("[{status}]"),
            }
        }
    });

    println!("Interactive quote watcher ready.");
    println!("Commands:");
    println!("  pair <chain_id:u32> <token_in> <decimals_in:u8> <token_out> <decimals_out:u8>");
    println!("  in <amount>     quote with the typed amount as exact input");
    println!("  out <amount>    quote with the typed amount as exact output");
    println!("  clear           drop the typed amount");
    println!("  show | hide     toggle surface visibility");
    println!("  block <n:u64>   feed the freshness oracle a block number");
    println!("  quit");

    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();

        match cmd {
            "quit" | "exit" => {
                println!("Exiting…");
                break;
            }

            "pair" => {
                let parsed = parse_pair(&mut parts);
                let Some((currency_in, currency_out)) = parsed else {
                    println!("usage: pair <chain_id> <token_in> <decimals_in> <token_out> <decimals_out>");
                    continue;
                };
                match handle.set_pair(Some(currency_in), Some(currency_out)).await {
                    Ok(()) => println!("pair set"),
                    Err(err) => println!("pair rejected: {err}"),
                }
            }

            "in" | "out" => {
                let trade_type = if cmd == "in" {
                    TradeType::ExactIn
                } else {
                    TradeType::ExactOut
                };
                let Some(amount) = parts.next() else {
                    println!("usage: {cmd} <amount>");
                    continue;
                };
                if let Err(err) = handle.set_amount(Some(amount.to_string()), trade_type).await {
                    println!("amount rejected: {err}");
                }
            }

            "clear" => {
                if let Err(err) = handle.set_amount(None, TradeType::ExactIn).await {
                    println!("clear failed: {err}");
                }
            }

            "show" | "hide" => {
                if let Err(err) = handle.set_visible(cmd == "show").await {
                    println!("visibility update failed: {err}");
                }
            }

            "block" => {
                let Some(block) = parts.next().and_then(|v| v.parse::<u64>().ok()) else {
                    println!("usage: block <n:u64>");
                    continue;
                };
                oracle.observe(block);
                println!("oracle tip: {:?}", oracle.tip());
            }

            other => println!("unknown command: {other}"),
        }
    }

    Ok(())
}

fn parse_pair(parts: &mut std::str::SplitWhitespace<'_>) -> Option<(Currency, Currency)> {
    let chain_id: u32 = parts.next()?.parse().ok()?;
    let chain = ChainId::try_from(chain_id).ok()?;
    let token_in = parts.next()?.to_string();
    let decimals_in: u8 = parts.next()?.parse().ok()?;
    let token_out = parts.next()?.to_string();
    let decimals_out: u8 = parts.next()?.parse().ok()?;
    Some((
        Currency::new(chain, token_in, decimals_in),
        Currency::new(chain, token_out, decimals_out),
    ))
}
