pub mod blocks;
pub mod debounce;
pub mod fetcher;
pub mod query;
pub mod resolve;

use std::sync::Arc;
use std::time::Duration;

use error_stack::{ResultExt, report};
use quote_models::models::currency::{Currency, CurrencyAmount};
use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::TradeType;
use crate::error::{Error, QuoterResult, ReportDisplayExt};
use crate::feed::blocks::{BlockOracle, filter_stale_quote};
use crate::feed::debounce::Debouncer;
use crate::feed::fetcher::{FetchSnapshot, QuoteFetcher};
use crate::feed::query::{build_quote_query, gate_amount};
use crate::feed::resolve::{ResolveInputs, resolve_trade};
use crate::models::quote::QuoteQuery;
use crate::models::trade::ResolvedTrade;
use crate::providers::QuoteProvider;
use crate::providers::routing_api::DEFAULT_ROUTING_API_URL;

type Responder<T> = oneshot::Sender<Result<T, Error>>;

#[derive(Debug)]
pub enum FeedCommand {
    SetPair {
        currency_in: Option<Currency>,
        currency_out: Option<Currency>,
        resp: Responder<()>,
    },
    SetAmount {
        typed: Option<String>,
        trade_type: TradeType,
        resp: Responder<()>,
    },
    SetVisible(bool),
}

#[derive(Clone, Debug)]
pub struct QuoteFeedConfig {
    /// Quiet window an edit must survive before it reaches the network.
    pub debounce_window: Duration,
    /// Refetch cadence while the active query is unchanged.
    pub poll_interval: Duration,
    pub provider_url: String,
    pub endpoint_override: Option<String>,
    pub command_buffer: usize,
}

impl Default for QuoteFeedConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(200),
            poll_interval: Duration::from_secs(15),
            provider_url: DEFAULT_ROUTING_API_URL.to_string(),
            endpoint_override: None,
            command_buffer: 64,
        }
    }
}

/// Pair of values the debouncer guards: the specified-side amount and
/// the currency on the other side. Everything else reaches the resolver
/// undebounced.
#[derive(Clone, Debug, Default, PartialEq)]
struct DebouncedInputs {
    amount: Option<CurrencyAmount>,
    other_currency: Option<Currency>,
}

/// Command handle plus state subscription for a running [`QuoteFeed`].
#[derive(Clone, Debug)]
pub struct QuoteFeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    state: watch::Receiver<ResolvedTrade>,
}

impl QuoteFeedHandle {
    /// Replaces the currency pair. Rejects currencies on networks
    /// outside the allow-list without touching the current pair; that
    /// rejection is the one error of this interface that callers must
    /// handle instead of reading it off the trade state.
    pub async fn set_pair(
        &self,
        currency_in: Option<Currency>,
        currency_out: Option<Currency>,
    ) -> QuoterResult<()> {
        let (resp_sender, resp_receiver) = oneshot::channel();
        self.commands
            .send(FeedCommand::SetPair {
                currency_in,
                currency_out,
                resp: resp_sender,
            })
            .await
            .change_context(Error::FeedClosed)
            .attach_printable("Failed to send pair update")?;
        Self::await_response(resp_receiver).await
    }

    /// Replaces the user-typed amount on the side given by `trade_type`.
    /// `None` clears the amount.
    pub async fn set_amount(
        &self,
        typed: Option<String>,
        trade_type: TradeType,
    ) -> QuoterResult<()> {
        let (resp_sender, resp_receiver) = oneshot::channel();
        self.commands
            .send(FeedCommand::SetAmount {
                typed,
                trade_type,
                resp: resp_sender,
            })
            .await
            .change_context(Error::FeedClosed)
            .attach_printable("Failed to send amount update")?;
        Self::await_response(resp_receiver).await
    }

    pub async fn set_visible(&self, visible: bool) -> QuoterResult<()> {
        self.commands
            .send(FeedCommand::SetVisible(visible))
            .await
            .change_context(Error::FeedClosed)
            .attach_printable("Failed to send visibility update")
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolvedTrade> {
        self.state.clone()
    }

    pub fn latest(&self) -> ResolvedTrade {
        self.state.borrow().clone()
    }

    async fn await_response(receiver: oneshot::Receiver<Result<(), Error>>) -> QuoterResult<()> {
        match receiver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(report!(e)),
            Err(_) => Err(report!(Error::FeedClosed)
                .attach_printable("Feed dropped the response channel")),
        }
    }
}

/// Single-writer actor that owns the whole pipeline: raw inputs come in
/// as commands, a debouncer and a polling fetcher run as child tasks,
/// and every event recomputes gate → query → block filter → resolution
/// before publishing the result. Consumers only ever observe one
/// coherent [`ResolvedTrade`] at a time.
pub struct QuoteFeed<P, O> {
    config: QuoteFeedConfig,
    provider: Arc<P>,
    oracle: Arc<O>,
    receiver: mpsc::Receiver<FeedCommand>,
    state_tx: watch::Sender<ResolvedTrade>,
    currency_in: Option<Currency>,
    currency_out: Option<Currency>,
    typed_amount: Option<String>,
    trade_type: TradeType,
    visible: bool,
}

impl<P, O> QuoteFeed<P, O>
where
    P: QuoteProvider + 'static,
    O: BlockOracle + 'static,
{
    /// Spawns the feed. The surface starts out visible and exact-in.
    pub fn spawn(
        config: QuoteFeedConfig,
        provider: Arc<P>,
        oracle: Arc<O>,
    ) -> (QuoteFeedHandle, JoinHandle<()>) {
        let (command_tx, receiver) = mpsc::channel(config.command_buffer);
        let (state_tx, state_rx) = watch::channel(ResolvedTrade::default());
        let feed = Self {
            config,
            provider,
            oracle,
            receiver,
            state_tx,
            currency_in: None,
            currency_out: None,
            typed_amount: None,
            trade_type: TradeType::ExactIn,
            visible: true,
        };
        let handle = QuoteFeedHandle {
            commands: command_tx,
            state: state_rx,
        };
        (handle, tokio::spawn(feed.run()))
    }

    async fn run(mut self) {
        let (raw_tx, raw_rx) = watch::channel(DebouncedInputs::default());
        let (mut debounced_rx, _debounce_task) =
            Debouncer::spawn(self.config.debounce_window, raw_rx);
        let (query_tx, query_rx) = watch::channel(None::<QuoteQuery>);
        let (mut snapshot_rx, _fetch_task) = QuoteFetcher::spawn(
            self.provider.clone(),
            self.config.poll_interval,
            query_rx,
        );

        loop {
            select! {
                command = self.receiver.recv() => {
                    match command {
                        None => {
                            debug!("QuoteFeedClosed");
                            return;
                        }
                        Some(command) => self.apply_command(command, &raw_tx),
                    }
                }
                changed = debounced_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = snapshot_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }

            let debounced = debounced_rx.borrow().clone();
            let query = self.rebuild_query(&debounced);
            query_tx.send_if_modified(|current| {
                if *current != query {
                    *current = query.clone();
                    true
                } else {
                    false
                }
            });

            let snapshot = snapshot_rx.borrow().clone();
            let resolved = self.resolve(query.as_ref(), &snapshot);
            self.state_tx.send_if_modified(|current| {
                if *current != resolved {
                    *current = resolved.clone();
                    true
                } else {
                    false
                }
            });
        }
    }

    fn apply_command(&mut self, command: FeedCommand, raw_tx: &watch::Sender<DebouncedInputs>) {
        match command {
            FeedCommand::SetPair {
                currency_in,
                currency_out,
                resp,
            } => {
                let outcome = self.set_pair(currency_in, currency_out);
                if resp.send(outcome).is_err() {
                    warn!("SetPair caller went away before the response");
                }
            }
            FeedCommand::SetAmount {
                typed,
                trade_type,
                resp,
            } => {
                self.trade_type = trade_type;
                self.typed_amount = typed;
                let outcome = self.specified_amount().map(|_| ());
                if resp.send(outcome).is_err() {
                    warn!("SetAmount caller went away before the response");
                }
            }
            FeedCommand::SetVisible(visible) => {
                self.visible = visible;
            }
        }

        let inputs = self.debounce_inputs();
        raw_tx.send_if_modified(|current| {
            if *current != inputs {
                *current = inputs.clone();
                true
            } else {
                false
            }
        });
    }

    fn set_pair(
        &mut self,
        currency_in: Option<Currency>,
        currency_out: Option<Currency>,
    ) -> Result<(), Error> {
        for currency in currency_in.iter().chain(currency_out.iter()) {
            if !currency.chain.is_supported() {
                return Err(Error::UnsupportedChain(currency.chain));
            }
        }
        self.currency_in = currency_in;
        self.currency_out = currency_out;
        Ok(())
    }

    /// The typed amount interpreted in the specified-side currency, or
    /// `None` while either half of that interpretation is missing.
    fn specified_amount(&self) -> Result<Option<CurrencyAmount>, Error> {
        let Some(typed) = self.typed_amount.as_deref() else {
            return Ok(None);
        };
        let specified_currency = match self.trade_type {
            TradeType::ExactIn => self.currency_in.clone(),
            TradeType::ExactOut => self.currency_out.clone(),
        };
        let Some(currency) = specified_currency else {
            return Ok(None);
        };
        match CurrencyAmount::from_typed_str(currency, typed) {
            Ok(amount) => Ok(Some(amount)),
            Err(report) => {
                debug!(error = %report, typed, "UnparseableTypedAmount");
                Err(Error::ParseError)
            }
        }
    }

    fn debounce_inputs(&self) -> DebouncedInputs {
        let amount = self.specified_amount().unwrap_or_default();
        let other_currency = match self.trade_type {
            TradeType::ExactIn => self.currency_out.clone(),
            TradeType::ExactOut => self.currency_in.clone(),
        };
        DebouncedInputs {
            amount,
            other_currency,
        }
    }

    fn rebuild_query(&self, debounced: &DebouncedInputs) -> Option<QuoteQuery> {
        let gated = gate_amount(debounced.amount.clone(), self.visible);
        match build_quote_query(
            gated.as_ref(),
            debounced.other_currency.as_ref(),
            self.trade_type,
            self.config.endpoint_override.as_deref(),
            &self.config.provider_url,
        ) {
            Ok(query) => query,
            Err(report) => {
                // chains are vetted when the pair is set, so this only
                // trips if a stale debounced value slips through; refuse
                // to query rather than hit an unsupported network
                error!(reason = %report.format(), "QuoteQueryRejected");
                None
            }
        }
    }

    fn resolve(&self, query: Option<&QuoteQuery>, snapshot: &FetchSnapshot) -> ResolvedTrade {
        let filtered = filter_stale_quote(snapshot.latest_quote(), self.oracle.as_ref());

        // the snapshot may not have caught up with a query we just
        // published; derive the signals against the query that is true
        // right now, not the one the fetcher last saw
        let active_matches = snapshot.active_query.as_ref() == query;
        let fetching = query.is_some() && (snapshot.fetching || !active_matches);
        let latest_answers_query = matches!(
            (&snapshot.latest, query),
            (Some((key, _)), Some(active)) if key == active
        );
        let syncing = query.is_some() && snapshot.latest.is_some() && !latest_answers_query;

        resolve_trade(ResolveInputs {
            currency_in: self.currency_in.as_ref(),
            currency_out: self.currency_out.as_ref(),
            trade_type: self.trade_type,
            query,
            fetching_first_load: fetching && snapshot.latest.is_none(),
            errored: snapshot.errored && active_matches,
            quote: filtered,
            syncing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::blocks::LatestBlockOracle;
    use crate::models::trade::TradeStatus;
    use crate::tests::{MockProvider, token_a, token_b};
    use quote_models::constants::chains::ChainId;
    use tokio::task::yield_now;
    use tokio::time::advance;

    const FETCH_DELAY: Duration = Duration::from_millis(10);

    fn spawn_feed() -> (
        Arc<MockProvider>,
        Arc<LatestBlockOracle>,
        QuoteFeedHandle,
    ) {
        let provider = Arc::new(MockProvider::new(FETCH_DELAY));
        let oracle = Arc::new(LatestBlockOracle::default());
        let (handle, _task) =
            QuoteFeed::spawn(QuoteFeedConfig::default(), provider.clone(), oracle.clone());
        (provider, oracle, handle)
    }

    async fn settle(ms: u64) {
        for _ in 0..4 {
            yield_now().await;
        }
        advance(Duration::from_millis(ms)).await;
        for _ in 0..8 {
            yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_then_valid() {
        crate::tests::init_tracing_in_tests();
        let (provider, _oracle, handle) = spawn_feed();
        assert_eq!(handle.latest().status, TradeStatus::Invalid);

        handle
            .set_pair(Some(token_a()), Some(token_b()))
            .await
            .unwrap();
        handle
            .set_amount(Some("1.5".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        // inside the debounce window nothing is queried yet
        settle(100).await;
        assert_eq!(provider.calls(), 0);

        settle(101).await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(handle.latest().status, TradeStatus::Loading);

        settle(11).await;
        let resolved = handle.latest();
        assert_eq!(resolved.status, TradeStatus::Valid);
        let trade = resolved.trade.expect("valid state carries a trade");
        assert_eq!(trade.input_amount.raw, 1_500_000_000_000_000_000);
        assert_eq!(trade.input_amount.currency, token_a());
        assert_eq!(trade.output_amount.currency, token_b());
    }

    #[tokio::test(start_paused = true)]
    async fn test_amount_edit_syncs_instead_of_reloading() {
        let (_provider, _oracle, handle) = spawn_feed();
        handle
            .set_pair(Some(token_a()), Some(token_b()))
            .await
            .unwrap();
        handle
            .set_amount(Some("1".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(201).await;
        settle(11).await;
        assert_eq!(handle.latest().status, TradeStatus::Valid);

        handle
            .set_amount(Some("2".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(201).await;
        // the previous price stays on display while the new key fetches
        let resolved = handle.latest();
        assert_eq!(resolved.status, TradeStatus::Syncing);
        assert_eq!(
            resolved.trade.expect("syncing shows the previous trade")
                .input_amount
                .raw,
            1_000_000_000_000_000_000
        );

        settle(11).await;
        let resolved = handle.latest();
        assert_eq!(resolved.status, TradeStatus::Valid);
        assert_eq!(
            resolved.trade.unwrap().input_amount.raw,
            2_000_000_000_000_000_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_amount_never_queries() {
        let (provider, _oracle, handle) = spawn_feed();
        handle
            .set_pair(Some(token_a()), Some(token_b()))
            .await
            .unwrap();
        handle
            .set_amount(Some("0".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(60_000).await;
        assert_eq!(provider.calls(), 0);
        assert_eq!(handle.latest().status, TradeStatus::NoRouteFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_asset_pair_never_queries() {
        let (provider, _oracle, handle) = spawn_feed();
        handle
            .set_pair(Some(token_a()), Some(token_a()))
            .await
            .unwrap();
        handle
            .set_amount(Some("1".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(60_000).await;
        assert_eq!(provider.calls(), 0);
        assert_eq!(handle.latest().status, TradeStatus::NoRouteFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_chain_pair_is_rejected() {
        let (provider, _oracle, handle) = spawn_feed();
        let monad_token = Currency::new(ChainId::Monad, "0x1111", 18);
        let result = handle.set_pair(Some(monad_token), Some(token_b())).await;
        assert!(result.is_err());

        // the rejected pair never became active
        handle
            .set_amount(Some("1".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(60_000).await;
        assert_eq!(provider.calls(), 0);
        assert_eq!(handle.latest().status, TradeStatus::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_block_downgrades_to_no_route() {
        let (_provider, oracle, handle) = spawn_feed();
        handle
            .set_pair(Some(token_a()), Some(token_b()))
            .await
            .unwrap();
        handle
            .set_amount(Some("1".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(201).await;
        settle(11).await;
        assert_eq!(handle.latest().status, TradeStatus::Valid);

        // chain moved far past the quoted block; the next refetch still
        // answers with the stale block and must be filtered out
        oracle.observe(2000);
        settle(15_000).await;
        settle(11).await;
        assert_eq!(handle.latest().status, TradeStatus::NoRouteFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_surface_stops_querying() {
        let (provider, _oracle, handle) = spawn_feed();
        handle
            .set_pair(Some(token_a()), Some(token_b()))
            .await
            .unwrap();
        handle
            .set_amount(Some("1".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(201).await;
        settle(11).await;
        assert_eq!(handle.latest().status, TradeStatus::Valid);
        let calls_while_visible = provider.calls();

        handle.set_visible(false).await.unwrap();
        settle(201).await;
        assert_eq!(handle.latest().status, TradeStatus::NoRouteFound);
        settle(60_000).await;
        assert_eq!(provider.calls(), calls_while_visible);

        handle.set_visible(true).await.unwrap();
        settle(201).await;
        settle(11).await;
        assert_eq!(handle.latest().status, TradeStatus::Valid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_currency_is_invalid() {
        let (_provider, _oracle, handle) = spawn_feed();
        handle
            .set_amount(Some("1".to_string()), TradeType::ExactIn)
            .await
            .unwrap();
        settle(60_000).await;
        assert_eq!(handle.latest().status, TradeStatus::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_amount_reports_and_clears() {
        let (_provider, _oracle, handle) = spawn_feed();
        handle
            .set_pair(Some(token_a()), Some(token_b()))
            .await
            .unwrap();
        let result = handle
            .set_amount(Some("not a number".to_string()), TradeType::ExactIn)
            .await;
        assert!(result.is_err());
        settle(60_000).await;
        // a bad amount behaves like no amount
        assert_eq!(handle.latest().status, TradeStatus::NoRouteFound);
    }
}
