use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::error::ReportDisplayExt;
use crate::models::quote::{QuoteQuery, QuoteResult};
use crate::providers::QuoteProvider;

/// Observable state of the fetch machinery, published on every change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchSnapshot {
    /// A request for the active query is in flight.
    pub fetching: bool,
    /// The most recent attempt for the active query failed.
    pub errored: bool,
    /// Query the fetcher is currently serving; `None` means idle.
    pub active_query: Option<QuoteQuery>,
    /// Most recently completed successful result, keyed by the query it
    /// answered. Lags behind `active_query` while a fresh fetch is
    /// pending, which is what lets a consumer keep showing the previous
    /// price instead of flashing back to a loading state.
    pub latest: Option<(QuoteQuery, Arc<QuoteResult>)>,
}

impl FetchSnapshot {
    /// Result for the active query, if the latest result answers it.
    pub fn current(&self) -> Option<&QuoteResult> {
        match (&self.latest, &self.active_query) {
            (Some((key, result)), Some(active)) if key == active => Some(result),
            _ => None,
        }
    }

    /// Most recent successful result regardless of which query it
    /// answered.
    pub fn latest_quote(&self) -> Option<&QuoteResult> {
        self.latest.as_ref().map(|(_, result)| result.as_ref())
    }

    /// A superseded query's result is on display while the active
    /// query's fetch is still pending.
    pub fn is_syncing(&self) -> bool {
        match (&self.latest, &self.active_query) {
            (Some((key, _)), Some(active)) => key != active,
            _ => false,
        }
    }

    /// First-ever fetch for the active query, nothing to show yet.
    pub fn is_first_load(&self) -> bool {
        self.fetching && self.latest.is_none()
    }
}

/// Polling task around a [`QuoteProvider`]. While a query is active it
/// fetches once immediately and then refetches on a fixed interval; a
/// query change cancels the outstanding request and any pending ticks
/// and starts over. Results are applied only while the query they were
/// issued for is still active, so a superseded response can never leak
/// into the published state.
pub struct QuoteFetcher<P> {
    provider: Arc<P>,
    poll_interval: Duration,
    query_rx: watch::Receiver<Option<QuoteQuery>>,
    snapshot_tx: watch::Sender<FetchSnapshot>,
}

impl<P> QuoteFetcher<P>
where
    P: QuoteProvider + 'static,
{
    pub fn spawn(
        provider: Arc<P>,
        poll_interval: Duration,
        query_rx: watch::Receiver<Option<QuoteQuery>>,
    ) -> (watch::Receiver<FetchSnapshot>, JoinHandle<()>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(FetchSnapshot::default());
        let fetcher = Self {
            provider,
            poll_interval,
            query_rx,
            snapshot_tx,
        };
        let handle = tokio::spawn(fetcher.run());
        (snapshot_rx, handle)
    }

    async fn run(mut self) {
        loop {
            let active = self.query_rx.borrow_and_update().clone();
            match active {
                None => {
                    self.publish(|snapshot| {
                        snapshot.fetching = false;
                        snapshot.errored = false;
                        snapshot.active_query = None;
                    });
                    if self.query_rx.changed().await.is_err() {
                        return;
                    }
                }
                Some(query) => {
                    if self.poll(query).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    /// Serves one query until it is superseded. `Err` means the query
    /// channel is gone and the task should end.
    async fn poll(&mut self, query: QuoteQuery) -> Result<(), ()> {
        self.publish(|snapshot| {
            snapshot.fetching = true;
            snapshot.errored = false;
            snapshot.active_query = Some(query.clone());
        });

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                changed = self.query_rx.changed() => {
                    return changed.map_err(|_| ());
                }
                _ = ticker.tick() => {
                    self.publish(|snapshot| snapshot.fetching = true);
                    select! {
                        changed = self.query_rx.changed() => {
                            // supersede: the in-flight request is dropped
                            // with the future
                            debug!("AbortedSupersededFetch");
                            return changed.map_err(|_| ());
                        }
                        result = self.provider.fetch_quote(&query) => {
                            if self.query_rx.borrow().as_ref() != Some(&query) {
                                debug!("DiscardedSupersededResult");
                                continue;
                            }
                            match result {
                                Ok(quote) => {
                                    debug!(
                                        block_number = quote.block_number,
                                        amount_quote = quote.amount_quote,
                                        "QuoteFetched"
                                    );
                                    self.publish(|snapshot| {
                                        snapshot.fetching = false;
                                        snapshot.errored = false;
                                        snapshot.latest =
                                            Some((query.clone(), Arc::new(quote)));
                                    });
                                }
                                Err(report) => {
                                    warn!(reason = %report.format(), "QuoteFetchFailed");
                                    self.publish(|snapshot| {
                                        snapshot.fetching = false;
                                        snapshot.errored = true;
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut FetchSnapshot)) {
        self.snapshot_tx.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            update(snapshot);
            *snapshot != before
        });
    }
}
