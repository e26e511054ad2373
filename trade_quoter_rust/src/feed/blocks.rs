use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::models::quote::QuoteResult;

/// External view of chain freshness. A quote computed against a block the
/// oracle no longer considers canonical must not be shown, even though
/// the fetch itself succeeded.
pub trait BlockOracle: Send + Sync {
    fn is_block_valid(&self, block_number: u64) -> bool;
}

/// Accepts blocks within `max_lag` of the highest block observed so far.
/// Blocks ahead of the tip are accepted: the oracle simply has not heard
/// of them yet.
pub struct LatestBlockOracle {
    tip: AtomicU64,
    max_lag: u64,
}

pub const DEFAULT_MAX_BLOCK_LAG: u64 = 10;

impl LatestBlockOracle {
    pub fn new(max_lag: u64) -> Self {
        Self {
            tip: AtomicU64::new(0),
            max_lag,
        }
    }

    /// Records a block number seen on chain. The tip only moves forward.
    pub fn observe(&self, block_number: u64) {
        self.tip.fetch_max(block_number, Ordering::SeqCst);
    }

    pub fn tip(&self) -> Option<u64> {
        match self.tip.load(Ordering::SeqCst) {
            0 => None,
            tip => Some(tip),
        }
    }
}

impl Default for LatestBlockOracle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLOCK_LAG)
    }
}

impl BlockOracle for LatestBlockOracle {
    fn is_block_valid(&self, block_number: u64) -> bool {
        match self.tip() {
            None => true,
            Some(tip) => block_number.saturating_add(self.max_lag) >= tip,
        }
    }
}

/// Substitutes "no quote" for a result priced against a block the oracle
/// rejects. Orthogonal to fetch success or failure.
pub fn filter_stale_quote<'a>(
    quote: Option<&'a QuoteResult>,
    oracle: &dyn BlockOracle,
) -> Option<&'a QuoteResult> {
    quote.filter(|q| {
        let valid = oracle.is_block_valid(q.block_number);
        if !valid {
            debug!(block_number = q.block_number, "DiscardedStaleQuote");
        }
        valid
    })
}
