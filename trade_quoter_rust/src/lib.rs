pub mod error;
pub mod feed;
pub mod models;
pub mod providers;
#[cfg(test)]
pub mod tests;

use serde::{Deserialize, Serialize};

/// Which side of the pair carries the user-specified amount.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    ExactIn,
    ExactOut,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::ExactIn => "exactIn",
            TradeType::ExactOut => "exactOut",
        }
    }
}
