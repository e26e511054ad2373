use error_stack::Report;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::error::Error;

pub const NATIVE_TOKEN_EVM_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
pub const EVM_NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const NATIVE_TOKEN_EVM_ADDRESSES: [&str; 2] = [NATIVE_TOKEN_EVM_ADDRESS, EVM_NULL_ADDRESS];

pub fn is_native_token_evm_address(address: &str) -> bool {
    NATIVE_TOKEN_EVM_ADDRESSES.contains(&address.to_lowercase().as_str())
}

/// Networks the quoting service can be asked about. Membership in
/// [`ChainId::supported_chains`] is a hard precondition for issuing any
/// quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, EnumIter, Hash)]
#[repr(u32)]
pub enum ChainId {
    Ethereum = 1,
    Optimism = 10,
    Bsc = 56,
    Polygon = 137,
    Monad = 143,
    Base = 8453,
    ArbitrumOne = 42161,
    Celo = 42220,
}

impl ChainId {
    /// Static allow-list of networks quotes may be requested for. Monad
    /// is recognized on the wire but the quoting service does not route
    /// there yet.
    pub fn supported_chains() -> Vec<ChainId> {
        ChainId::iter().filter(ChainId::is_supported).collect()
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ChainId::Monad)
    }
}

impl TryFrom<u32> for ChainId {
    type Error = Report<Error>;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        serde_json::from_str(&value.to_string()).map_err(|e| {
            Report::new(Error::ParseError)
                .attach_printable(format!("Failed to parse chain ID: {e}"))
        })
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ethereum => write!(f, "Ethereum"),
            Self::Optimism => write!(f, "Optimism"),
            Self::Bsc => write!(f, "BSC"),
            Self::Polygon => write!(f, "Polygon"),
            Self::Monad => write!(f, "Monad"),
            Self::Base => write!(f, "Base"),
            Self::ArbitrumOne => write!(f, "Arbitrum One"),
            Self::Celo => write!(f, "Celo"),
        }
    }
}
