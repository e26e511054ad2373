use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ModelResult<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error")]
    ParseError,

    #[error("Reqwest error: {0}")]
    ReqwestError(String),

    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),

    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    #[error("Serde serialize error: {0}")]
    SerdeSerialize(String),

    #[error("Serde deserialize error: {0}")]
    SerdeDeserialize(String),

    #[error("Unknown error")]
    Unknown,
}
