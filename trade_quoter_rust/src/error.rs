use error_stack::{AttachmentKind, FrameKind, Report};
use quote_models::constants::chains::ChainId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type QuoterResult<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error")]
    ParseError,

    #[error("Reqwest error")]
    ReqwestError,

    #[error("Response error")]
    ResponseError,

    /// The requested network is outside the supported allow-list. This is
    /// fatal: it propagates to the caller instead of resolving to a trade
    /// state, and is never retried.
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(ChainId),

    #[error("Route error: {0}")]
    RouteError(String),

    #[error("Models error")]
    ModelsError,

    #[error("Serde serialize error: {0}")]
    SerdeSerialize(String),

    #[error("Serde deserialize error: {0}")]
    SerdeDeserialize(String),

    #[error("Feed closed")]
    FeedClosed,

    #[error("Unknown error")]
    Unknown,
}

pub trait ReportDisplayExt {
    fn format(&self) -> String;
}

impl ReportDisplayExt for Report<Error> {
    fn format(&self) -> String {
        let mut output = String::new();

        let frames = self.current_frames();

        for frame in frames.iter() {
            if let FrameKind::Attachment(AttachmentKind::Printable(attachment)) = frame.kind() {
                output.push_str(&format!(" {attachment} "));
            }
        }

        output.trim().to_string()
    }
}
