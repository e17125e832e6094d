use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("payload is empty")]
    EmptyPayload,
    #[error("payload ended inside the {0} field")]
    Truncated(&'static str),
    #[error("dangling byte after RR intervals")]
    OddRrPayload,
    #[error("invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
