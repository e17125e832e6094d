use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AlgoError {
    #[error("RR interval must be a positive finite number of milliseconds, got {0}")]
    InvalidInterval(f64),
}
