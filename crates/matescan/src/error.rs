//! Scanner error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine unresponsive during {0}")]
    Unresponsive(&'static str),

    #[error("Converter error: {0}")]
    Converter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
