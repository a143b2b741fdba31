use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no symbols configured")]
    NoSymbols,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
