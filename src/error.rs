use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to fetch {url} after {attempts} attempts: {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        reason: String,
    },
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, StockError>;
