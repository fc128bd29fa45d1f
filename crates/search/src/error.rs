use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Store error: {0}")]
    Store(#[from] outline_store::StoreError),

    #[error("Empty query")]
    EmptyQuery,

    #[error("Invalid search profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("{0}")]
    Other(String),
}
