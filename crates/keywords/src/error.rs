use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeywordError>;

#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("Invalid keyword config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}
