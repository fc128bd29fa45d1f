use thiserror::Error;

pub type Result<T> = std::result::Result<T, SegmentError>;

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Invalid segmenter config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}
