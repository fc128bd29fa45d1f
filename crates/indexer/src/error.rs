use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Segmentation error: {0}")]
    Segment(#[from] outline_segment::SegmentError),

    #[error("Keyword extraction error: {0}")]
    Keywords(#[from] outline_keywords::KeywordError),

    #[error("Relationship error: {0}")]
    Graph(#[from] outline_graph::GraphError),

    #[error("Store error: {0}")]
    Store(#[from] outline_store::StoreError),

    #[error("Invalid corpus path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}
