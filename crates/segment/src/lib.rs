//! Markdown section segmentation.
//!
//! Splits documents on ATX headers into ordered, levelled sections, with
//! an optional hybrid mode that re-splits oversized sections on
//! paragraph boundaries and token-sized word windows.

mod error;
mod hybrid;
mod segmenter;
mod types;

pub use error::{Result, SegmentError};
pub use segmenter::Segmenter;
pub use types::{
    QualityReport, Section, SegmentationMode, SegmenterConfig, CHARS_PER_TOKEN,
    DEFAULT_SECTION_TITLE,
};
