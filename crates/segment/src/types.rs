use serde::{Deserialize, Serialize};

/// Title given to the single fallback section when a document has no
/// headers at all.
pub const DEFAULT_SECTION_TITLE: &str = "Document Content";

/// Rough chars-per-token estimate used for token budgeting.
pub const CHARS_PER_TOKEN: usize = 4;

/// One emitted section: a header with its accumulated body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    /// Header depth, 1..=6.
    pub level: u8,
    /// Zero-based position in document order, strictly increasing.
    pub seq_num: usize,
    /// Set on windowed parts that repeat trailing words of the previous
    /// window.
    pub has_overlap: bool,
    /// 1-based part number for sections produced by splitting an
    /// oversized section.
    pub part: Option<usize>,
}

impl Section {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>, level: u8) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            level,
            seq_num: 0,
            has_overlap: false,
            part: None,
        }
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    #[must_use]
    pub fn estimated_tokens(&self) -> usize {
        self.char_count() / CHARS_PER_TOKEN
    }
}

/// How the segmenter treats oversized sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Header scanning only; sections keep their full body.
    #[default]
    HeaderOnly,
    /// Header scanning, then paragraph splitting and token-limited
    /// windows with overlap for sections over the size limit.
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    pub mode: SegmentationMode,
    /// Advisory lower bound; not consulted by any splitting rule.
    pub min_segment_length: usize,
    /// Sections longer than this (in chars) get split in hybrid mode.
    pub max_segment_length: usize,
    /// Token target per windowed part.
    pub target_token_count: usize,
    /// Fraction of a window's words repeated at the start of the next.
    pub overlap_ratio: f32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            mode: SegmentationMode::HeaderOnly,
            min_segment_length: 50,
            max_segment_length: 2000,
            target_token_count: 512,
            overlap_ratio: 0.1,
        }
    }
}

impl SegmenterConfig {
    #[must_use]
    pub fn hybrid() -> Self {
        Self {
            mode: SegmentationMode::Hybrid,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.max_segment_length == 0 {
            return Err(crate::SegmentError::InvalidConfig(
                "max_segment_length must be positive".to_string(),
            ));
        }
        if self.target_token_count == 0 {
            return Err(crate::SegmentError::InvalidConfig(
                "target_token_count must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(crate::SegmentError::InvalidConfig(format!(
                "overlap_ratio must be in [0, 1), got {}",
                self.overlap_ratio
            )));
        }
        Ok(())
    }
}

/// Aggregate quality metrics over an emitted segmentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Mean of the three component scores below.
    pub quality_score: f64,
    /// How close segment sizes are to each other.
    pub uniformity_score: f64,
    /// How close segment token counts sit to the configured target.
    pub token_efficiency: f64,
    /// Fraction of segments carrying overlap.
    pub overlap_coverage: f64,
    pub avg_chars: f64,
    pub avg_tokens: f64,
    pub segment_count: usize,
}
