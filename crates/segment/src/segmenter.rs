use crate::hybrid;
use crate::types::{QualityReport, Section, SegmentationMode, SegmenterConfig, DEFAULT_SECTION_TITLE};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// ATX headers: one to six `#`, whitespace, then a non-empty title.
/// Anything else (bare `#` runs, `#no-space`, indented hashes) is body
/// text.
static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)").expect("valid header regex"));

/// Turns raw document text into an ordered sequence of hierarchical
/// sections.
///
/// Never fails on input: malformed header syntax is treated as body text
/// and headerless documents collapse into a single default section.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `content` into sections with final `seq_num`s assigned
    /// `0..n` in document order.
    #[must_use]
    pub fn segment(&self, content: &str) -> Vec<Section> {
        let sections = Self::header_sections(content);

        let mut sections = match self.config.mode {
            SegmentationMode::HeaderOnly => sections,
            SegmentationMode::Hybrid => hybrid::split_oversized(sections, &self.config),
        };

        for (seq, section) in sections.iter_mut().enumerate() {
            section.seq_num = seq;
        }

        log::debug!("Segmented {} chars into {} sections", content.len(), sections.len());
        sections
    }

    /// Quality metrics for an emitted segmentation.
    #[must_use]
    pub fn quality(&self, sections: &[Section]) -> QualityReport {
        hybrid::evaluate_quality(sections, &self.config)
    }

    /// Header-based scan. The text before the first header is discarded;
    /// a document with no headers at all becomes one default section
    /// holding the entire content.
    fn header_sections(content: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current: Option<(String, u8)> = None;
        let mut body: Vec<&str> = Vec::new();

        for line in content.lines() {
            if let Some(caps) = HEADER_RE.captures(line) {
                if let Some((title, level)) = current.take() {
                    sections.push(Section::new(title, body.join("\n").trim(), level));
                    body.clear();
                }
                let level = caps[1].len() as u8;
                let title = caps[2].trim().to_string();
                current = Some((title, level));
            } else if current.is_some() {
                body.push(line);
            }
        }

        if let Some((title, level)) = current {
            sections.push(Section::new(title, body.join("\n").trim(), level));
        }

        if sections.is_empty() {
            sections.push(Section::new(DEFAULT_SECTION_TITLE, content, 1));
        }

        sections
    }
}
