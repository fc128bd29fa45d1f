//! Second-stage splitting for the hybrid mode: paragraph packing for
//! oversized sections, then word windows with overlap for anything a
//! paragraph pass could not shrink.

use crate::types::{QualityReport, Section, SegmenterConfig, CHARS_PER_TOKEN};

/// Split every section whose content exceeds `max_segment_length`.
/// Two passes: paragraph boundaries first, then fixed-size word windows
/// for sections still over the limit (single huge paragraphs).
pub(crate) fn split_oversized(sections: Vec<Section>, config: &SegmenterConfig) -> Vec<Section> {
    let mut refined = Vec::with_capacity(sections.len());
    for section in sections {
        if section.char_count() > config.max_segment_length {
            refined.extend(split_by_paragraphs(section, config.max_segment_length));
        } else {
            refined.push(section);
        }
    }

    let mut windowed = Vec::with_capacity(refined.len());
    for section in refined {
        if section.char_count() > config.max_segment_length {
            windowed.extend(split_by_windows(section, config));
        } else {
            windowed.push(section);
        }
    }
    windowed
}

/// Greedy paragraph packing: accumulate `\n\n`-separated paragraphs into
/// parts of at most `max_len` characters each. Parts inherit the parent
/// level and are tagged `"<title> - Part N"` (1-based). A section that
/// cannot be split (one usable paragraph) is returned untouched.
fn split_by_paragraphs(section: Section, max_len: usize) -> Vec<Section> {
    let paragraphs: Vec<&str> = section
        .content
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .collect();
    if paragraphs.len() <= 1 {
        return vec![section];
    }

    let mut groups: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;
    for paragraph in paragraphs {
        let paragraph_len = paragraph.chars().count();
        if current_len + paragraph_len > max_len && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(paragraph);
        current_len += paragraph_len;
    }
    if !current.is_empty() {
        groups.push(current);
    }

    if groups.len() <= 1 {
        return vec![section];
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let mut part = Section::new(
                format!("{} - Part {}", section.title, i + 1),
                group.join("\n").trim(),
                section.level,
            );
            part.part = Some(i + 1);
            part
        })
        .collect()
}

/// Word windows of roughly `target_token_count` tokens. Each window
/// after the first starts with the trailing `overlap_ratio` fraction of
/// the previous window's words and is flagged `has_overlap`.
fn split_by_windows(section: Section, config: &SegmenterConfig) -> Vec<Section> {
    let words: Vec<&str> = section.content.split_whitespace().collect();
    if words.is_empty() {
        return vec![section];
    }

    let words_per_window = (config.target_token_count / CHARS_PER_TOKEN).max(1);
    let overlap_words = (words_per_window as f32 * config.overlap_ratio) as usize;

    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut part_num = 1usize;
    loop {
        let end = (start + words_per_window).min(words.len());
        let mut part = Section::new(
            format!("{} - Part {}", section.title, part_num),
            words[start..end].join(" "),
            section.level,
        );
        part.has_overlap = start > 0;
        part.part = Some(part_num);
        parts.push(part);

        if end >= words.len() {
            break;
        }
        // overlap_ratio < 1 keeps overlap_words < words_per_window, so
        // start strictly advances and the loop terminates.
        start = if overlap_words > 0 { end - overlap_words } else { end };
        part_num += 1;
    }
    parts
}

/// Aggregate quality metrics over an emitted segmentation: size
/// uniformity, closeness to the token target, and overlap coverage,
/// averaged into a single score. An empty segmentation scores zero.
pub(crate) fn evaluate_quality(sections: &[Section], config: &SegmenterConfig) -> QualityReport {
    if sections.is_empty() {
        return QualityReport::default();
    }

    let n = sections.len() as f64;
    let char_counts: Vec<f64> = sections.iter().map(|s| s.char_count() as f64).collect();
    let avg_chars = char_counts.iter().sum::<f64>() / n;

    let variance = char_counts
        .iter()
        .map(|c| (c - avg_chars).powi(2))
        .sum::<f64>()
        / n;
    let uniformity_score = if avg_chars > 0.0 {
        1.0 / (1.0 + variance / avg_chars)
    } else {
        1.0
    };

    let target = config.target_token_count as f64;
    let token_counts: Vec<f64> = sections
        .iter()
        .map(|s| s.estimated_tokens() as f64)
        .collect();
    let token_efficiency =
        token_counts.iter().map(|t| 1.0 - (t - target).abs() / target).sum::<f64>() / n;

    let overlap_coverage = if sections.len() > 1 {
        sections.iter().filter(|s| s.has_overlap).count() as f64 / n
    } else {
        0.0
    };

    let quality_score = (uniformity_score + token_efficiency + overlap_coverage) / 3.0;

    QualityReport {
        quality_score,
        uniformity_score,
        token_efficiency,
        overlap_coverage,
        avg_chars,
        avg_tokens: token_counts.iter().sum::<f64>() / n,
        segment_count: sections.len(),
    }
}
