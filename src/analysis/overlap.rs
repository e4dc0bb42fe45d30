//! Spatial correlation of redaction boxes against glyphs.
//!
//! A glyph is attributed to a box when the box covers at least
//! `overlap_threshold` of the glyph's own area (the glyph is always the
//! denominator, see [`overlap_ratio`]). Boxes and glyphs on different
//! pages are never compared.

use std::collections::HashMap;

use serde::Serialize;

use crate::analysis::boxes::RedactionBox;
use crate::analysis::glyphs::Glyph;
use crate::geometry::overlap_ratio;

/// Text recovered from under one redaction box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveredRegion {
    pub page: usize,
    pub text: String,
    pub char_count: usize,
}

/// All matches for one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentMatches {
    /// One entry per box that covered at least one glyph.
    pub regions: Vec<RecoveredRegion>,
    /// Total glyphs recovered across all boxes.
    pub recovered_char_count: usize,
}

impl DocumentMatches {
    pub fn has_recoverable_text(&self) -> bool {
        self.recovered_char_count > 0
    }
}

/// Correlates a document's boxes against its glyphs.
///
/// Glyphs are bucketed by page so each box only scans its own page. The
/// naive per-page scan is fine at realistic glyph counts (thousands per
/// page); no spatial index is warranted.
///
/// Each glyph is attributed to the first box that covers it, so
/// overlapping boxes never report the same glyph twice. Matched glyphs
/// are concatenated in reading order, sorted by `(y0, x0)` within the
/// box, rather than raw encounter order.
pub fn match_boxes(
    boxes: &[RedactionBox],
    glyphs: &[Glyph],
    overlap_threshold: f64,
) -> DocumentMatches {
    let mut by_page: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, redaction) in boxes.iter().enumerate() {
        by_page.entry(redaction.page_index).or_default().push(i);
    }

    let mut hits_by_box: Vec<Vec<&Glyph>> = vec![Vec::new(); boxes.len()];
    let mut matched_glyphs = 0usize;

    for glyph in glyphs {
        let page_boxes = match by_page.get(&glyph.page_index) {
            Some(v) => v,
            None => continue,
        };
        let covering = page_boxes
            .iter()
            .copied()
            .find(|&i| overlap_ratio(&boxes[i].rect, &glyph.rect) >= overlap_threshold);
        if let Some(i) = covering {
            hits_by_box[i].push(glyph);
            matched_glyphs += 1;
        }
    }

    let mut matches = DocumentMatches {
        regions: Vec::new(),
        recovered_char_count: matched_glyphs,
    };

    for (redaction, mut hits) in boxes.iter().zip(hits_by_box) {
        if hits.is_empty() {
            continue;
        }
        hits.sort_by(|a, b| {
            (a.rect.y0, a.rect.x0)
                .partial_cmp(&(b.rect.y0, b.rect.x0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let text: String = hits.iter().map(|g| g.text).collect();
        matches.regions.push(RecoveredRegion {
            page: redaction.page_index,
            text,
            char_count: hits.len(),
        });
    }

    matches
}
