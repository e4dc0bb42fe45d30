//! Line reconstruction from recovered words.
//!
//! Word extraction yields geometry but no layout; this module rebuilds
//! visual lines so recovered text can be redrawn legibly. Two phases:
//! vertical clustering with a running-average baseline, then horizontal
//! spacing synthesis from inter-word gaps.

use crate::source::WordSpan;

/// Tuning knobs for line reconstruction. All values are in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Maximum distance between a word's top and the running average top
    /// of the current cluster for the word to join it.
    pub line_tolerance: f64,
    /// Point width attributed to one inter-word space.
    pub space_unit_pts: f64,
    /// Floor on inserted spaces whenever a positive gap exists.
    pub min_spaces: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 2.0,
            space_unit_pts: 3.0,
            min_spaces: 1,
        }
    }
}

/// One reconstructed visual line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub font_size: f64,
}

/// Rebuilds ordered lines from one page's words.
///
/// Clustering uses a running average of the cluster's `top` rather than
/// its first value, so a line whose baseline drifts by sub-point jitter
/// across many words stays one line, while a genuine line break still
/// splits. With `line_tolerance = 0` this degenerates to one line per
/// distinct `top` value.
///
/// Within a cluster, words are ordered by `x0` and the gap to the
/// previous word decides the separator: a positive gap becomes
/// `round(gap / space_unit)` spaces (never fewer than `min_spaces`); a
/// shallow negative gap (kerning overlap) becomes a single space; a deep
/// negative gap becomes nothing. Lines whose text is entirely whitespace
/// are dropped.
pub fn reconstruct_lines(words: &[WordSpan], config: &LayoutConfig) -> Vec<Line> {
    let mut sorted: Vec<&WordSpan> = words.iter().collect();
    sorted.sort_by(|a, b| {
        (a.top, a.x0)
            .partial_cmp(&(b.top, b.x0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut clusters: Vec<Vec<&WordSpan>> = Vec::new();
    let mut running_top = 0.0;
    for word in sorted {
        match clusters.last_mut() {
            Some(cluster) if (word.top - running_top).abs() <= config.line_tolerance => {
                cluster.push(word);
                let n = cluster.len() as f64;
                running_top += (word.top - running_top) / n;
            }
            _ => {
                running_top = word.top;
                clusters.push(vec![word]);
            }
        }
    }

    clusters
        .into_iter()
        .filter_map(|cluster| assemble_line(cluster, config))
        .collect()
}

fn assemble_line(mut cluster: Vec<&WordSpan>, config: &LayoutConfig) -> Option<Line> {
    cluster.sort_by(|a, b| {
        a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal)
    });

    let font_size = representative_font_size(&cluster);
    let top = median(cluster.iter().map(|w| w.top));
    let space_unit = config.space_unit_pts.max(0.5);

    let mut text = String::new();
    let mut prev_x1: Option<f64> = None;
    for word in &cluster {
        if let Some(prev) = prev_x1 {
            let gap = word.x0 - prev;
            if gap > 0.0 {
                let n = ((gap / space_unit).round() as usize).max(config.min_spaces);
                text.extend(std::iter::repeat(' ').take(n));
            } else if gap > -0.3 * space_unit {
                text.push(' ');
            }
        }
        text.push_str(&word.text);
        prev_x1 = Some(word.x1);
    }

    if text.trim().is_empty() {
        return None;
    }

    let x0 = cluster
        .iter()
        .map(|w| w.x0)
        .fold(f64::INFINITY, f64::min);
    let x1 = cluster
        .iter()
        .map(|w| w.x1)
        .fold(f64::NEG_INFINITY, f64::max);

    Some(Line {
        text,
        x0,
        x1,
        top,
        font_size,
    })
}

/// Medians resist outliers from superscripts and decorative glyphs.
fn representative_font_size(cluster: &[&WordSpan]) -> f64 {
    let sizes: Vec<f64> = cluster.iter().filter_map(|w| w.size).collect();
    if !sizes.is_empty() {
        return median(sizes.into_iter());
    }
    median(cluster.iter().map(|w| w.bottom - w.top)).max(6.0)
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut v: Vec<f64> = values.collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    }
}
