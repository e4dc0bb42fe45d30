//! The document provider seam.
//!
//! The audit engine never touches a PDF parser directly. It consumes the
//! plain records defined here (filled shapes, image placements, character
//! spans, word spans) through the [`DocumentSource`] trait, and any backend
//! that can produce them can drive a scan. The bundled backend is
//! [`PdfSource`], built on lopdf.
//!
//! All geometry handed out by a source is in top-down page space
//! (`top`/`bottom` measured from the page's top edge), converted once at the
//! backend boundary.

pub mod content;
pub mod pdf;

pub use pdf::PdfSource;

use crate::error::UnredactResult;
use crate::geometry::Color;

/// A filled vector shape reported by a page, with its fill colour.
#[derive(Debug, Clone, PartialEq)]
pub struct FillShape {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub color: Color,
}

/// A placed raster image, reported by its bounding rect only.
///
/// Pixel data is deliberately not carried: image blocks are treated as
/// opaque candidates downstream regardless of their content.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

/// One rendered character with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct CharSpan {
    pub text: char,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    /// Effective font size in page units at the point of rendering.
    pub size: f64,
}

/// A run of non-whitespace characters, used for layout reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct WordSpan {
    pub text: String,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub size: Option<f64>,
}

/// Read access to one document's page primitives.
///
/// Implementations are expected to be cheap to re-open: scan workers open
/// their own source per file rather than sharing one parsing session.
pub trait DocumentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// `(width, height)` of a page in points.
    fn page_size(&self, page: usize) -> UnredactResult<(f64, f64)>;

    /// Filled vector shapes on a page.
    fn fills(&self, page: usize) -> UnredactResult<Vec<FillShape>>;

    /// Placed raster images on a page.
    fn image_blocks(&self, page: usize) -> UnredactResult<Vec<ImageBlock>>;

    /// Individual characters on a page, in encounter order.
    fn chars(&self, page: usize) -> UnredactResult<Vec<CharSpan>>;

    /// Words on a page. The default groups [`chars`](Self::chars) with
    /// [`words_from_chars`].
    fn words(&self, page: usize) -> UnredactResult<Vec<WordSpan>> {
        Ok(words_from_chars(&self.chars(page)?, WORD_GAP_TOLERANCE))
    }
}

/// Horizontal gap (in points) beyond which adjacent characters start a new
/// word even without intervening whitespace. Negative gaps past the same
/// magnitude (a carriage return to the left margin) also break.
pub const WORD_GAP_TOLERANCE: f64 = 3.0;

/// Vertical offset (in points) beyond which a character belongs to a
/// different line than the word being built.
pub const WORD_LINE_TOLERANCE: f64 = 2.0;

/// Groups a page's character spans into words.
///
/// A word breaks on whitespace characters (which are consumed), on
/// horizontal gaps wider than `gap_tolerance` in either direction, and on
/// vertical jumps larger than [`WORD_LINE_TOLERANCE`]. Words never span
/// lines. Character encounter order is preserved; no resorting happens
/// here.
pub fn words_from_chars(chars: &[CharSpan], gap_tolerance: f64) -> Vec<WordSpan> {
    let mut words = Vec::new();
    let mut current: Option<WordSpan> = None;

    for ch in chars {
        if ch.text.is_whitespace() {
            if let Some(word) = current.take() {
                words.push(word);
            }
            continue;
        }

        match current.as_mut() {
            Some(word) if continues_word(word, ch, gap_tolerance) => {
                word.text.push(ch.text);
                word.x1 = word.x1.max(ch.x1);
                word.top = word.top.min(ch.top);
                word.bottom = word.bottom.max(ch.bottom);
            }
            _ => {
                if let Some(word) = current.take() {
                    words.push(word);
                }
                current = Some(WordSpan {
                    text: ch.text.to_string(),
                    x0: ch.x0,
                    top: ch.top,
                    x1: ch.x1,
                    bottom: ch.bottom,
                    size: Some(ch.size),
                });
            }
        }
    }

    if let Some(word) = current {
        words.push(word);
    }
    words
}

fn continues_word(word: &WordSpan, ch: &CharSpan, gap_tolerance: f64) -> bool {
    let gap = ch.x0 - word.x1;
    gap.abs() <= gap_tolerance && (ch.top - word.top).abs() <= WORD_LINE_TOLERANCE
}
