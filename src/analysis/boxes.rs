//! Candidate redaction box extraction.

use tracing::warn;

use crate::geometry::{is_dark, Color, Rect};
use crate::source::DocumentSource;

/// A page-space rectangle that visually obscures content.
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionBox {
    pub page_index: usize,
    pub rect: Rect,
    pub fill_color: Color,
}

/// Extracts candidate redaction boxes from one page.
///
/// Two rules, tuned for recall over precision:
/// - a filled vector shape qualifies iff its fill is dark per
///   [`is_dark`] with `black_threshold`;
/// - every placed image block qualifies unconditionally, since redaction
///   tools frequently rasterize a patch over the text instead of drawing a
///   rectangle. Bright false positives are harmless downstream: they
///   rarely overlap the targeted glyphs.
///
/// An unreadable page contributes no candidates; the fault is logged and
/// the scan continues.
pub fn extract_redaction_boxes(
    source: &dyn DocumentSource,
    page_index: usize,
    black_threshold: f64,
) -> Vec<RedactionBox> {
    let mut boxes = Vec::new();

    match source.fills(page_index) {
        Ok(fills) => {
            for fill in fills {
                if is_dark(fill.color, black_threshold) {
                    boxes.push(RedactionBox {
                        page_index,
                        rect: Rect::new(fill.x0, fill.top, fill.x1, fill.bottom),
                        fill_color: fill.color,
                    });
                }
            }
        }
        Err(e) => warn!(page = page_index, error = %e, "skipping fills on unreadable page"),
    }

    match source.image_blocks(page_index) {
        Ok(images) => {
            for image in images {
                boxes.push(RedactionBox {
                    page_index,
                    rect: Rect::new(image.x0, image.top, image.x1, image.bottom),
                    fill_color: (0.0, 0.0, 0.0),
                });
            }
        }
        Err(e) => warn!(page = page_index, error = %e, "skipping images on unreadable page"),
    }

    boxes
}
