//! Glyph indexing.
//!
//! A structural projection of the provider's character records into
//! matcher-ready glyphs. The provider already reports `top`/`bottom` from
//! the page's top edge; this module renames, it does not re-derive.

use tracing::warn;

use crate::geometry::Rect;
use crate::source::DocumentSource;

/// One rendered character with its page-space bounding box.
///
/// Glyphs are the source of truth for "is there real text here": redaction
/// matching is glyph-granular so a partially covered word still counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub page_index: usize,
    pub text: char,
    pub rect: Rect,
}

/// Builds the glyph list for one page.
///
/// An unreadable page yields an empty list; the fault is logged, never
/// raised.
pub fn index_glyphs(source: &dyn DocumentSource, page_index: usize) -> Vec<Glyph> {
    let chars = match source.chars(page_index) {
        Ok(chars) => chars,
        Err(e) => {
            warn!(page = page_index, error = %e, "skipping glyphs on unreadable page");
            return Vec::new();
        }
    };

    chars
        .into_iter()
        .map(|c| Glyph {
            page_index,
            text: c.text,
            rect: Rect::new(c.x0, c.top, c.x1, c.bottom),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{UnredactError, UnredactResult};
    use crate::source::{CharSpan, FillShape, ImageBlock};

    struct FakeSource {
        chars: UnredactResult<Vec<CharSpan>>,
    }

    impl DocumentSource for FakeSource {
        fn page_count(&self) -> usize {
            1
        }
        fn page_size(&self, _page: usize) -> UnredactResult<(f64, f64)> {
            Ok((612.0, 792.0))
        }
        fn fills(&self, _page: usize) -> UnredactResult<Vec<FillShape>> {
            Ok(Vec::new())
        }
        fn image_blocks(&self, _page: usize) -> UnredactResult<Vec<ImageBlock>> {
            Ok(Vec::new())
        }
        fn chars(&self, _page: usize) -> UnredactResult<Vec<CharSpan>> {
            match &self.chars {
                Ok(chars) => Ok(chars.clone()),
                Err(_) => Err(UnredactError::page(0, "boom")),
            }
        }
    }

    #[test]
    fn test_projection_preserves_order_and_geometry() {
        let source = FakeSource {
            chars: Ok(vec![
                CharSpan {
                    text: 'H',
                    x0: 1.0,
                    top: 2.0,
                    x1: 3.0,
                    bottom: 4.0,
                    size: 10.0,
                },
                CharSpan {
                    text: 'i',
                    x0: 3.0,
                    top: 2.0,
                    x1: 4.0,
                    bottom: 4.0,
                    size: 10.0,
                },
            ]),
        };
        let glyphs = index_glyphs(&source, 7);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, 'H');
        assert_eq!(glyphs[0].page_index, 7);
        assert_eq!(glyphs[1].rect, Rect::new(3.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn test_unreadable_page_yields_empty_list() {
        let source = FakeSource {
            chars: Err(UnredactError::page(0, "boom")),
        };
        assert!(index_glyphs(&source, 0).is_empty());
    }
}
