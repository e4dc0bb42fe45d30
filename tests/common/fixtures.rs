//! Synthetic PDF builders for integration tests.
//!
//! Every page carries one test font (`/F1`) whose `/Widths` table maps
//! every byte to 500/1000 em, so a character drawn at size 10 advances
//! exactly 5 points. That makes glyph geometry predictable enough to
//! assert on.
//!
//! Builder coordinates are PDF-native: origin at the bottom-left, `y`
//! increasing upward. Text positions are baselines.

use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;

/// Fluent builder for small deterministic PDFs.
pub struct TestPdfBuilder {
    width: f64,
    height: f64,
    pages: Vec<String>,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            pages: vec![String::new()],
        }
    }

    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Starts a new page; subsequent content lands there.
    pub fn new_page(mut self) -> Self {
        self.pages.push(String::new());
        self
    }

    /// Draws `text` at a baseline position with the fixed-width test font.
    /// Avoid parentheses and backslashes in `text`.
    pub fn with_text(mut self, text: &str, x: f64, baseline: f64, size: f64) -> Self {
        let ops = format!("BT /F1 {size} Tf {x} {baseline} Td ({text}) Tj ET\n");
        self.pages.last_mut().unwrap().push_str(&ops);
        self
    }

    /// Draws a filled rectangle in the given RGB color.
    pub fn with_rect(mut self, color: (f64, f64, f64), x: f64, y: f64, w: f64, h: f64) -> Self {
        let (r, g, b) = color;
        let ops = format!("{r} {g} {b} rg {x} {y} {w} {h} re f\n");
        self.pages.last_mut().unwrap().push_str(&ops);
        self
    }

    pub fn with_black_rect(self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.with_rect((0.0, 0.0, 0.0), x, y, w, h)
    }

    /// Places the shared 1x1 image XObject scaled over a rectangle.
    pub fn with_image_block(mut self, x: f64, y: f64, w: f64, h: f64) -> Self {
        let ops = format!("q {w} 0 0 {h} {x} {y} cm /Im1 Do Q\n");
        self.pages.last_mut().unwrap().push_str(&ops);
        self
    }

    pub fn build_document(self) -> Document {
        let mut doc = Document::with_version("1.5");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 0,
            "Widths" => vec![Object::Integer(500); 256],
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0u8],
        ));

        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        for content in &self.pages {
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.clone().into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(self.width as f32),
                    Object::Real(self.height as f32),
                ],
                "Contents" => content_id,
                "Resources" => Object::Dictionary(dictionary! {
                    "Font" => Object::Dictionary(dictionary! {
                        "F1" => font_id,
                    }),
                    "XObject" => Object::Dictionary(dictionary! {
                        "Im1" => image_id,
                    }),
                }),
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    pub fn build_mem(self) -> Vec<u8> {
        let mut doc = self.build_document();
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to serialize test PDF");
        buf
    }

    pub fn build(self, path: &Path) {
        let mut doc = self.build_document();
        doc.save(path).expect("failed to write test PDF");
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A page whose "SECRET" text sits fully under a black rectangle.
///
/// Geometry at size 10 with the test font: six glyphs from x=20 to x=50,
/// baseline 706, so the glyph boxes span y 704..714 in PDF space. The
/// covering rectangle spans x 10..70, y 700..720.
pub fn improperly_redacted_page() -> TestPdfBuilder {
    TestPdfBuilder::new()
        .with_text("SECRET", 20.0, 706.0, 10.0)
        .with_black_rect(10.0, 700.0, 60.0, 20.0)
}

/// A page mixing an untouched line with a covered one: "VISIBLE" on an
/// upper line, "SECRET" under the same black rectangle as
/// [`improperly_redacted_page`].
pub fn mixed_visibility_page() -> TestPdfBuilder {
    TestPdfBuilder::new()
        .with_text("VISIBLE", 20.0, 750.0, 10.0)
        .with_text("SECRET", 20.0, 706.0, 10.0)
        .with_black_rect(10.0, 700.0, 60.0, 20.0)
}
