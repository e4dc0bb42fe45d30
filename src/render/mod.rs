//! Output document composition.
//!
//! Three ways to materialize a recovery, all fed by the same per-page
//! reconstruction: annotate the suspect regions, rebuild the text beside
//! the original, or overprint it in place. Rendering one output document
//! is strictly sequential; page reconstruction may have been parallel,
//! but by the time a document reaches here its pages are in order.

pub mod compose;

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tracing::debug;

use crate::analysis::RedactionBox;
use crate::error::{UnredactError, UnredactResult};
use crate::layout::Line;

const HIGHLIGHT_COLOR: (f64, f64, f64) = (1.0, 1.0, 0.0);
const HIGHLIGHT_OPACITY: f64 = 0.3;
const WHITE: (f64, f64, f64) = (1.0, 1.0, 1.0);
const BLACK: (f64, f64, f64) = (0.0, 0.0, 0.0);
const RECOVERY_FONT: &str = "FR0";

/// How recovered content is presented in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Translucent yellow markers over each redaction box; original
    /// content untouched. Visual triage, not text recovery.
    Highlight,
    /// Double-width pages: original on the left, reconstructed text on
    /// the right.
    SideBySide,
    /// Reconstructed text overprinted in white at its original position.
    /// The hidden glyphs remain in the file underneath.
    OverlayWhite,
}

impl OutputMode {
    /// Suffix appended to the input file stem for the output name.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            OutputMode::Highlight => "_unredacted",
            OutputMode::SideBySide => "_side_by_side",
            OutputMode::OverlayWhite => "_overlay_white",
        }
    }
}

/// Everything the renderer needs for one page, in page order.
#[derive(Debug, Clone, Default)]
pub struct PageRecovery {
    pub width: f64,
    pub height: f64,
    pub lines: Vec<Line>,
    pub boxes: Vec<RedactionBox>,
}

/// Composes the output document for one input file.
///
/// `path` labels failures only; the source document is already open.
pub fn render_recovery(
    original: &Document,
    path: &Path,
    pages: &[PageRecovery],
    mode: OutputMode,
) -> UnredactResult<Document> {
    debug!(path = %path.display(), ?mode, pages = pages.len(), "rendering recovery");
    match mode {
        OutputMode::Highlight => render_highlight(original, path, pages),
        OutputMode::SideBySide => render_side_by_side(original, path, pages),
        OutputMode::OverlayWhite => render_overlay_white(original, path, pages),
    }
}

fn render_highlight(
    original: &Document,
    path: &Path,
    pages: &[PageRecovery],
) -> UnredactResult<Document> {
    let mut doc = original.clone();
    let page_ids: Vec<_> = doc.get_pages().values().copied().collect();

    for (page_id, recovery) in page_ids.into_iter().zip(pages) {
        for redaction in &recovery.boxes {
            let annotation = compose::highlight_annotation(
                &redaction.rect,
                recovery.height,
                HIGHLIGHT_COLOR,
                HIGHLIGHT_OPACITY,
            );
            compose::append_annotation(&mut doc, page_id, annotation)
                .map_err(|e| UnredactError::render(path, e))?;
        }
    }
    Ok(doc)
}

fn render_overlay_white(
    original: &Document,
    path: &Path,
    pages: &[PageRecovery],
) -> UnredactResult<Document> {
    let mut doc = original.clone();
    let page_ids: Vec<_> = doc.get_pages().values().copied().collect();

    for (page_id, recovery) in page_ids.into_iter().zip(pages) {
        if recovery.lines.is_empty() {
            continue;
        }
        compose::add_page_font(&mut doc, page_id, RECOVERY_FONT, compose::helvetica_font())
            .map_err(|e| UnredactError::render(path, e))?;

        let ops: Vec<Operation> = recovery
            .lines
            .iter()
            .flat_map(|line| {
                compose::line_text_ops(line, 0.0, recovery.height, WHITE, RECOVERY_FONT)
            })
            .collect();
        compose::append_page_overlay(&mut doc, page_id, ops)
            .map_err(|e| UnredactError::render(path, e))?;
    }
    Ok(doc)
}

fn render_side_by_side(
    original: &Document,
    path: &Path,
    pages: &[PageRecovery],
) -> UnredactResult<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(compose::helvetica_font());
    let mut kids: Vec<Object> = Vec::new();

    let source_pages: Vec<_> = original.get_pages().values().copied().collect();
    for (src_page_id, recovery) in source_pages.into_iter().zip(pages) {
        let form_id = compose::page_as_form_xobject(
            &mut doc,
            original,
            src_page_id,
            recovery.width,
            recovery.height,
        )
        .map_err(|e| UnredactError::render(path, e))?;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("Do", vec![Object::Name(b"P0".to_vec())]),
            Operation::new("Q", vec![]),
        ];
        for line in &recovery.lines {
            ops.extend(compose::line_text_ops(
                line,
                recovery.width,
                recovery.height,
                BLACK,
                RECOVERY_FONT,
            ));
        }

        let content = Content { operations: ops }
            .encode()
            .map_err(|e| UnredactError::render(path, e))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real((recovery.width * 2.0) as f32),
                Object::Real(recovery.height as f32),
            ],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! {
                    RECOVERY_FONT => font_id,
                }),
                "XObject" => Object::Dictionary(dictionary! {
                    "P0" => form_id,
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
    Ok(doc)
}
