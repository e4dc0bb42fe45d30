//! The bundled lopdf document backend.
//!
//! `PdfSource` owns one parsed document and serves the provider interface
//! from it. Page primitives are interpreted on first access and cached, so
//! the three per-page accessors share a single content-stream walk.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::{UnredactError, UnredactResult};
use crate::source::content::{walk_page, PagePrimitives};
use crate::source::{CharSpan, DocumentSource, FillShape, ImageBlock};

/// A PDF document opened for primitive extraction.
pub struct PdfSource {
    doc: Document,
    page_ids: Vec<ObjectId>,
    cache: RefCell<HashMap<usize, PagePrimitives>>,
}

impl std::fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSource")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl PdfSource {
    /// Opens a document from disk.
    pub fn open(path: &Path) -> UnredactResult<Self> {
        let doc = Document::load(path).map_err(|e| UnredactError::document(path, e))?;
        Ok(Self::from_document(doc))
    }

    /// Opens a document from an in-memory buffer.
    pub fn from_bytes(bytes: &[u8]) -> UnredactResult<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| UnredactError::document(Path::new("<memory>"), e))?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: Document) -> Self {
        // get_pages returns a 1-indexed BTreeMap in page order.
        let page_ids = doc.get_pages().values().copied().collect();
        Self {
            doc,
            page_ids,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn page_id(&self, page: usize) -> UnredactResult<ObjectId> {
        self.page_ids
            .get(page)
            .copied()
            .ok_or_else(|| UnredactError::page(page, "page index out of range"))
    }

    /// `[x0, y0, x1, y1]` of the page's MediaBox, walking up the page tree
    /// when the entry is inherited.
    fn media_box(&self, page: usize) -> UnredactResult<[f64; 4]> {
        let mut current = self.page_id(page)?;
        loop {
            let dict = self
                .doc
                .get_object(current)
                .and_then(|o| o.as_dict())
                .map_err(|e| UnredactError::page(page, e))?;

            if let Ok(obj) = dict.get(b"MediaBox") {
                let obj = match obj {
                    Object::Reference(id) => self
                        .doc
                        .get_object(*id)
                        .map_err(|e| UnredactError::page(page, e))?,
                    other => other,
                };
                let arr = obj.as_array().map_err(|e| UnredactError::page(page, e))?;
                let nums: Vec<f64> = arr
                    .iter()
                    .filter_map(|o| match o {
                        Object::Integer(i) => Some(*i as f64),
                        Object::Real(f) => Some(f64::from(*f)),
                        _ => None,
                    })
                    .collect();
                if nums.len() != 4 {
                    return Err(UnredactError::page(page, "malformed MediaBox"));
                }
                return Ok([nums[0], nums[1], nums[2], nums[3]]);
            }

            match dict.get(b"Parent") {
                Ok(parent) => {
                    current = parent
                        .as_reference()
                        .map_err(|e| UnredactError::page(page, e))?;
                }
                Err(_) => return Err(UnredactError::page(page, "MediaBox not found")),
            }
        }
    }

    /// The parsed document, for output composition.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Runs (or recalls) the content walk for one page.
    fn primitives(&self, page: usize) -> UnredactResult<PagePrimitives> {
        if let Some(hit) = self.cache.borrow().get(&page) {
            return Ok(hit.clone());
        }
        let id = self.page_id(page)?;
        let (_, height) = self.page_size(page)?;
        let prims = walk_page(&self.doc, id, page, height)?;
        self.cache.borrow_mut().insert(page, prims.clone());
        Ok(prims)
    }
}

impl DocumentSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_size(&self, page: usize) -> UnredactResult<(f64, f64)> {
        let [x0, y0, x1, y1] = self.media_box(page)?;
        Ok(((x1 - x0).abs(), (y1 - y0).abs()))
    }

    fn fills(&self, page: usize) -> UnredactResult<Vec<FillShape>> {
        Ok(self.primitives(page)?.fills)
    }

    fn image_blocks(&self, page: usize) -> UnredactResult<Vec<ImageBlock>> {
        Ok(self.primitives(page)?.images)
    }

    fn chars(&self, page: usize) -> UnredactResult<Vec<CharSpan>> {
        Ok(self.primitives(page)?.chars)
    }
}
