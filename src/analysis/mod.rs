//! Redaction detection and glyph correlation.
//!
//! Three stages, each a pure function of one page's primitives: candidate
//! box extraction, glyph indexing, and the overlap match that decides
//! whether text survives underneath a redaction.

pub mod boxes;
pub mod glyphs;
pub mod overlap;

pub use boxes::{extract_redaction_boxes, RedactionBox};
pub use glyphs::{index_glyphs, Glyph};
pub use overlap::{match_boxes, DocumentMatches, RecoveredRegion};
