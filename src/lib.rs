//! Redaction audit and recovery for PDF documents.
//!
//! Many "redacted" PDFs only draw a dark rectangle (or paste an image)
//! over the sensitive text; the glyphs remain in the file and can be
//! extracted verbatim. This library finds those improper redactions and
//! recovers what hides underneath.
//!
//! # Features
//!
//! - **Batch scanning**: parallel audit of whole directory trees with a
//!   per-file JSON report
//! - **Candidate detection**: dark vector fills and pasted image blocks
//!   are both treated as potential redaction covers
//! - **Text recovery**: glyph-level overlap matching, then line and
//!   spacing reconstruction from raw geometry
//! - **Three output styles**: highlight the suspect regions, render the
//!   recovered text beside the original page, or overprint it in place
//!
//! # Architecture
//!
//! - [`source`]: the document provider seam and the bundled lopdf backend
//! - [`analysis`]: redaction box extraction, glyph indexing, overlap
//!   matching
//! - [`layout`]: line clustering and inter-word spacing reconstruction
//! - [`render`]: output document composition
//! - [`pipeline`]: batch orchestration, worker pool, report
//! - [`error`]: error taxonomy shared by all stages
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use unredact::{collect_pdf_files, ScanConfig, ScanPipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = collect_pdf_files(Path::new("bills/"), true)?;
//! let pipeline = ScanPipeline::new(ScanConfig::default());
//!
//! let report = pipeline.scan(&files)?;
//! println!(
//!     "{} of {} files have recoverable text under redactions",
//!     report.files_to_process, report.total_files
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Recovering a single file
//!
//! ```no_run
//! use std::path::Path;
//! use unredact::{OutputMode, ScanPipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ScanPipeline::default();
//! let written = pipeline.recover_file(
//!     Path::new("leaky.pdf"),
//!     OutputMode::SideBySide,
//!     Some(Path::new("recovered/")),
//! )?;
//! println!("wrote {}", written.display());
//! # Ok(())
//! # }
//! ```

// Public API
pub mod analysis;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod source;

// Re-exports for convenient access
pub use error::{UnredactError, UnredactResult};
pub use pipeline::{
    collect_pdf_files, output_path, AnalysisResult, ScanConfig, ScanPipeline, ScanReport,
};
pub use render::OutputMode;
pub use source::{DocumentSource, PdfSource};
