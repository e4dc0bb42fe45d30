//! Batch scanning and recovery orchestration.
//!
//! A scan walks every input file through the same stages: open, extract
//! candidate boxes and glyphs per page, correlate, summarize. Files are
//! fully independent of each other, so the scan fans out over a bounded
//! worker pool; every failure is captured in that file's result and the
//! batch keeps going. Recovery re-opens a file, reconstructs the hidden
//! text page by page, and writes one output document per input.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{extract_redaction_boxes, index_glyphs, match_boxes, RecoveredRegion};
use crate::error::{UnredactError, UnredactResult};
use crate::layout::{reconstruct_lines, LayoutConfig, Line};
use crate::render::{render_recovery, OutputMode, PageRecovery};
use crate::source::{DocumentSource, PdfSource};

/// Scan and recovery tuning. All values have working defaults; the
/// thresholds are surfaced here rather than buried at call sites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    /// Worker pool size for file-level and page-level parallelism.
    /// Computed once at construction, never re-read from the host.
    pub workers: usize,
    /// Darkness cutoff for fill classification.
    pub black_threshold: f64,
    /// Minimum box-over-glyph coverage for a match.
    pub overlap_threshold: f64,
    pub layout: LayoutConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            // Leave one core for the rest of the process.
            workers: num_cpus::get().saturating_sub(1).max(1),
            black_threshold: 0.15,
            overlap_threshold: 0.5,
            layout: LayoutConfig::default(),
        }
    }
}

/// Per-file scan outcome, serialized verbatim into the report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub path: String,
    pub filename: String,
    pub has_redaction_boxes: bool,
    pub has_recoverable_text: bool,
    pub redaction_box_count: usize,
    pub redacted_char_count: usize,
    pub recoverable_regions: Vec<RecoveredRegion>,
    pub should_process: bool,
    pub error: Option<String>,
}

impl AnalysisResult {
    fn empty(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            filename: path
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or_default()
                .to_string(),
            has_redaction_boxes: false,
            has_recoverable_text: false,
            redaction_box_count: 0,
            redacted_char_count: 0,
            recoverable_regions: Vec::new(),
            should_process: false,
            error: None,
        }
    }
}

/// Aggregate scan report.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub total_files: usize,
    pub files_with_redaction_boxes: usize,
    pub files_with_recoverable_text: usize,
    pub files_to_process: usize,
    pub files: Vec<AnalysisResult>,
}

impl ScanReport {
    pub fn from_results(files: Vec<AnalysisResult>) -> Self {
        Self {
            total_files: files.len(),
            files_with_redaction_boxes: files.iter().filter(|f| f.has_redaction_boxes).count(),
            files_with_recoverable_text: files.iter().filter(|f| f.has_recoverable_text).count(),
            files_to_process: files.iter().filter(|f| f.should_process).count(),
            files,
        }
    }

    pub fn to_json(&self) -> UnredactResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| UnredactError::InvalidInput {
            parameter: "report".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn write_json(&self, path: &Path) -> UnredactResult<()> {
        fs::write(path, self.to_json()?).map_err(|e| UnredactError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Expands an input path into the list of PDF files to scan, sorted for
/// deterministic report order. A file input is taken as-is; a directory
/// is walked one level deep, or fully with `recursive`.
pub fn collect_pdf_files(input: &Path, recursive: bool) -> UnredactResult<Vec<PathBuf>> {
    if !input.exists() {
        return Err(UnredactError::InvalidInput {
            parameter: "input".to_string(),
            reason: format!("path '{}' does not exist", input.display()),
        });
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    collect_dir(input, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_dir(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> UnredactResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| UnredactError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| UnredactError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_dir(&path, true, out)?;
            }
        } else if is_pdf(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Derives the output file name for one input and mode.
pub fn output_path(input: &Path, mode: OutputMode, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    let name = format!("{stem}{}.pdf", mode.file_suffix());
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// The scan and recovery driver.
#[derive(Debug, Clone, Default)]
pub struct ScanPipeline {
    config: ScanConfig,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn pool(&self) -> UnredactResult<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| UnredactError::InvalidInput {
                parameter: "workers".to_string(),
                reason: e.to_string(),
            })
    }

    /// Scans a batch of files in parallel. Each worker opens its own
    /// document handle; nothing is shared across files.
    pub fn scan(&self, files: &[PathBuf]) -> UnredactResult<ScanReport> {
        info!(files = files.len(), workers = self.config.workers, "scanning");
        let pool = self.pool()?;
        let results: Vec<AnalysisResult> =
            pool.install(|| files.par_iter().map(|path| self.analyze_file(path)).collect());
        Ok(ScanReport::from_results(results))
    }

    /// Analyzes one file. Never returns an error: an unreadable document
    /// is recorded in the result and excluded from further stages.
    pub fn analyze_file(&self, path: &Path) -> AnalysisResult {
        let mut result = AnalysisResult::empty(path);
        let source = match PdfSource::open(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable document");
                result.error = Some(e.to_string());
                return result;
            }
        };

        let mut boxes = Vec::new();
        let mut glyphs = Vec::new();
        for page in 0..source.page_count() {
            boxes.extend(extract_redaction_boxes(
                &source,
                page,
                self.config.black_threshold,
            ));
            glyphs.extend(index_glyphs(&source, page));
        }
        let matches = match_boxes(&boxes, &glyphs, self.config.overlap_threshold);

        debug!(
            path = %path.display(),
            boxes = boxes.len(),
            recovered = matches.recovered_char_count,
            "analyzed"
        );
        result.has_redaction_boxes = !boxes.is_empty();
        result.has_recoverable_text = matches.has_recoverable_text();
        result.redaction_box_count = boxes.len();
        result.redacted_char_count = matches.recovered_char_count;
        result.recoverable_regions = matches.regions;
        result.should_process = result.has_redaction_boxes && result.has_recoverable_text;
        result
    }

    /// Recovers one file and writes the output document.
    ///
    /// Page primitives are gathered sequentially, line reconstruction
    /// runs page-parallel, and the results are put back in page order
    /// before the strictly sequential render.
    pub fn recover_file(
        &self,
        path: &Path,
        mode: OutputMode,
        output_dir: Option<&Path>,
    ) -> UnredactResult<PathBuf> {
        let source = PdfSource::open(path)?;
        let page_count = source.page_count();

        let mut sizes = Vec::with_capacity(page_count);
        let mut page_boxes = Vec::with_capacity(page_count);
        let mut page_words = Vec::with_capacity(page_count);
        for page in 0..page_count {
            let size = match source.page_size(page) {
                Ok(size) => size,
                Err(e) => {
                    warn!(page, error = %e, "page size unavailable, assuming letter");
                    (612.0, 792.0)
                }
            };
            let boxes = extract_redaction_boxes(&source, page, self.config.black_threshold);
            // Line reconstruction takes every word on the page, visible
            // or covered.
            let words = match source.words(page) {
                Ok(words) => words,
                Err(e) => {
                    warn!(page, error = %e, "skipping words on unreadable page");
                    Vec::new()
                }
            };
            sizes.push(size);
            page_boxes.push(boxes);
            page_words.push(words);
        }

        let pool = self.pool()?;
        let layout = self.config.layout;
        let mut reconstructed: Vec<(usize, Vec<Line>)> = pool.install(|| {
            page_words
                .into_par_iter()
                .enumerate()
                .map(|(page, words)| (page, reconstruct_lines(&words, &layout)))
                .collect()
        });
        // Pool results are indexed back into page order, never taken in
        // arrival order.
        reconstructed.sort_by_key(|(page, _)| *page);

        let pages: Vec<PageRecovery> = reconstructed
            .into_iter()
            .zip(sizes)
            .zip(page_boxes)
            .map(|(((_, lines), (width, height)), boxes)| PageRecovery {
                width,
                height,
                lines,
                boxes,
            })
            .collect();

        let mut out = render_recovery(source.document(), path, &pages, mode)?;
        let out_path = output_path(path, mode, output_dir);
        if let Some(dir) = output_dir {
            fs::create_dir_all(dir).map_err(|e| UnredactError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        out.save(&out_path)
            .map_err(|e| UnredactError::render(&out_path, e))?;
        info!(input = %path.display(), output = %out_path.display(), "wrote recovery");
        Ok(out_path)
    }

    /// Runs recovery over every file the scan flagged. A failing file is
    /// logged and skipped; the batch never aborts.
    pub fn process_flagged(
        &self,
        report: &ScanReport,
        mode: OutputMode,
        output_dir: Option<&Path>,
    ) -> Vec<PathBuf> {
        let mut written = Vec::new();
        for file in report.files.iter().filter(|f| f.should_process) {
            let path = Path::new(&file.path);
            match self.recover_file(path, mode, output_dir) {
                Ok(out) => written.push(out),
                Err(e) => warn!(path = %path.display(), error = %e, "recovery failed"),
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_reserves_one_core() {
        let config = ScanConfig::default();
        assert!(config.workers >= 1);
        assert!(config.workers <= num_cpus::get());
    }

    #[test]
    fn test_report_aggregation() {
        let mut ok = AnalysisResult::empty(Path::new("a.pdf"));
        ok.has_redaction_boxes = true;
        ok.has_recoverable_text = true;
        ok.redaction_box_count = 2;
        ok.redacted_char_count = 12;
        ok.should_process = true;

        let mut boxes_only = AnalysisResult::empty(Path::new("b.pdf"));
        boxes_only.has_redaction_boxes = true;
        boxes_only.redaction_box_count = 1;

        let clean = AnalysisResult::empty(Path::new("c.pdf"));

        let report = ScanReport::from_results(vec![ok, boxes_only, clean]);
        assert_eq!(report.total_files, 3);
        assert_eq!(report.files_with_redaction_boxes, 2);
        assert_eq!(report.files_with_recoverable_text, 1);
        assert_eq!(report.files_to_process, 1);
    }

    #[test]
    fn test_report_json_shape() {
        let report = ScanReport::from_results(vec![AnalysisResult::empty(Path::new("a.pdf"))]);
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_files"], 1);
        assert_eq!(value["files"][0]["filename"], "a.pdf");
        assert_eq!(value["files"][0]["error"], serde_json::Value::Null);
        assert_eq!(value["files"][0]["should_process"], false);
    }

    #[test]
    fn test_collect_missing_path_is_an_error() {
        let err = collect_pdf_files(Path::new("/no/such/path"), false).unwrap_err();
        assert!(matches!(err, UnredactError::InvalidInput { .. }));
    }

    #[test]
    fn test_collect_respects_recursion_flag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        fs::write(dir.path().join("a.PDF"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.pdf"), b"x").unwrap();

        let flat = collect_pdf_files(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        let deep = collect_pdf_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_single_file_input_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        fs::write(&file, b"x").unwrap();
        assert_eq!(collect_pdf_files(&file, false).unwrap(), vec![file]);
    }

    #[test]
    fn test_output_path_naming() {
        let path = output_path(Path::new("/tmp/report.pdf"), OutputMode::SideBySide, None);
        assert_eq!(path, Path::new("/tmp/report_side_by_side.pdf"));

        let path = output_path(
            Path::new("in/scan.pdf"),
            OutputMode::Highlight,
            Some(Path::new("out")),
        );
        assert_eq!(path, Path::new("out/scan_unredacted.pdf"));
    }

    #[test]
    fn test_unreadable_document_is_captured_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.pdf");
        fs::write(&file, b"this is not a pdf").unwrap();

        let pipeline = ScanPipeline::default();
        let result = pipeline.analyze_file(&file);
        assert!(result.error.is_some());
        assert!(!result.should_process);
        assert_eq!(result.filename, "broken.pdf");
    }
}
