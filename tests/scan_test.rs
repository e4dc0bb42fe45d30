//! End-to-end scan behavior over synthetic documents.

mod common;

use std::fs;

use common::fixtures::{improperly_redacted_page, mixed_visibility_page, TestPdfBuilder};
use unredact::analysis::{extract_redaction_boxes, index_glyphs, match_boxes};
use unredact::{DocumentSource, PdfSource, ScanPipeline};

#[test]
fn test_covered_text_is_recovered_verbatim() {
    let source = PdfSource::from_bytes(&improperly_redacted_page().build_mem()).unwrap();

    let boxes = extract_redaction_boxes(&source, 0, 0.15);
    assert_eq!(boxes.len(), 1);

    let glyphs = index_glyphs(&source, 0);
    assert_eq!(glyphs.len(), 6);

    let matches = match_boxes(&boxes, &glyphs, 0.5);
    assert!(matches.has_recoverable_text());
    assert_eq!(matches.regions.len(), 1);
    assert_eq!(matches.regions[0].text, "SECRET");
    assert_eq!(matches.regions[0].char_count, 6);
}

#[test]
fn test_flagged_file_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaky.pdf");
    improperly_redacted_page().build(&path);

    let result = ScanPipeline::default().analyze_file(&path);
    assert!(result.has_redaction_boxes);
    assert!(result.has_recoverable_text);
    assert!(result.should_process);
    assert_eq!(result.redaction_box_count, 1);
    assert_eq!(result.redacted_char_count, 6);
    assert!(result.error.is_none());
}

#[test]
fn test_visible_text_does_not_inflate_hidden_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.pdf");
    mixed_visibility_page().build(&path);

    let result = ScanPipeline::default().analyze_file(&path);
    assert!(result.should_process);
    // Only the covered run counts as redacted.
    assert_eq!(result.redacted_char_count, 6);
    assert_eq!(result.recoverable_regions.len(), 1);
    assert_eq!(result.recoverable_regions[0].text, "SECRET");
}

#[test]
fn test_box_without_text_is_not_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clean.pdf");
    TestPdfBuilder::new()
        .with_black_rect(10.0, 700.0, 60.0, 20.0)
        .build(&path);

    let result = ScanPipeline::default().analyze_file(&path);
    assert!(result.has_redaction_boxes);
    assert!(!result.has_recoverable_text);
    assert!(!result.should_process);
}

#[test]
fn test_image_blocks_count_as_candidates() {
    let source = PdfSource::from_bytes(
        &TestPdfBuilder::new()
            .with_image_block(10.0, 700.0, 60.0, 20.0)
            .build_mem(),
    )
    .unwrap();
    let boxes = extract_redaction_boxes(&source, 0, 0.15);
    assert_eq!(boxes.len(), 1);
}

#[test]
fn test_bright_rect_is_not_a_candidate() {
    let source = PdfSource::from_bytes(
        &TestPdfBuilder::new()
            .with_rect((1.0, 1.0, 0.0), 10.0, 700.0, 60.0, 20.0)
            .with_text("visible", 20.0, 706.0, 10.0)
            .build_mem(),
    )
    .unwrap();
    assert!(extract_redaction_boxes(&source, 0, 0.15).is_empty());
}

#[test]
fn test_box_and_text_on_different_pages_do_not_match() {
    let source = PdfSource::from_bytes(
        &TestPdfBuilder::new()
            .with_black_rect(10.0, 700.0, 60.0, 20.0)
            .new_page()
            .with_text("SECRET", 20.0, 706.0, 10.0)
            .build_mem(),
    )
    .unwrap();
    assert_eq!(source.page_count(), 2);

    let mut boxes = Vec::new();
    let mut glyphs = Vec::new();
    for page in 0..source.page_count() {
        boxes.extend(extract_redaction_boxes(&source, page, 0.15));
        glyphs.extend(index_glyphs(&source, page));
    }
    let matches = match_boxes(&boxes, &glyphs, 0.5);
    assert!(!matches.has_recoverable_text());
}

#[test]
fn test_batch_isolates_a_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..9 {
        improperly_redacted_page().build(&dir.path().join(format!("doc{i}.pdf")));
    }
    fs::write(dir.path().join("broken.pdf"), b"this is not a pdf at all").unwrap();

    let files = unredact::collect_pdf_files(dir.path(), false).unwrap();
    assert_eq!(files.len(), 10);

    let report = ScanPipeline::default().scan(&files).unwrap();
    assert_eq!(report.total_files, 10);
    assert_eq!(report.files.iter().filter(|f| f.error.is_none()).count(), 9);
    assert_eq!(report.files.iter().filter(|f| f.error.is_some()).count(), 1);
    assert_eq!(report.files_to_process, 9);

    let broken = report
        .files
        .iter()
        .find(|f| f.filename == "broken.pdf")
        .unwrap();
    assert!(broken.error.is_some());
    assert!(!broken.should_process);
}

#[test]
fn test_report_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaky.pdf");
    improperly_redacted_page().build(&path);

    let report = ScanPipeline::default().scan(&[path]).unwrap();
    let json_path = dir.path().join("report.json");
    report.write_json(&json_path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["total_files"], 1);
    assert_eq!(value["files_with_recoverable_text"], 1);
    assert_eq!(value["files"][0]["filename"], "leaky.pdf");
    assert_eq!(value["files"][0]["redacted_char_count"], 6);
    assert_eq!(value["files"][0]["error"], serde_json::Value::Null);
}
