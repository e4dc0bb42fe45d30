//! Redaction audit CLI.
//!
//! Scans PDFs for improper redactions, prints a summary, optionally
//! writes a JSON report and recovery documents.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use unredact::layout::LayoutConfig;
use unredact::{collect_pdf_files, OutputMode, ScanConfig, ScanPipeline, ScanReport};

/// Redaction audit and recovery tool
///
/// Finds PDFs where text survives under redaction boxes and recovers it.
/// By default every flagged file is processed; use --scan-only to audit
/// without writing recovery documents.
#[derive(Parser)]
#[command(name = "unredact")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input PDF file or directory
    input: PathBuf,

    /// Output directory for recovery documents (default: next to input)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// How recovered content is presented
    #[arg(short, long, value_enum, default_value = "highlight")]
    mode: Mode,

    /// Analyze and report only; write no recovery documents
    #[arg(long)]
    scan_only: bool,

    /// Recurse into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Worker pool size (default: available cores minus one)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Write the JSON scan report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Vertical clustering tolerance for line reconstruction, in points
    #[arg(long, value_name = "PTS", default_value_t = 2.0)]
    line_tol: f64,

    /// Point width attributed to one reconstructed space
    #[arg(long, value_name = "PTS", default_value_t = 3.0)]
    space_unit: f64,

    /// Minimum spaces inserted for any positive inter-word gap
    #[arg(long, value_name = "N", default_value_t = 1)]
    min_spaces: usize,

    /// Minimum box coverage of a glyph for it to count as hidden
    #[arg(long, value_name = "RATIO", default_value_t = 0.5)]
    overlap_threshold: f64,

    /// Fill darkness cutoff for redaction candidates
    #[arg(long, value_name = "LEVEL", default_value_t = 0.15)]
    black_threshold: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Mark each redaction box with a translucent highlight
    Highlight,
    /// Original page on the left, recovered text on the right
    SideBySide,
    /// Overprint recovered text in white at its original position
    OverlayWhite,
}

impl From<Mode> for OutputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Highlight => OutputMode::Highlight,
            Mode::SideBySide => OutputMode::SideBySide,
            Mode::OverlayWhite => OutputMode::OverlayWhite,
        }
    }
}

fn build_config(cli: &Cli) -> ScanConfig {
    let mut config = ScanConfig {
        black_threshold: cli.black_threshold,
        overlap_threshold: cli.overlap_threshold,
        layout: LayoutConfig {
            line_tolerance: cli.line_tol,
            space_unit_pts: cli.space_unit,
            min_spaces: cli.min_spaces,
        },
        ..ScanConfig::default()
    };
    if let Some(workers) = cli.workers {
        config.workers = workers.max(1);
    }
    config
}

fn print_summary(report: &ScanReport) {
    println!("Scan Summary:");
    println!("  Files scanned:          {}", report.total_files);
    println!(
        "  With redaction boxes:   {}",
        report.files_with_redaction_boxes
    );
    println!(
        "  With recoverable text:  {}",
        report.files_with_recoverable_text
    );
    println!("  Flagged for recovery:   {}", report.files_to_process);

    for file in &report.files {
        if let Some(error) = &file.error {
            println!("  ⚠ {}: {}", file.filename, error);
        } else if file.should_process {
            println!(
                "  ✓ {}: {} box(es), {} hidden character(s)",
                file.filename, file.redaction_box_count, file.redacted_char_count
            );
            for region in &file.recoverable_regions {
                let mut text = region.text.clone();
                if text.chars().count() > 60 {
                    text = text.chars().take(60).collect::<String>() + "…";
                }
                println!("      page {}: \"{}\"", region.page + 1, text);
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let pipeline = ScanPipeline::new(build_config(&cli));

    let files = collect_pdf_files(&cli.input, cli.recursive)
        .with_context(|| format!("cannot read input '{}'", cli.input.display()))?;
    if files.is_empty() {
        println!("⚠ No PDF files found under {}", cli.input.display());
    }

    let report = pipeline.scan(&files).context("scan failed")?;
    print_summary(&report);

    if let Some(report_path) = &cli.report {
        report
            .write_json(report_path)
            .with_context(|| format!("failed to write report to {}", report_path.display()))?;
        println!("✓ Report → {}", report_path.display());
    }

    if cli.scan_only {
        return Ok(());
    }

    if report.files_to_process == 0 {
        println!("⚠ Nothing to recover");
        return Ok(());
    }

    let written = pipeline.process_flagged(&report, cli.mode.into(), cli.output.as_deref());
    for path in &written {
        println!("✓ Recovered → {}", path.display());
    }
    if written.len() < report.files_to_process {
        println!(
            "⚠ {} file(s) failed during recovery (see log)",
            report.files_to_process - written.len()
        );
    }

    Ok(())
}
