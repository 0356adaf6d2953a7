//! CSV import command.
//!
//! Parses a spreadsheet export and uploads it to the catalogue in chunks.
//! Ctrl+C stops the upload before the next chunk; chunks already written
//! stay in place.

use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use procsearch_engine::{
    ImportReport, SkippedRow, UploadError, UploadMode, UploadOptions, UploadOutcome, UploadPhase,
    UploadProgress, parse_csv, upload,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::GlobalArgs;
use crate::context::AppContext;
use crate::styled_output::{print_dim, print_info, print_success, print_warning};

/// Skipped rows printed individually.
const SHOWN_SKIPS: usize = 10;

const PROGRESS_TEMPLATE: &str = "{msg:>9} {bar:40.cyan/blue} {pos}/{len} ({percent}%)";

/// Import procedures from a CSV file.
#[derive(Debug, Parser)]
pub struct ImportCli {
    /// CSV file to import, or "-" for stdin
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Delete every existing record before inserting
    #[arg(long)]
    pub replace: bool,

    /// Parse and validate the file without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Records written per chunk (default from config)
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON document printed by `import --json`.
#[derive(Debug, Serialize)]
pub struct ImportSummary<'a> {
    pub file: &'a Path,
    pub total_rows: usize,
    pub parsed: usize,
    pub skipped: &'a [SkippedRow],
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<UploadOutcome>,
}

impl ImportCli {
    /// Run the import command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let text = read_input(&self.file)?;
        let report = parse_csv(&text)
            .with_context(|| format!("Failed to parse {}", self.file.display()))?;

        if !self.json {
            report_parse(&report);
        }
        if self.dry_run {
            return self.finish(&report, None);
        }
        if report.records.is_empty() {
            bail!("No valid rows to import in {}", self.file.display());
        }

        let ctx = AppContext::open(global)?;
        let mode = if self.replace {
            UploadMode::Replace
        } else {
            UploadMode::Append
        };
        let mut options = UploadOptions::from_config(ctx.engine(), mode);
        if let Some(chunk_size) = self.chunk_size {
            options = options.with_chunk_size(chunk_size);
        }

        let cancel = CancellationToken::new();
        let interrupt = spawn_interrupt_handler(cancel.clone());

        let mut progress = UploadProgressBar::new(!self.json && std::io::stderr().is_terminal());
        let result = upload(
            ctx.catalog.as_ref(),
            &report.records,
            options,
            |p| progress.update(p),
            &cancel,
            Some(ctx.cache.as_ref()),
        )
        .await;
        progress.finish();
        interrupt.abort();

        match result {
            Ok(outcome) => self.finish(&report, Some(outcome)),
            Err(UploadError::Cancelled { progress }) => {
                print_warning(&format!(
                    "Import cancelled: {} deleted, {} inserted before stopping",
                    progress.deleted, progress.inserted
                ));
                bail!("Import cancelled");
            }
            Err(e) => Err(e).context("Import failed"),
        }
    }

    fn finish(&self, report: &ImportReport, outcome: Option<UploadOutcome>) -> Result<()> {
        if self.json {
            let summary = ImportSummary {
                file: &self.file,
                total_rows: report.total_rows,
                parsed: report.records.len(),
                skipped: &report.skipped,
                dry_run: self.dry_run,
                outcome,
            };
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &summary)?;
            writeln!(stdout)?;
            return Ok(());
        }

        match outcome {
            Some(outcome) if outcome.deleted > 0 => print_success(&format!(
                "Replaced {} records with {} new records",
                outcome.deleted, outcome.inserted
            )),
            Some(outcome) => print_success(&format!("Imported {} records", outcome.inserted)),
            None => print_info("Dry run: nothing was written"),
        }
        Ok(())
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn report_parse(report: &ImportReport) {
    print_info(&format!(
        "Parsed {} of {} rows",
        report.records.len(),
        report.total_rows
    ));
    if report.is_clean() {
        return;
    }
    print_warning(&format!(
        "Skipped {} rows with the wrong number of columns",
        report.skipped.len()
    ));
    for row in report.skipped.iter().take(SHOWN_SKIPS) {
        print_dim(&format!(
            "line {}: expected {} columns, found {}: {}",
            row.line, row.expected, row.actual, row.preview
        ));
    }
    if report.skipped.len() > SHOWN_SKIPS {
        print_dim(&format!("... and {} more", report.skipped.len() - SHOWN_SKIPS));
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current chunk");
            cancel.cancel();
        }
    })
}

/// Upload progress bar on stderr, one bar length per phase.
///
/// Hidden when stderr is not a terminal or output is JSON; updates then go
/// to the debug log instead.
struct UploadProgressBar {
    bar: ProgressBar,
    phase: Option<UploadPhase>,
}

impl UploadProgressBar {
    fn new(visible: bool) -> Self {
        let bar = if visible {
            let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
                .map(|style| style.progress_chars("██░"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            let bar = ProgressBar::new(0);
            bar.set_style(style);
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar, phase: None }
    }

    fn update(&mut self, progress: UploadProgress) {
        if self.bar.is_hidden() {
            tracing::debug!(
                phase = %progress.phase,
                current = progress.current,
                total = progress.total,
                "upload progress"
            );
        }
        if self.phase != Some(progress.phase) {
            self.phase = Some(progress.phase);
            self.bar.set_length(progress.total as u64);
            self.bar.set_message(progress.phase.to_string());
        }
        self.bar.set_position(progress.current as u64);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
