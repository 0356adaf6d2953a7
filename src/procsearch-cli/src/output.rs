//! Result rendering for `search` and `list`.

use std::collections::BTreeMap;
use std::io::{self, Write};

use procsearch_engine::{QueryState, Record, Span, compute_spans, render};
use serde::Serialize;

use crate::styled_output::{BOLD, RESET};

/// Markers wrapped around highlighted spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub open: &'static str,
    pub close: &'static str,
}

impl Markers {
    pub const ANSI: Self = Self {
        open: "\x1b[1;33m",
        close: RESET,
    };

    pub const NONE: Self = Self { open: "", close: "" };

    pub fn is_none(&self) -> bool {
        self.open.is_empty() && self.close.is_empty()
    }
}

/// One record with the spans to highlight.
#[derive(Debug, Serialize)]
pub struct Hit<'a> {
    #[serde(flatten)]
    pub record: &'a Record,
    pub name_spans: Vec<Span>,
    pub specialty_spans: Vec<Span>,
}

impl<'a> Hit<'a> {
    pub fn new(record: &'a Record, query: &QueryState) -> Self {
        Self {
            record,
            name_spans: compute_spans(&record.procedure_name, &query.search_text),
            specialty_spans: compute_spans(&record.specialty, &query.specialty_filter),
        }
    }
}

/// JSON document printed by `search --json`.
#[derive(Debug, Serialize)]
pub struct SearchReport<'a> {
    pub query: &'a QueryState,
    pub total: usize,
    pub matched: usize,
    pub records: Vec<Hit<'a>>,
}

/// Writes numbered result rows.
pub fn write_hits(out: &mut impl Write, hits: &[Hit<'_>], markers: Markers) -> io::Result<()> {
    let width = hits.len().to_string().len();
    for (idx, hit) in hits.iter().enumerate() {
        let record = hit.record;
        let name = paint(&record.procedure_name, &hit.name_spans, markers);
        let specialty = paint(&record.specialty, &hit.specialty_spans, markers);
        writeln!(out, "{:>width$}. {}", idx + 1, name)?;
        writeln!(
            out,
            "{:width$}  {} | {} | {}",
            "",
            specialty,
            record.standard_category,
            record.issuing_decision_ref
        )?;
    }
    Ok(())
}

fn paint(text: &str, spans: &[Span], markers: Markers) -> String {
    if markers.is_none() {
        text.to_string()
    } else {
        render(text, spans, markers.open, markers.close)
    }
}

/// Number of records per standard category, sorted by label.
pub fn category_counts<'a>(records: impl IntoIterator<Item = &'a Record>) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.standard_category.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Writes a bold heading line when colors are on.
pub fn write_heading(out: &mut impl Write, text: &str, colors: bool) -> io::Result<()> {
    if colors {
        writeln!(out, "{BOLD}{text}{RESET}")
    } else {
        writeln!(out, "{text}")
    }
}
