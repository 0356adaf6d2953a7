//! `search` and `list` commands.
//!
//! Both load the catalogue through the feed, so a fresh cache answers
//! without reading the catalogue file.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Parser};
use procsearch_engine::{
    CategoryFilter, MatchMode, QueryState, Record, RecordField, SearchSession, SortState,
};
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::context::AppContext;
use crate::output::{Hit, Markers, SearchReport, category_counts, write_heading, write_hits};
use crate::styled_output::{print_dim, print_info, print_warning, use_colors};

/// Sort options shared by `search` and `list`.
#[derive(Debug, Clone, Args)]
pub struct SortArgs {
    /// Sort by this column
    #[arg(long, value_enum, value_name = "FIELD")]
    pub sort: Option<RecordField>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

impl SortArgs {
    /// The sort state reached by toggling the column once, or twice for
    /// descending.
    pub fn state(&self) -> SortState {
        let Some(field) = self.sort else {
            return SortState::Unsorted;
        };
        let state = SortState::default().toggle(field);
        if self.desc { state.toggle(field) } else { state }
    }
}

/// Search the catalogue.
#[derive(Debug, Parser)]
pub struct SearchCli {
    /// Words to look for in the procedure name
    #[arg(value_name = "TEXT")]
    pub text: Vec<String>,

    /// Filter by specialty (matched with the same mode as the name)
    #[arg(long, short = 's')]
    pub specialty: Option<String>,

    /// Filter by standard category: all, old, new or an exact label
    #[arg(long, short = 'k', value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Matching mode for the name and specialty
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<MatchMode>,

    /// Start from the saved query instead of an empty one
    #[arg(long)]
    pub last: bool,

    #[command(flatten)]
    pub sort: SortArgs,

    /// Maximum number of results to print
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not highlight matches
    #[arg(long)]
    pub no_highlight: bool,
}

impl SearchCli {
    /// Run the search command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(global)?;
        let feed = ctx.feed();
        if let Some(error) = feed.last_error() {
            print_warning(&format!("Catalogue unavailable: {error}"));
        }

        let session = ctx.session()?;
        self.apply_to(&session);
        let query = session.query();
        tracing::debug!(?query, "running search");

        let records = feed.records();
        let mut matched = session.results(&records);
        self.sort.state().apply(&mut matched);

        let limit = self.limit.unwrap_or(ctx.config.display.limit);
        let hits: Vec<Hit<'_>> = matched
            .iter()
            .take(limit)
            .map(|record| Hit::new(record, &query))
            .collect();

        let mut stdout = std::io::stdout().lock();
        if self.json {
            let report = SearchReport {
                query: &query,
                total: records.len(),
                matched: matched.len(),
                records: hits,
            };
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
            return Ok(());
        }

        if matched.is_empty() {
            print_info(&format!(
                "No procedures match ({} in catalogue)",
                records.len()
            ));
            return Ok(());
        }

        let markers = if !self.no_highlight && ctx.config.display.highlight && use_colors(false) {
            Markers::ANSI
        } else {
            Markers::NONE
        };
        write_hits(&mut stdout, &hits, markers)?;
        drop(stdout);

        print_dim(&format!(
            "{} of {} procedures match ({} mode){}",
            matched.len(),
            records.len(),
            query.match_mode,
            if hits.len() < matched.len() {
                format!(", showing {}", hits.len())
            } else {
                String::new()
            }
        ));
        Ok(())
    }

    /// Applies the command line to the session, submitting the search text.
    pub fn apply_to(&self, session: &SearchSession) {
        if !self.last {
            session.clear();
        }
        if let Some(mode) = self.mode {
            session.set_match_mode(mode);
        }
        if let Some(category) = &self.category {
            let filter: CategoryFilter = category.parse().unwrap_or_default();
            session.set_category(filter);
        }
        if let Some(specialty) = &self.specialty {
            session.set_specialty(specialty.as_str());
        }
        if !self.text.is_empty() {
            session.set_search_text(self.text.join(" "));
            session.submit();
        }
    }
}

/// List the whole catalogue.
#[derive(Debug, Parser)]
pub struct ListCli {
    #[command(flatten)]
    pub sort: SortArgs,

    /// Maximum number of records to print
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,

    /// Only print the number of records per category
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Serialize)]
struct ListReport<'a> {
    total: usize,
    categories: std::collections::BTreeMap<&'a str, usize>,
    records: Vec<&'a Record>,
}

impl ListCli {
    /// Run the list command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(global)?;
        let feed = ctx.feed();
        if let Some(error) = feed.last_error() {
            print_warning(&format!("Catalogue unavailable: {error}"));
        }

        let records = feed.records();
        let mut rows: Vec<&Record> = records.iter().collect();
        self.sort.state().apply(&mut rows);
        let limit = if self.summary {
            0
        } else {
            self.limit.unwrap_or(ctx.config.display.limit)
        };
        rows.truncate(limit);

        let mut stdout = std::io::stdout().lock();
        if self.json {
            let report = ListReport {
                total: records.len(),
                categories: category_counts(records.iter()),
                records: rows,
            };
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
            return Ok(());
        }

        if records.is_empty() {
            print_info("The catalogue is empty. Run `procsearch import <CSV>` to load it.");
            return Ok(());
        }

        let colors = use_colors(false);
        write_heading(&mut stdout, &format!("{} procedures", records.len()), colors)?;
        for (category, count) in category_counts(records.iter()) {
            writeln!(stdout, "  {count:>6}  {category}")?;
        }
        if !rows.is_empty() {
            writeln!(stdout)?;
            let query = QueryState::new();
            let hits: Vec<Hit<'_>> = rows.iter().map(|r| Hit::new(r, &query)).collect();
            write_hits(&mut stdout, &hits, Markers::NONE)?;
        }
        Ok(())
    }
}
