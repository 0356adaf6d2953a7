//! Single-record `add`, `edit` and `delete` commands.

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser};
use procsearch_engine::{NewRecord, Record, create_record, delete_record, edit_record};

use crate::cli::GlobalArgs;
use crate::context::AppContext;
use crate::styled_output::print_success;

/// Value parser for the procedure name: trimmed and not blank.
fn procedure_name(value: &str) -> std::result::Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("procedure name cannot be empty".to_string());
    }
    Ok(value.to_string())
}

/// Add one record to the catalogue.
#[derive(Debug, Parser)]
pub struct AddCli {
    /// Standard category
    #[arg(long, default_value = "")]
    pub category: String,

    /// Issuing decision reference
    #[arg(long, default_value = "")]
    pub decision: String,

    /// Specialty
    #[arg(long, default_value = "")]
    pub specialty: String,

    /// Procedure name
    #[arg(long, value_parser = procedure_name)]
    pub name: String,
}

impl AddCli {
    /// Run the add command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(global)?;
        let record = self.to_record();
        let id = create_record(ctx.catalog.as_ref(), &record, Some(ctx.cache.as_ref()))
            .await
            .context("Failed to add record")?;
        print_success(&format!("Added {} ({id})", record.procedure_name));
        Ok(())
    }

    /// The record to insert, with surrounding whitespace removed.
    pub fn to_record(&self) -> NewRecord {
        NewRecord::new(
            self.category.trim(),
            self.decision.trim(),
            self.specialty.trim(),
            self.name.as_str(),
        )
    }
}

/// Edit the text fields of one record.
#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("fields").required(true).multiple(true)))]
pub struct EditCli {
    /// Record id
    #[arg(value_name = "ID")]
    pub id: String,

    /// New standard category
    #[arg(long, group = "fields")]
    pub category: Option<String>,

    /// New issuing decision reference
    #[arg(long, group = "fields")]
    pub decision: Option<String>,

    /// New specialty
    #[arg(long, group = "fields")]
    pub specialty: Option<String>,

    /// New procedure name
    #[arg(long, group = "fields", value_parser = procedure_name)]
    pub name: Option<String>,
}

impl EditCli {
    /// Run the edit command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(global)?;
        let current = ctx
            .catalog
            .records()
            .into_iter()
            .find(|r| r.id == self.id);
        let Some(current) = current else {
            bail!("No record with id {}", self.id);
        };

        let updated = self.merge(&current);
        edit_record(ctx.catalog.as_ref(), &self.id, &updated, Some(ctx.cache.as_ref()))
            .await
            .with_context(|| format!("Failed to update record {}", self.id))?;
        print_success(&format!("Updated {}", updated.procedure_name));
        Ok(())
    }

    /// The record's fields with the given overrides applied.
    pub fn merge(&self, current: &Record) -> NewRecord {
        let mut record = NewRecord::from(current);
        let overrides = [
            (&mut record.standard_category, &self.category),
            (&mut record.issuing_decision_ref, &self.decision),
            (&mut record.specialty, &self.specialty),
            (&mut record.procedure_name, &self.name),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value.trim().to_string();
            }
        }
        record
    }
}

/// Delete one record.
#[derive(Debug, Parser)]
pub struct DeleteCli {
    /// Record id
    #[arg(value_name = "ID")]
    pub id: String,
}

impl DeleteCli {
    /// Run the delete command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(global)?;
        delete_record(ctx.catalog.as_ref(), &self.id, Some(ctx.cache.as_ref()))
            .await
            .with_context(|| format!("Failed to delete record {}", self.id))?;
        print_success(&format!("Deleted {}", self.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_overrides_given_fields() {
        let current = NewRecord::new("old", "QĐ 1", "Nhi", "Khám nhi")
            .into_record("r1", chrono::Utc::now());
        let cli = EditCli::try_parse_from([
            "edit",
            "r1",
            "--name",
            " Khám nhi tổng quát ",
            "--decision",
            "QĐ 2",
        ])
        .unwrap();
        assert_eq!(
            cli.merge(&current),
            NewRecord::new("old", "QĐ 2", "Nhi", "Khám nhi tổng quát")
        );
    }

    #[test]
    fn test_add_trims_fields() {
        let cli = AddCli::try_parse_from([
            "add",
            "--name",
            " Siêu âm tim ",
            "--specialty",
            " Tim mạch",
        ])
        .unwrap();
        assert_eq!(cli.to_record(), NewRecord::new("", "", "Tim mạch", "Siêu âm tim"));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        assert!(AddCli::try_parse_from(["add"]).is_err());
        assert!(AddCli::try_parse_from(["add", "--name", "   "]).is_err());
        assert!(EditCli::try_parse_from(["edit", "r1", "--name", "   "]).is_err());
        assert!(EditCli::try_parse_from(["edit", "r1", "--name", ""]).is_err());
    }

    #[test]
    fn test_edit_requires_a_field() {
        assert!(EditCli::try_parse_from(["edit", "r1"]).is_err());
    }
}
