use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_ORCID_COLUMN: usize = 1;
pub const DEFAULT_CONTRIBUTIONS_COLUMN: usize = 4;

/// One row of the contributions table: who, and in what roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub orcid: String,
    pub roles: Vec<String>,
}

/// Which 0-based columns hold the ORCID and the comma-separated roles.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub orcid: usize,
    pub contributions: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            orcid: DEFAULT_ORCID_COLUMN,
            contributions: DEFAULT_CONTRIBUTIONS_COLUMN,
        }
    }
}

pub fn parse_roles(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(String::from)
        .collect()
}

fn parse_row(row: &StringRecord, columns: Columns) -> Option<Contribution> {
    let orcid = row.get(columns.orcid)?.trim();
    if orcid.is_empty() {
        return None;
    }
    let roles = row.get(columns.contributions)?;
    Some(Contribution {
        orcid: orcid.to_string(),
        roles: parse_roles(roles),
    })
}

/// Tab-separated, one header row. Repeated ORCIDs keep their first row.
pub fn read_contributions<R: Read>(reader: R, columns: Columns) -> Result<Vec<Contribution>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut contributions = Vec::new();

    for (line, row) in reader.records().enumerate() {
        let row = row.context("Failed to read contributions row")?;
        match parse_row(&row, columns) {
            Some(contribution) => {
                if seen.insert(contribution.orcid.clone()) {
                    contributions.push(contribution);
                } else {
                    warn!(
                        "Duplicate ORCID {} on row {}, keeping the first",
                        contribution.orcid,
                        line + 2
                    );
                }
            }
            None => warn!("Skipping row {}: missing ORCID or contributions column", line + 2),
        }
    }

    Ok(contributions)
}

pub fn load_contributions<P: AsRef<Path>>(path: P, columns: Columns) -> Result<Vec<Contribution>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    read_contributions(file, columns)
}
