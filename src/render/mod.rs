use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

mod rtf;
mod workbook;
pub use rtf::{escape_rtf, write_rtf};
pub use workbook::{write_workbook, AFFILIATIONS_SHEET, AUTHORS_SHEET, CHANGES_SHEET};

use crate::canonical::CanonicalAffiliations;
use crate::{AffiliationRecord, RankedAuthors, Tier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rich-text citation list
    #[default]
    Rtf,
    /// Directory of tab-separated sheets for harmonizing affiliations
    Workbook,
    /// Single JSON document
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedAuthorEntry {
    pub orcid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub tier: Tier,
    pub affiliation_indices: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedAffiliation {
    pub index: usize,
    pub count: usize,
    pub key: String,
    pub affiliation: AffiliationRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorListDocument {
    pub authors: Vec<RankedAuthorEntry>,
    pub affiliations: Vec<IndexedAffiliation>,
}

impl AuthorListDocument {
    pub fn new(ranked: &RankedAuthors) -> Self {
        let authors = ranked
            .entries()
            .map(|(author, affiliation_indices)| RankedAuthorEntry {
                orcid: author.orcid().to_string(),
                name: author.to_string(),
                email: author.email().map(String::from),
                tier: author.tier(),
                affiliation_indices,
            })
            .collect();

        let affiliations = ranked
            .index()
            .iter()
            .map(|(index, affiliation, count)| IndexedAffiliation {
                index,
                count,
                key: affiliation.key(),
                affiliation: affiliation.clone(),
            })
            .collect();

        Self {
            authors,
            affiliations,
        }
    }
}

/// Write `ranked` to `output` in the chosen format. The workbook format
/// treats `output` as a directory.
pub fn render(
    format: OutputFormat,
    ranked: &RankedAuthors,
    canonical: &CanonicalAffiliations,
    output: &Path,
) -> Result<()> {
    match format {
        OutputFormat::Workbook => write_workbook(ranked, canonical, output),
        OutputFormat::Rtf => {
            let file = File::create(output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            write_rtf(ranked, BufWriter::new(file))
                .with_context(|| format!("Failed to write {}", output.display()))
        }
        OutputFormat::Json => {
            let file = File::create(output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &AuthorListDocument::new(ranked))
                .with_context(|| format!("Failed to write {}", output.display()))
        }
    }
}
