use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs;
use std::path::Path;

use crate::canonical::CanonicalAffiliations;
use crate::{AffiliationRecord, RankedAuthors};

pub const AUTHORS_SHEET: &str = "authors.tsv";
pub const AFFILIATIONS_SHEET: &str = "affiliations.tsv";
pub const CHANGES_SHEET: &str = "affiliation_changes.tsv";

fn record_fields(affiliation: &AffiliationRecord) -> [&str; 7] {
    [
        affiliation.department(),
        affiliation.institution_name(),
        affiliation.city(),
        affiliation.region(),
        affiliation.country(),
        affiliation.disambiguated_id(),
        affiliation.disambiguation_source(),
    ]
}

fn sheet_writer(dir: &Path, name: &str) -> Result<csv::Writer<fs::File>> {
    let path = dir.join(name);
    WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))
}

/// Harmonization view: one TSV per sheet under `dir`.
pub fn write_workbook(
    ranked: &RankedAuthors,
    canonical: &CanonicalAffiliations,
    dir: &Path,
) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut authors = sheet_writer(dir, AUTHORS_SHEET)?;
    authors.write_record(["author", "affiliation_indices"])?;
    for (author, indices) in ranked.entries() {
        let indices = indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        authors.write_record([author.to_string(), indices])?;
    }
    authors.flush()?;

    let mut rows: Vec<_> = ranked.index().iter().collect();
    rows.sort_by_key(|(_, affiliation, _)| affiliation.institution_name().to_lowercase());

    let mut affiliations = sheet_writer(dir, AFFILIATIONS_SHEET)?;
    affiliations.write_record([
        "affiliation_index",
        "affiliation_appearance_count",
        "department",
        "name",
        "city",
        "region",
        "country",
        "disambiguated_id",
        "source",
    ])?;
    for (index, affiliation, count) in rows {
        let index = index.to_string();
        let count = count.to_string();
        let mut row = vec![index.as_str(), count.as_str()];
        row.extend(record_fields(affiliation));
        affiliations.write_record(&row)?;
    }
    affiliations.flush()?;

    let mut changes = sheet_writer(dir, CHANGES_SHEET)?;
    changes.write_record([
        "affiliation_type",
        "department",
        "institution_name",
        "city",
        "region",
        "country",
        "disambiguated_id",
        "disambiguation_source",
    ])?;
    for (observed, corrected) in canonical.corrections() {
        for (kind, affiliation) in [("observed", observed), ("canonical", corrected)] {
            let mut row = vec![kind];
            row.extend(record_fields(affiliation));
            changes.write_record(&row)?;
        }
    }
    changes.flush()?;

    Ok(())
}
