use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::AffiliationRecord;

#[derive(Debug, Deserialize)]
pub struct Correction {
    pub observed: AffiliationRecord,
    pub canonical: AffiliationRecord,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentGuess {
    pub institution_name: String,
    pub department: String,
}

/// Hand-curated reference table for affiliation cleanup.
#[derive(Debug, Default, Deserialize)]
pub struct ReferenceTable {
    #[serde(default)]
    pub affiliations: Vec<AffiliationRecord>,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub departments: Vec<DepartmentGuess>,
}

pub fn load_reference<P: AsRef<Path>>(path: P) -> Result<ReferenceTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open reference table {}", path.display()))?;
    let table = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse reference table {}", path.display()))?;
    Ok(table)
}
