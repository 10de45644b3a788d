mod reference;
pub use reference::{load_reference, Correction, DepartmentGuess, ReferenceTable};

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::{normalize_field, AffiliationRecord};

/// Cleanup applied to every raw affiliation before it is attached to an author.
pub trait Canonicalize {
    /// Correct free-text fields against the reference table.
    fn validate(&mut self, record: AffiliationRecord) -> AffiliationRecord;

    /// Fill in a missing department.
    fn guess_department(&self, record: AffiliationRecord) -> AffiliationRecord;
}

fn lookup_key(value: &str) -> String {
    normalize_field(value).to_lowercase()
}

/// Reference-table canonicalizer. The default instance changes nothing.
#[derive(Debug, Default)]
pub struct CanonicalAffiliations {
    canonical: HashSet<AffiliationRecord>,
    corrections: HashMap<AffiliationRecord, AffiliationRecord>,
    by_identifier: HashMap<(String, String), AffiliationRecord>,
    by_name: HashMap<String, AffiliationRecord>,
    departments: HashMap<String, String>,
    applied: Vec<(AffiliationRecord, AffiliationRecord)>,
    applied_seen: HashSet<AffiliationRecord>,
}

impl CanonicalAffiliations {
    pub fn new(table: ReferenceTable) -> Self {
        let mut canonical = Self::default();

        // First entry wins for both lookups.
        for record in table.affiliations {
            if !record.disambiguated_id().is_empty() {
                canonical
                    .by_identifier
                    .entry((
                        record.disambiguated_id().to_string(),
                        record.disambiguation_source().to_string(),
                    ))
                    .or_insert_with(|| record.clone());
            }
            canonical
                .by_name
                .entry(lookup_key(record.institution_name()))
                .or_insert_with(|| record.clone());
            canonical.canonical.insert(record);
        }

        for correction in table.corrections {
            canonical
                .corrections
                .insert(correction.observed, correction.canonical);
        }

        for guess in table.departments {
            canonical
                .departments
                .entry(lookup_key(&guess.institution_name))
                .or_insert_with(|| normalize_field(&guess.department));
        }

        canonical
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(load_reference(path)?))
    }

    /// Observed -> canonical substitutions made so far, in first-seen order.
    pub fn corrections(&self) -> &[(AffiliationRecord, AffiliationRecord)] {
        &self.applied
    }

    fn lookup(&self, record: &AffiliationRecord) -> Option<AffiliationRecord> {
        if let Some(corrected) = self.corrections.get(record) {
            return Some(corrected.clone());
        }

        let by_identifier = if record.disambiguated_id().is_empty() {
            None
        } else {
            self.by_identifier.get(&(
                record.disambiguated_id().to_string(),
                record.disambiguation_source().to_string(),
            ))
        };
        let matched = by_identifier
            .or_else(|| self.by_name.get(&lookup_key(record.institution_name())))?;

        // Location comes from the reference entry; an observed department is kept.
        let department = if record.department().is_empty() {
            matched.department()
        } else {
            record.department()
        };
        Some(matched.with_department(department))
    }
}

impl Canonicalize for CanonicalAffiliations {
    fn validate(&mut self, record: AffiliationRecord) -> AffiliationRecord {
        if self.canonical.contains(&record) {
            return record;
        }
        match self.lookup(&record) {
            Some(corrected) if corrected != record => {
                if self.applied_seen.insert(record.clone()) {
                    debug!("Corrected affiliation {} -> {}", record, corrected);
                    self.applied.push((record, corrected.clone()));
                }
                corrected
            }
            _ => record,
        }
    }

    fn guess_department(&self, record: AffiliationRecord) -> AffiliationRecord {
        if !record.department().is_empty() {
            return record;
        }
        match self.departments.get(&lookup_key(record.institution_name())) {
            Some(department) => record.with_department(department),
            None => record,
        }
    }
}
