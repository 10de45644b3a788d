use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::{AffiliationRecord, AuthorRecord, RankingComparator};

/// First-appearance numbering of affiliations across a ranked author list.
///
/// Indices are 1-based and contiguous. `counts` holds, per index, the number
/// of distinct authors citing that affiliation.
#[derive(Debug, Clone, Default)]
pub struct AffiliationIndex {
    index_of: HashMap<AffiliationRecord, usize>,
    records: Vec<AffiliationRecord>,
    counts: Vec<usize>,
}

impl AffiliationIndex {
    /// Scan authors in the given order. Authors without affiliations add nothing.
    pub fn build<'a, I>(authors: I) -> Self
    where
        I: IntoIterator<Item = &'a AuthorRecord>,
    {
        let mut index = Self::default();
        for author in authors {
            let mut cited = HashSet::new();
            for affiliation in author.affiliations() {
                if cited.insert(affiliation) {
                    index.cite(affiliation);
                }
            }
        }
        index
    }

    fn cite(&mut self, affiliation: &AffiliationRecord) {
        match self.index_of.get(affiliation) {
            Some(&idx) => self.counts[idx - 1] += 1,
            None => {
                self.records.push(affiliation.clone());
                self.counts.push(1);
                self.index_of.insert(affiliation.clone(), self.records.len());
            }
        }
    }

    pub fn index_of(&self, affiliation: &AffiliationRecord) -> Option<usize> {
        self.index_of.get(affiliation).copied()
    }

    pub fn get(&self, index: usize) -> Option<&AffiliationRecord> {
        index.checked_sub(1).and_then(|i| self.records.get(i))
    }

    pub fn count(&self, index: usize) -> Option<usize> {
        index.checked_sub(1).and_then(|i| self.counts.get(i)).copied()
    }

    pub fn appearance_count(&self, affiliation: &AffiliationRecord) -> usize {
        self.index_of(affiliation)
            .and_then(|idx| self.count(idx))
            .unwrap_or(0)
    }

    /// Ascending indices of the affiliations an author lists.
    pub fn indices_for(&self, author: &AuthorRecord) -> Vec<usize> {
        let mut indices: Vec<usize> = author
            .affiliations()
            .iter()
            .filter_map(|aff| self.index_of(aff))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// `(index, record, appearance count)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AffiliationRecord, usize)> {
        self.records
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(|(i, (record, &count))| (i + 1, record, count))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The printable author list: ranked, affiliation-less authors dropped, indexed.
#[derive(Debug, Clone)]
pub struct RankedAuthors {
    authors: Vec<AuthorRecord>,
    index: AffiliationIndex,
}

impl RankedAuthors {
    pub fn new(mut authors: Vec<AuthorRecord>, comparator: &RankingComparator) -> Self {
        comparator.sort(&mut authors);

        let (authors, excluded): (Vec<_>, Vec<_>) = authors
            .into_iter()
            .partition(|author| !author.affiliations().is_empty());
        for author in &excluded {
            info!(
                "Author has no recorded and publicly available affiliations: {} ({})",
                author,
                author.orcid()
            );
        }

        let index = AffiliationIndex::build(&authors);
        debug!(
            "Ranked {} authors citing {} distinct affiliations",
            authors.len(),
            index.len()
        );

        Self { authors, index }
    }

    pub fn authors(&self) -> &[AuthorRecord] {
        &self.authors
    }

    pub fn index(&self) -> &AffiliationIndex {
        &self.index
    }

    /// Authors in print order, each with their ascending affiliation indices.
    pub fn entries(&self) -> impl Iterator<Item = (&AuthorRecord, Vec<usize>)> {
        self.authors
            .iter()
            .map(|author| (author, self.index.indices_for(author)))
    }
}
