use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use xxhash_rust::xxh3::xxh3_64;

pub mod author;
pub mod build;
pub mod canonical;
pub mod contributions;
pub mod error;
pub mod fetch;
pub mod index;
pub mod render;

pub use author::{AuthorRecord, RankingComparator, RankingPolicy, Tier};
pub use error::AuthorListError;
pub use index::{AffiliationIndex, RankedAuthors};

/// Collapses runs of whitespace to a single space and trims both ends.
pub fn normalize_field(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first occurrence of every distinct value, preserving order.
pub fn remove_duplicates<T, I>(values: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for value in values {
        if seen.insert(value.clone()) {
            unique.push(value);
        }
    }
    unique
}

/// Unnormalized affiliation fields, as read from a registry or reference file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffiliationFields {
    pub institution_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub disambiguated_id: String,
    #[serde(default)]
    pub disambiguation_source: String,
}

/// A consolidated institutional affiliation.
///
/// Every field is whitespace-normalized on construction, so the derived
/// `Eq`/`Hash` compare all seven normalized fields and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "AffiliationFields")]
pub struct AffiliationRecord {
    institution_name: String,
    department: String,
    city: String,
    region: String,
    country: String,
    disambiguated_id: String,
    disambiguation_source: String,
}

impl From<AffiliationFields> for AffiliationRecord {
    fn from(fields: AffiliationFields) -> Self {
        Self {
            institution_name: normalize_field(&fields.institution_name),
            department: normalize_field(&fields.department),
            city: normalize_field(&fields.city),
            region: normalize_field(&fields.region),
            country: normalize_field(&fields.country),
            disambiguated_id: normalize_field(&fields.disambiguated_id),
            disambiguation_source: normalize_field(&fields.disambiguation_source),
        }
    }
}

impl AffiliationRecord {
    pub fn institution_name(&self) -> &str {
        &self.institution_name
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn disambiguated_id(&self) -> &str {
        &self.disambiguated_id
    }

    pub fn disambiguation_source(&self) -> &str {
        &self.disambiguation_source
    }

    pub fn to_fields(&self) -> AffiliationFields {
        AffiliationFields {
            institution_name: self.institution_name.clone(),
            department: self.department.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
            country: self.country.clone(),
            disambiguated_id: self.disambiguated_id.clone(),
            disambiguation_source: self.disambiguation_source.clone(),
        }
    }

    /// Copy of this record with a different department.
    pub fn with_department(&self, department: &str) -> Self {
        let mut fields = self.to_fields();
        fields.department = department.to_string();
        fields.into()
    }

    /// Stable 16-hex-digit key over all normalized fields.
    pub fn key(&self) -> String {
        let joined = [
            self.institution_name.as_str(),
            self.department.as_str(),
            self.city.as_str(),
            self.region.as_str(),
            self.country.as_str(),
            self.disambiguated_id.as_str(),
            self.disambiguation_source.as_str(),
        ]
        .join("\u{1f}");
        format!("{:016x}", xxh3_64(joined.as_bytes()))
    }
}

impl fmt::Display for AffiliationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            self.department.as_str(),
            self.institution_name.as_str(),
            self.city.as_str(),
            self.region.as_str(),
            self.country.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
        write!(f, "{}", parts.join(", "))
    }
}
