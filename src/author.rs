use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::canonical::Canonicalize;
use crate::fetch::Profile;
use crate::{normalize_field, remove_duplicates, AffiliationRecord, AuthorListError};

/// Role tag that places an author among the study PIs.
pub const PI_ROLE: &str = "PI";

/// Contributor-order bucket. Declaration order follows `rank()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Lead,
    General,
    PrincipalInvestigator,
    SeniorLeadership,
}

impl Tier {
    /// Numeric tier as used in the manuscript policy (1-4).
    pub fn rank(self) -> u8 {
        match self {
            Tier::Lead => 1,
            Tier::General => 2,
            Tier::PrincipalInvestigator => 3,
            Tier::SeniorLeadership => 4,
        }
    }
}

/// Tier print order used when a roster does not give one.
pub const DEFAULT_TIER_ORDER: [Tier; 4] = [
    Tier::Lead,
    Tier::General,
    Tier::PrincipalInvestigator,
    Tier::SeniorLeadership,
];

fn default_tier_order() -> Vec<Tier> {
    DEFAULT_TIER_ORDER.to_vec()
}

/// Roster configuration: who goes first, who goes last, and in what tier order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingPolicy {
    #[serde(default)]
    pub lead_author: Option<String>,
    #[serde(default)]
    pub senior_leadership: Vec<String>,
    #[serde(default = "default_tier_order")]
    pub tier_order: Vec<Tier>,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

fn name_key(name: &str) -> String {
    normalize_field(name).to_lowercase()
}

impl RankingPolicy {
    pub fn new(lead_author: Option<String>, senior_leadership: Vec<String>) -> Self {
        Self {
            lead_author,
            senior_leadership,
            tier_order: default_tier_order(),
        }
    }

    pub fn with_tier_order(mut self, tier_order: Vec<Tier>) -> Self {
        self.tier_order = tier_order;
        self
    }

    /// Load a roster JSON file and reject blank names or a malformed tier order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open roster {}", path.display()))?;
        let policy: RankingPolicy = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse roster {}", path.display()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), AuthorListError> {
        if let Some(blank) = self
            .senior_leadership
            .iter()
            .find(|name| name.trim().is_empty())
        {
            return Err(AuthorListError::InvalidRoster(format!(
                "blank senior leadership entry {:?}",
                blank
            )));
        }

        let is_permutation = self.tier_order.len() == DEFAULT_TIER_ORDER.len()
            && DEFAULT_TIER_ORDER
                .iter()
                .all(|tier| self.tier_order.contains(tier));
        if !is_permutation {
            return Err(AuthorListError::InvalidRoster(format!(
                "tier_order must list each tier exactly once, got {:?}",
                self.tier_order
            )));
        }
        Ok(())
    }

    /// First match wins: lead, PI role, senior leadership, everyone else.
    pub fn assign_tier(
        &self,
        given_name: &str,
        family_name: &str,
        contributions: &[String],
    ) -> Tier {
        let full_name = name_key(&format!("{} {}", given_name, family_name));

        let is_lead = self
            .lead_author
            .as_deref()
            .map(name_key)
            .filter(|lead| !lead.is_empty())
            .is_some_and(|lead| lead == full_name);

        if is_lead {
            Tier::Lead
        } else if contributions.iter().any(|role| role == PI_ROLE) {
            Tier::PrincipalInvestigator
        } else if self
            .senior_leadership
            .iter()
            .any(|name| name_key(name) == full_name)
        {
            Tier::SeniorLeadership
        } else {
            Tier::General
        }
    }
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// One manuscript contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRecord {
    orcid: String,
    given_name: String,
    family_name: String,
    email: Option<String>,
    contributions: Vec<String>,
    affiliations: Vec<AffiliationRecord>,
    tier: Tier,
}

impl AuthorRecord {
    /// Build from already-canonical parts. The family name must be non-blank.
    pub fn new(
        orcid: &str,
        given_name: &str,
        family_name: &str,
        email: Option<String>,
        contributions: Vec<String>,
        affiliations: Vec<AffiliationRecord>,
        policy: &RankingPolicy,
    ) -> Result<Self, AuthorListError> {
        let family_name = title_case(&normalize_field(family_name));
        if family_name.is_empty() {
            return Err(AuthorListError::MalformedAuthorRecord {
                orcid: orcid.to_string(),
                reason: "missing family name".to_string(),
            });
        }
        let given_name = title_case(&normalize_field(given_name));
        let tier = policy.assign_tier(&given_name, &family_name, &contributions);

        Ok(Self {
            orcid: orcid.to_string(),
            given_name,
            family_name,
            email,
            contributions,
            affiliations: remove_duplicates(affiliations),
            tier,
        })
    }

    /// Turn a registry profile into an author: current affiliations only,
    /// each validated, given a department guess, then deduplicated.
    pub fn from_profile<C: Canonicalize>(
        profile: Profile,
        contributions: Vec<String>,
        policy: &RankingPolicy,
        canonical: &mut C,
    ) -> Result<Self, AuthorListError> {
        let affiliations: Vec<AffiliationRecord> = profile
            .affiliations
            .iter()
            .filter(|raw| raw.is_current())
            .map(|raw| {
                let validated = canonical.validate(raw.to_record());
                canonical.guess_department(validated)
            })
            .collect();

        Self::new(
            &profile.orcid,
            profile.given_name.as_deref().unwrap_or_default(),
            profile.family_name.as_deref().unwrap_or_default(),
            profile.primary_email.clone(),
            contributions,
            affiliations,
            policy,
        )
    }

    pub fn orcid(&self) -> &str {
        &self.orcid
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn contributions(&self) -> &[String] {
        &self.contributions
    }

    pub fn affiliations(&self) -> &[AffiliationRecord] {
        &self.affiliations
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }
}

impl fmt::Display for AuthorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.given_name.is_empty() {
            write!(f, "{}", self.family_name)
        } else {
            write!(f, "{} {}", self.given_name, self.family_name)
        }
    }
}

/// Strict total order over authors: tier position, then family name, then
/// given name (both case-insensitive), then ORCID.
///
/// The last two keys mean two distinct authors never compare equal, even
/// when they share a tier and family name.
#[derive(Debug, Clone, Copy)]
pub struct RankingComparator {
    positions: [usize; 4],
}

impl Default for RankingComparator {
    fn default() -> Self {
        Self::new(&RankingPolicy::default())
    }
}

impl RankingComparator {
    /// Tiers missing from the policy's order sort after the listed ones, by rank.
    pub fn new(policy: &RankingPolicy) -> Self {
        let mut positions = [0; 4];
        for tier in DEFAULT_TIER_ORDER {
            positions[usize::from(tier.rank() - 1)] = policy
                .tier_order
                .iter()
                .position(|t| *t == tier)
                .unwrap_or(DEFAULT_TIER_ORDER.len() + usize::from(tier.rank()));
        }
        Self { positions }
    }

    fn position(&self, tier: Tier) -> usize {
        self.positions[usize::from(tier.rank() - 1)]
    }

    pub fn compare(&self, a: &AuthorRecord, b: &AuthorRecord) -> Ordering {
        self.position(a.tier)
            .cmp(&self.position(b.tier))
            .then_with(|| a.family_name.to_lowercase().cmp(&b.family_name.to_lowercase()))
            .then_with(|| a.given_name.to_lowercase().cmp(&b.given_name.to_lowercase()))
            .then_with(|| a.orcid.cmp(&b.orcid))
    }

    pub fn sort(&self, authors: &mut [AuthorRecord]) {
        authors.sort_by(|a, b| self.compare(a, b));
    }
}
