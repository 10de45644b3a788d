//! ORCID v3.0 record parsing.
//!
//! Every nested field the registry may omit or null out is an `Option`, so a
//! sparse public record still parses and missing data stays visible.

use serde::{Deserialize, Serialize};

use crate::{AffiliationFields, AffiliationRecord};

/// The parts of a registry record the author list needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub orcid: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub primary_email: Option<String>,
    #[serde(default)]
    pub affiliations: Vec<RawAffiliation>,
}

/// One employment or education entry, before canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAffiliation {
    pub institution_name: String,
    pub department: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub disambiguated_id: Option<String>,
    pub disambiguation_source: Option<String>,
    pub end_date: Option<String>,
}

impl RawAffiliation {
    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn to_record(&self) -> AffiliationRecord {
        AffiliationFields {
            institution_name: self.institution_name.clone(),
            department: self.department.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            region: self.region.clone().unwrap_or_default(),
            country: self.country.clone().unwrap_or_default(),
            disambiguated_id: self.disambiguated_id.clone().unwrap_or_default(),
            disambiguation_source: self.disambiguation_source.clone().unwrap_or_default(),
        }
        .into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct OrcidRecord {
    person: Option<Person>,
    activities_summary: Option<ActivitiesSummary>,
}

#[derive(Debug, Deserialize)]
struct Person {
    name: Option<PersonName>,
    emails: Option<Emails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PersonName {
    given_names: Option<Value>,
    family_name: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Value {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Emails {
    #[serde(default)]
    email: Vec<Email>,
}

#[derive(Debug, Deserialize)]
struct Email {
    email: Option<String>,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct ActivitiesSummary {
    employments: Option<AffiliationGroups>,
    educations: Option<AffiliationGroups>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AffiliationGroups {
    #[serde(default)]
    affiliation_group: Vec<AffiliationGroup>,
}

#[derive(Debug, Deserialize)]
struct AffiliationGroup {
    #[serde(default)]
    summaries: Vec<SummaryWrapper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SummaryWrapper {
    employment_summary: Option<AffiliationSummary>,
    education_summary: Option<AffiliationSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AffiliationSummary {
    department_name: Option<String>,
    end_date: Option<FuzzyDate>,
    organization: Option<Organization>,
}

#[derive(Debug, Deserialize)]
struct FuzzyDate {
    year: Option<Value>,
    month: Option<Value>,
    day: Option<Value>,
}

impl FuzzyDate {
    fn render(&self) -> String {
        [&self.year, &self.month, &self.day]
            .into_iter()
            .filter_map(|part| part.as_ref().and_then(|v| v.value.clone()))
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Organization {
    name: Option<String>,
    address: Option<Address>,
    disambiguated_organization: Option<DisambiguatedOrganization>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DisambiguatedOrganization {
    disambiguated_organization_identifier: Option<String>,
    disambiguation_source: Option<String>,
}

fn value_of(field: &Option<Value>) -> Option<String> {
    field
        .as_ref()
        .and_then(|v| v.value.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Entries without an organization name are dropped.
fn parse_summary(summary: &AffiliationSummary) -> Option<RawAffiliation> {
    let organization = summary.organization.as_ref()?;
    let institution_name = organization.name.clone().filter(|n| !n.trim().is_empty())?;
    let address = organization.address.as_ref();
    let disambiguated = organization.disambiguated_organization.as_ref();

    Some(RawAffiliation {
        institution_name,
        department: summary.department_name.clone(),
        city: address.and_then(|a| a.city.clone()),
        region: address.and_then(|a| a.region.clone()),
        country: address.and_then(|a| a.country.clone()),
        disambiguated_id: disambiguated.and_then(|d| d.disambiguated_organization_identifier.clone()),
        disambiguation_source: disambiguated.and_then(|d| d.disambiguation_source.clone()),
        end_date: summary.end_date.as_ref().map(FuzzyDate::render),
    })
}

fn parse_groups(groups: Option<&AffiliationGroups>) -> impl Iterator<Item = RawAffiliation> + '_ {
    groups
        .into_iter()
        .flat_map(|g| &g.affiliation_group)
        .flat_map(|group| &group.summaries)
        .filter_map(|wrapper| {
            wrapper
                .employment_summary
                .as_ref()
                .or(wrapper.education_summary.as_ref())
        })
        .filter_map(parse_summary)
}

impl OrcidRecord {
    pub(crate) fn into_profile(self, orcid: &str) -> Profile {
        let name = self.person.as_ref().and_then(|p| p.name.as_ref());
        let given_name = name.and_then(|n| value_of(&n.given_names));
        let family_name = name.and_then(|n| value_of(&n.family_name));

        let primary_email = self
            .person
            .as_ref()
            .and_then(|p| p.emails.as_ref())
            .and_then(|emails| {
                emails
                    .email
                    .iter()
                    .find(|e| e.primary && e.verified)
                    .and_then(|e| e.email.clone())
            });

        let activities = self.activities_summary.as_ref();
        let affiliations = parse_groups(activities.and_then(|a| a.employments.as_ref()))
            .chain(parse_groups(activities.and_then(|a| a.educations.as_ref())))
            .collect();

        Profile {
            orcid: orcid.to_string(),
            given_name,
            family_name,
            primary_email,
            affiliations,
        }
    }
}

/// Parse a raw v3.0 `/record` document.
pub fn parse_profile(orcid: &str, body: &str) -> serde_json::Result<Profile> {
    let record: OrcidRecord = serde_json::from_str(body)?;
    Ok(record.into_profile(orcid))
}
