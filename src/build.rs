use anyhow::{Context, Result};
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::canonical::{CanonicalAffiliations, Canonicalize};
use crate::contributions::{
    load_contributions, Columns, Contribution, DEFAULT_CONTRIBUTIONS_COLUMN, DEFAULT_ORCID_COLUMN,
};
use crate::fetch::{load_profiles, Profile, PROFILES_FILE};
use crate::render::{render, OutputFormat};
use crate::{AuthorRecord, RankedAuthors, RankingComparator, RankingPolicy};

#[derive(Args)]
pub struct BuildArgs {
    /// Working directory (reads profiles.jsonl)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Tab-separated contributions table (one header row)
    #[arg(short, long)]
    pub contributions: PathBuf,

    /// Roster JSON naming the lead author and senior leadership
    #[arg(short, long)]
    pub roster: PathBuf,

    /// Canonical affiliations reference table (JSON)
    #[arg(short = 'a', long)]
    pub canonical: Option<PathBuf>,

    /// Output file (a directory for the workbook format)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Rtf)]
    pub format: OutputFormat,

    /// 0-based column holding the ORCID
    #[arg(long, default_value_t = DEFAULT_ORCID_COLUMN)]
    pub orcid_column: usize,

    /// 0-based column holding the comma-separated contribution roles
    #[arg(long, default_value_t = DEFAULT_CONTRIBUTIONS_COLUMN)]
    pub contributions_column: usize,
}

/// Pair every contributor with their profile, in table order. Contributors
/// without a profile are skipped; a profile without a family name is an error.
pub fn build_authors<C: Canonicalize>(
    contributions: Vec<Contribution>,
    profiles: &mut HashMap<String, Profile>,
    policy: &RankingPolicy,
    canonical: &mut C,
) -> Result<Vec<AuthorRecord>> {
    let mut authors = Vec::with_capacity(contributions.len());

    for contribution in contributions {
        let Some(profile) = profiles.remove(&contribution.orcid) else {
            warn!("No profile for {}, skipping", contribution.orcid);
            continue;
        };
        let author = AuthorRecord::from_profile(profile, contribution.roles, policy, canonical)?;
        authors.push(author);
    }

    Ok(authors)
}

pub fn run(args: BuildArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let policy = RankingPolicy::load(&args.roster)?;
    let mut canonical = match &args.canonical {
        Some(path) => CanonicalAffiliations::load(path)?,
        None => CanonicalAffiliations::default(),
    };

    let columns = Columns {
        orcid: args.orcid_column,
        contributions: args.contributions_column,
    };
    let contributions = load_contributions(&args.contributions, columns)?;
    let mut profiles = load_profiles(args.input.join(PROFILES_FILE))?;
    info!(
        "Loaded {} contributors and {} profiles",
        contributions.len(),
        profiles.len()
    );

    let authors = build_authors(contributions, &mut profiles, &policy, &mut canonical)
        .context("Failed to build author records")?;
    let ranked = RankedAuthors::new(authors, &RankingComparator::new(&policy));

    render(args.format, &ranked, &canonical, &args.output)?;

    info!(
        "Wrote {} authors and {} affiliations to {}",
        ranked.authors().len(),
        ranked.index().len(),
        args.output.display()
    );

    Ok(())
}
