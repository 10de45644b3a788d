use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

mod checkpoint;
mod client;
mod profile;
pub use checkpoint::Checkpoint;
pub use client::{OrcidClient, DEFAULT_BASE_URL};
pub use profile::{parse_profile, Profile, RawAffiliation};

use crate::contributions::{
    load_contributions, Columns, DEFAULT_CONTRIBUTIONS_COLUMN, DEFAULT_ORCID_COLUMN,
};

pub const PROFILES_FILE: &str = "profiles.jsonl";
pub const FAILED_FILE: &str = "profiles.failed.jsonl";
pub const CHECKPOINT_FILE: &str = "profiles.checkpoint";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFetchFailed {
    pub orcid: String,
    pub error: String,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Tab-separated contributions table (one header row)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Working directory (writes profiles.jsonl)
    #[arg(short, long)]
    pub output: PathBuf,

    /// ORCID public API base URL
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Resume from checkpoint
    #[arg(short, long)]
    pub resume: bool,

    /// 0-based column holding the ORCID
    #[arg(long, default_value_t = DEFAULT_ORCID_COLUMN)]
    pub orcid_column: usize,

    /// 0-based column holding the comma-separated contribution roles
    #[arg(long, default_value_t = DEFAULT_CONTRIBUTIONS_COLUMN)]
    pub contributions_column: usize,
}

/// Read `profiles.jsonl` into an ORCID -> profile lookup. Later lines win.
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Profile>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut profiles = HashMap::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Profile>(&line) {
            Ok(profile) => {
                profiles.insert(profile.orcid.clone(), profile);
            }
            Err(e) => warn!("Skipping unreadable profile line: {}", e),
        }
    }

    Ok(profiles)
}

fn open_output(path: &Path, append: bool) -> Result<BufWriter<File>> {
    let file = if append && path.exists() {
        fs::OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {} for append", path.display()))?
    } else {
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?
    };
    Ok(BufWriter::new(file))
}

pub fn run(args: FetchArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

/// Lookups run one at a time; the registry is a shared public service.
pub async fn run_async(args: FetchArgs) -> Result<()> {
    fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    let columns = Columns {
        orcid: args.orcid_column,
        contributions: args.contributions_column,
    };
    let contributions = load_contributions(&args.input, columns)?;
    info!("Loaded {} contributors", contributions.len());

    let checkpoint_path = args.output.join(CHECKPOINT_FILE);
    let mut checkpoint = if args.resume && checkpoint_path.exists() {
        Checkpoint::load(&checkpoint_path).context("Failed to load checkpoint")?
    } else {
        Checkpoint::new(&checkpoint_path)
    };

    let to_process: Vec<String> = contributions
        .into_iter()
        .map(|c| c.orcid)
        .filter(|orcid| !checkpoint.is_processed(orcid))
        .collect();

    if !checkpoint.is_empty() {
        info!(
            "Resuming: {} already processed, {} remaining",
            checkpoint.len(),
            to_process.len()
        );
    }

    if to_process.is_empty() {
        info!("No profiles to fetch");
        return Ok(());
    }

    let mut profiles_writer = open_output(&args.output.join(PROFILES_FILE), args.resume)?;
    let mut failed_writer = open_output(&args.output.join(FAILED_FILE), args.resume)?;

    let pb = ProgressBar::new(to_process.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let client = OrcidClient::new(args.base_url.clone(), args.timeout)?;
    let mut fetched = 0usize;
    let mut failed = 0usize;

    for orcid in &to_process {
        let failure = match client.fetch_profile(orcid).await {
            Ok(Some(profile)) => {
                writeln!(profiles_writer, "{}", serde_json::to_string(&profile)?)?;
                fetched += 1;
                None
            }
            Ok(None) => Some("Profile not found".to_string()),
            Err(e) => {
                error!("Failed to fetch {}: {:#}", orcid, e);
                Some(format!("{:#}", e))
            }
        };

        if let Some(error) = failure {
            let record = ProfileFetchFailed {
                orcid: orcid.clone(),
                error,
            };
            writeln!(failed_writer, "{}", serde_json::to_string(&record)?)?;
            failed += 1;
        }

        checkpoint.mark_processed(orcid);
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    profiles_writer.flush().context("Failed to flush profiles file")?;
    failed_writer.flush().context("Failed to flush failed file")?;
    checkpoint.save().context("Failed to save checkpoint")?;

    info!("Fetch complete: {} profiles, {} failed", fetched, failed);

    Ok(())
}
