use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// ORCIDs already looked up, one per line on disk.
pub struct Checkpoint {
    path: PathBuf,
    processed: BTreeSet<String>,
}

impl Checkpoint {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            processed: BTreeSet::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut processed = BTreeSet::new();

        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open checkpoint {}", path.display()))?;
            for line in BufReader::new(file).lines() {
                let orcid = line?;
                let orcid = orcid.trim();
                if !orcid.is_empty() {
                    processed.insert(orcid.to_string());
                }
            }
        }

        Ok(Self { path, processed })
    }

    pub fn mark_processed(&mut self, orcid: &str) {
        self.processed.insert(orcid.to_string());
    }

    pub fn is_processed(&self, orcid: &str) -> bool {
        self.processed.contains(orcid)
    }

    pub fn save(&self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        for orcid in &self.processed {
            writeln!(writer, "{}", orcid)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
