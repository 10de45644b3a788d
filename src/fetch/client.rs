use anyhow::{anyhow, Context, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use urlencoding::encode;

use super::profile::{parse_profile, Profile};

pub const DEFAULT_BASE_URL: &str = "https://pub.orcid.org";

pub struct OrcidClient {
    client: Client,
    base_url: String,
}

impl OrcidClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns Ok(Some(profile)) when found, Ok(None) when the registry has no such record
    pub async fn fetch_profile(&self, orcid: &str) -> Result<Option<Profile>> {
        let url = format!("{}/v3.0/{}/record", self.base_url, encode(orcid));

        match self.make_request(&url).await? {
            Some(body) => {
                let profile = parse_profile(orcid, &body)
                    .with_context(|| format!("Failed to parse ORCID record {}", orcid))?;
                debug!(
                    "Fetched {} with {} affiliations",
                    orcid,
                    profile.affiliations.len()
                );
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    async fn make_request(&self, url: &str) -> Result<Option<String>> {
        let max_retries = 3;

        for attempt in 0..max_retries {
            match self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(Some(response.text().await?));
                    } else if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        let wait = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(2u64.pow(attempt as u32));
                        warn!("Rate limited, waiting {}s", wait);
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                        continue;
                    } else {
                        return Err(anyhow!("HTTP {}", status));
                    }
                }
                Err(e) => {
                    if attempt < max_retries - 1 {
                        let wait = 2u64.pow(attempt as u32);
                        warn!("Request error, retrying in {}s: {}", wait, e);
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(anyhow!("Max retries exceeded"))
    }
}
