pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::{AccountRecord, ScrapeOutcome};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::ops::DerefMut;
use tracing::{debug, error, info, warn};
use url::Url;

use self::cleaner::clean_profile;
use self::http_client::HttpClient;
use self::parsers::parse_profile_page;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Where profile pages come from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Page body, or an empty body on any transport failure. Never errors.
    async fn fetch_page(&self, url: &str) -> Vec<u8>;
}

// ── League of Graphs scraper ──────────────────────────────────────────────────

pub struct SummonerScraper<S = HttpClient> {
    source: S,
    base_url: String,
}

impl SummonerScraper<HttpClient> {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::with_source(HttpClient::new(config)?, &config.base_url))
    }
}

impl<S: PageSource> SummonerScraper<S> {
    pub fn with_source(source: S, base_url: &str) -> Self {
        Self {
            source,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// `<base>/<region>/<display_name>/last-30-days`
    ///
    /// Region is lowercased. The display name keeps its case and is
    /// percent-encoded as a single path segment.
    pub fn profile_url(&self, display_name: &str, region: &str) -> Result<Url, ScrapeError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ScrapeError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ScrapeError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(&region.to_lowercase())
            .push(display_name)
            .push("last-30-days");
        Ok(url)
    }

    /// Scrape one summoner profile. Always hands back the display name so
    /// results can be matched to accounts.
    pub async fn scrape_account(&self, display_name: &str, region: &str) -> (ScrapeOutcome, String) {
        (self.scrape_outcome(display_name, region).await, display_name.to_string())
    }

    async fn scrape_outcome(&self, display_name: &str, region: &str) -> ScrapeOutcome {
        if display_name.is_empty() {
            debug!("No display name on {}, skipping", region);
            return ScrapeOutcome::Unavailable;
        }

        let url = match self.profile_url(display_name, region) {
            Ok(url) => url,
            Err(e) => {
                error!("{}: {}", display_name, e);
                return ScrapeOutcome::Malformed(e);
            }
        };

        let page = self.source.fetch_page(url.as_str()).await;
        if page.is_empty() {
            return ScrapeOutcome::Unavailable;
        }

        let html = String::from_utf8_lossy(&page);
        let parsed = parse_profile_page(&html).and_then(|raw| raw.map(clean_profile).transpose());

        match parsed {
            Ok(Some(stats)) => {
                debug!(
                    "{} ({}): level {}, {}, {} games",
                    display_name, region, stats.level, stats.rank, stats.games_played
                );
                ScrapeOutcome::Found(stats)
            }
            Ok(None) => {
                error!(
                    "There is no summoner on {} named {}",
                    region.to_lowercase(),
                    display_name
                );
                ScrapeOutcome::NotFound
            }
            Err(e) => {
                warn!("{} ({}): {}", display_name, region, e);
                ScrapeOutcome::Malformed(e)
            }
        }
    }

    /// Scrape a single record and store the stats on success.
    /// Anything short of success leaves `fetched_data` as it was.
    pub async fn refresh(&self, record: &mut AccountRecord) -> ScrapeOutcome {
        let (outcome, _) = self.scrape_account(&record.display_name, &record.region).await;
        if let Some(stats) = outcome.stats() {
            record.fetched_data = Some(stats.clone());
        }
        outcome
    }

    /// Scrape every account concurrently, then attach each result to the
    /// first account with the same display name.
    ///
    /// Results are applied in dispatch order, so when display names repeat
    /// the first such account ends up with the stats of the last one that
    /// resolved, and the other duplicates get nothing.
    ///
    /// All requests are in flight before any is awaited. Failures are
    /// logged per account; the batch itself always succeeds.
    pub async fn scrape_many<A>(&self, accounts: &mut [A]) -> bool
    where
        A: DerefMut<Target = AccountRecord>,
    {
        let results = join_all(
            accounts
                .iter()
                .map(|a| self.scrape_account(&a.display_name, &a.region)),
        )
        .await;

        let mut summary = BatchSummary::default();

        for (outcome, display_name) in results {
            summary.record(&outcome);

            let Some(stats) = outcome.into_stats() else {
                continue;
            };

            if let Some(account) = accounts
                .iter_mut()
                .find(|a| a.display_name == display_name)
            {
                account.fetched_data = Some(stats);
            }
        }

        info!(
            "Scraped {} accounts: {} found, {} not found, {} unavailable, {} malformed",
            accounts.len(),
            summary.found,
            summary.not_found,
            summary.unavailable,
            summary.malformed
        );

        true
    }
}

#[derive(Debug, Default)]
struct BatchSummary {
    found: usize,
    not_found: usize,
    unavailable: usize,
    malformed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ScrapeOutcome) {
        match outcome {
            ScrapeOutcome::Found(_) => self.found += 1,
            ScrapeOutcome::NotFound => self.not_found += 1,
            ScrapeOutcome::Unavailable => self.unavailable += 1,
            ScrapeOutcome::Malformed(_) => self.malformed += 1,
        }
    }
}
