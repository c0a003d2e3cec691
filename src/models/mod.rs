use crate::error::{FieldError, ScrapeError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Account ───────────────────────────────────────────────────────────────────

/// One stored account. `fetched_data` lives only in memory.
#[derive(Clone, Serialize, PartialEq)]
pub struct AccountRecord {
    pub id: i64,
    pub display_name: String, // empty → never fetched
    pub region: String,
    pub login_username: String,
    #[serde(skip_serializing)]
    pub login_secret: String,
    pub fetched_data: Option<ScrapedStats>,
}

impl AccountRecord {
    pub fn new(
        id: i64,
        display_name: impl Into<String>,
        region: impl Into<String>,
        login_username: impl Into<String>,
        login_secret: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            region: region.into(),
            login_username: login_username.into(),
            login_secret: login_secret.into(),
            fetched_data: None,
        }
    }

    pub fn has_display_name(&self) -> bool {
        !self.display_name.is_empty()
    }
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("region", &self.region)
            .field("login_username", &self.login_username)
            .field("login_secret", &"<redacted>")
            .field("fetched_data", &self.fetched_data)
            .finish()
    }
}

// ── Scraped stats ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapedStats {
    pub level: u32,
    pub rank: String,
    pub games_played: u32,
}

/// What a single profile scrape produced.
#[derive(Debug)]
pub enum ScrapeOutcome {
    Found(ScrapedStats),
    /// Empty page: transport failure, non-2xx, or nothing to fetch.
    Unavailable,
    /// The existence marker was missing.
    NotFound,
    Malformed(ScrapeError),
}

impl ScrapeOutcome {
    pub fn stats(&self) -> Option<&ScrapedStats> {
        match self {
            Self::Found(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn into_stats(self) -> Option<ScrapedStats> {
        match self {
            Self::Found(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Unavailable => "unavailable",
            Self::NotFound => "not found",
            Self::Malformed(_) => "malformed",
        }
    }
}

// ── Raw page fields ───────────────────────────────────────────────────────────

/// Trimmed text pulled from the profile page before numeric parsing.
/// Each field is located independently so one missing element is reported
/// without hiding the others.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProfileFields {
    pub subtitle: Result<String, FieldError>, // "Level 512 - Ranked Solo/Duo"
    pub tier: Result<String, FieldError>,
    pub games: Result<String, FieldError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_secret() {
        let record = AccountRecord::new(1, "Faker", "KR", "hide", "on-bush");
        let printed = format!("{:?}", record);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("on-bush"));
    }

    #[test]
    fn json_skips_secret() {
        let record = AccountRecord::new(1, "Faker", "KR", "hide", "on-bush");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("login_secret").is_none());
        assert_eq!(json["login_username"], "hide");
        assert!(json["fetched_data"].is_null());
    }

    #[test]
    fn only_found_carries_stats() {
        let stats = ScrapedStats {
            level: 30,
            rank: "Gold II".into(),
            games_played: 12,
        };
        assert_eq!(ScrapeOutcome::Found(stats.clone()).into_stats(), Some(stats));
        assert!(ScrapeOutcome::NotFound.stats().is_none());
        assert!(ScrapeOutcome::Unavailable.stats().is_none());
    }
}
