use crate::error::{FieldError, ScrapeError};
use crate::models::{RawProfileFields, ScrapedStats};

/// Length of the "Level" label in front of the number.
const LEVEL_PREFIX_CHARS: usize = 5;

/// "Level 512 - Ranked Solo/Duo" → 512
///
/// Takes the part before the first `-` and drops the label by position,
/// so any five-character prefix is accepted.
pub fn parse_level(subtitle: &str) -> Result<u32, FieldError> {
    let head = subtitle.trim().split('-').next().unwrap_or_default();
    let number: String = head.chars().skip(LEVEL_PREFIX_CHARS).collect();
    parse_count("level", &number)
}

/// Plain integer counter, surrounding whitespace allowed.
pub fn parse_count(field: &'static str, s: &str) -> Result<u32, FieldError> {
    let s = s.trim();
    s.parse().map_err(|_| FieldError::NotAnInteger {
        field,
        value: s.to_string(),
    })
}

/// Turn raw page text into stats. Every field is checked even after one
/// fails so the error names all of them.
pub fn clean_profile(raw: RawProfileFields) -> Result<ScrapedStats, ScrapeError> {
    let level = raw.subtitle.and_then(|s| parse_level(&s));
    let rank = raw.tier;
    let games_played = raw.games.and_then(|s| parse_count("games_played", &s));

    match (level, rank, games_played) {
        (Ok(level), Ok(rank), Ok(games_played)) => Ok(ScrapedStats {
            level,
            rank,
            games_played,
        }),
        (level, rank, games_played) => {
            let errors = [level.err(), rank.err(), games_played.err()]
                .into_iter()
                .flatten()
                .collect();
            Err(ScrapeError::UnexpectedStructure(errors))
        }
    }
}
