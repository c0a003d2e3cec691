use crate::error::{FieldError, ScrapeError};
use crate::models::RawProfileFields;
use scraper::{ElementRef, Html, Selector};

// ── Selectors ─────────────────────────────────────────────────────────────────

/// Present only on pages of summoners that exist.
pub const EXISTENCE_MARKER: &str = ".best-league";
pub const SUBTITLE: &str = ".bannerSubtitle";
pub const TIER: &str = ".leagueTier";

/// Path to the all-queues games counter, outermost first.
pub const GAMES_PATH: [&str; 4] = [
    ".summonerProfileQueuesTabs.tabsContainer",
    ".tabs-content",
    r#"div[data-tab-id="championsData-all-queues"]"#,
    ".pie-chart.small",
];

fn selector(css: &'static str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ── Profile page ──────────────────────────────────────────────────────────────

/// Lift the raw profile fields out of a summoner page.
///
/// `Ok(None)` means the page has no existence marker, i.e. the summoner
/// does not exist on that region.
pub fn parse_profile_page(html: &str) -> Result<Option<RawProfileFields>, ScrapeError> {
    let doc = Html::parse_document(html);

    if doc.select(&selector(EXISTENCE_MARKER)?).next().is_none() {
        return Ok(None);
    }

    let subtitle = first_text(&doc, "level", SUBTITLE)?;
    let tier = first_text(&doc, "rank", TIER)?;
    let games = nested_text(&doc, "games_played", &GAMES_PATH)?;

    Ok(Some(RawProfileFields {
        subtitle,
        tier,
        games,
    }))
}

/// Text of the first element in the document matching `css`.
fn first_text(
    doc: &Html,
    field: &'static str,
    css: &'static str,
) -> Result<Result<String, FieldError>, ScrapeError> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .map(text_of)
        .ok_or(FieldError::MissingElement {
            field,
            selector: css,
        }))
}

/// Walk `path` taking the first match at every step, then return its text.
fn nested_text(
    doc: &Html,
    field: &'static str,
    path: &[&'static str],
) -> Result<Result<String, FieldError>, ScrapeError> {
    let Some((&first, rest)) = path.split_first() else {
        return Ok(Ok(String::new()));
    };

    let missing = |css| FieldError::MissingElement {
        field,
        selector: css,
    };

    let Some(mut current) = doc.select(&selector(first)?).next() else {
        return Ok(Err(missing(first)));
    };

    for &css in rest {
        match current.select(&selector(css)?).next() {
            Some(next) => current = next,
            None => return Ok(Err(missing(css))),
        }
    }

    Ok(Ok(text_of(current)))
}
