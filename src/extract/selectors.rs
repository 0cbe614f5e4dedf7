//! CSS selector chains for result extraction
//!
//! The engine's markup changes over time, so every field is probed with
//! an ordered list of selectors spanning the layouts observed so far.
//! Chains are tried in priority order and the first hit wins; they are
//! never merged. Hardcoded selectors must parse - a failure here is a
//! compile-time bug, not a runtime condition.

use scraper::Selector;
use std::sync::LazyLock;

fn parse_all(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|s| {
            Selector::parse(s)
                .unwrap_or_else(|e| panic!("BUG: hardcoded CSS selector '{s}' is invalid: {e}"))
        })
        .collect()
}

/// Known result-container layouts, newest first
pub static RESULT_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&[
        "div.g",
        "div.MjjYud",
        "div[data-snf='x']",
        "div.v7W49e",
        "div.Gx5Zad",
        "div[data-sotr='r']",
        "div.tF2Cxc",
        "div.yuRUbf",
        "div[jscontroller]",
    ])
});

/// Title probes within a result container
pub static TITLES: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&["h3", "a h3", "div h3", "h3.LC20lb"]));

/// Link probes within a result container
pub static LINKS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&["a[href]", "a[ping]", "h3 a", "div > a", "a.cz88Hc"]));

/// Description probes within a result container
pub static DESCRIPTIONS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&[
        "div.VwiC3b",
        "div[data-sncf='1']",
        "div[role='link'] div",
        "div.yi8zzc",
    ])
});

/// Next-page affordances across supported locales
pub static NEXT_PAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    parse_all(&[
        "a#pnnext",
        "a[aria-label='Pagina successiva']",
        "a[aria-label='Page suivante']",
        "a[aria-label='Next page']",
        "a[aria-label='Next']",
        "a.nBDE1b.G5eFlf",
    ])
});

/// Engine-reported result statistics ("About 1,000,000 results ...")
pub static STATS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| parse_all(&["div#result-stats", "div[aria-level='3']", "#result-stats"]));

/// All absolute outbound links, for the generic fallback
pub static OUTBOUND_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href^='http']").expect("BUG: hardcoded fallback selector is invalid")
});

/// Heading descendant used as a fallback title
pub static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("BUG: hardcoded heading selector is invalid"));
