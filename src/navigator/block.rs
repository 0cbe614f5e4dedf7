//! Anti-scraping block detection
//!
//! Result pages are scanned for the phrases the engine serves when it
//! has decided the traffic is automated (unusual-traffic notice or a
//! CAPTCHA challenge). Markers are matched with per-marker case
//! sensitivity; localized notices are exact strings while generic
//! CAPTCHA fragments match case-insensitively.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// One known block phrase and how strictly to match it
struct BlockMarker {
    phrase: &'static str,
    case_insensitive: bool,
}

const BLOCK_MARKERS: &[BlockMarker] = &[
    BlockMarker {
        phrase: "detected unusual traffic",
        case_insensitive: false,
    },
    BlockMarker {
        phrase: "solving the above CAPTCHA",
        case_insensitive: false,
    },
    BlockMarker {
        phrase: "violazione dei Termini di servizio",
        case_insensitive: false,
    },
    BlockMarker {
        phrase: "our systems have detected unusual traffic",
        case_insensitive: true,
    },
    BlockMarker {
        phrase: "id=\"captcha-form\"",
        case_insensitive: true,
    },
];

/// Markers compiled once; literal phrases are escaped so the regex
/// engine only contributes the case-folding.
static COMPILED_MARKERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    BLOCK_MARKERS
        .iter()
        .map(|marker| {
            let regex = RegexBuilder::new(&regex::escape(marker.phrase))
                .case_insensitive(marker.case_insensitive)
                .build()
                .expect("BUG: escaped block marker failed to compile");
            (marker.phrase, regex)
        })
        .collect()
});

/// Scan page HTML for block markers
///
/// Returns the first matching marker phrase, or `None` for a clean page.
#[must_use]
pub fn detect_block(html: &str) -> Option<&'static str> {
    COMPILED_MARKERS
        .iter()
        .find(|(_, regex)| regex.is_match(html))
        .map(|(phrase, _)| *phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_page_not_flagged() {
        let html = "<html><body><div class='g'><h3>Rust</h3></div></body></html>";
        assert!(detect_block(html).is_none());
    }

    #[test]
    fn test_unusual_traffic_detected() {
        let html = "<html><body>Our systems have detected unusual traffic from your network.</body></html>";
        assert_eq!(
            detect_block(html),
            Some("our systems have detected unusual traffic")
        );
    }

    #[test]
    fn test_case_sensitive_marker_requires_exact_case() {
        // The Italian ToS notice only matches with its original casing
        let html = "violazione dei termini di servizio";
        assert!(detect_block(html).is_none());
        let html = "violazione dei Termini di servizio";
        assert!(detect_block(html).is_some());
    }

    #[test]
    fn test_captcha_form_detected_any_case() {
        let html = r#"<form ID="CAPTCHA-FORM" action="/sorry">"#.to_lowercase();
        assert!(detect_block(&html).is_some());
    }
}
