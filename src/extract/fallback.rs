//! Generic link-scan fallback extraction
//!
//! When none of the known container selectors match anything the page
//! layout has drifted past our tables. Rather than returning nothing,
//! scan every outbound hyperlink, skip the engine's own properties, and
//! synthesize results from the surrounding markup: the nearest heading
//! (or the link text) as title and the enclosing block's text as
//! description.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

use super::selectors::{HEADING, OUTBOUND_LINKS};
use super::{ResultItem, normalized_text};
use crate::utils::constants::{ENGINE_DOMAIN, EXCLUDED_LINK_PREFIXES};

/// Whether a link points back into the engine's own properties
fn is_excluded_link(href: &str) -> bool {
    if EXCLUDED_LINK_PREFIXES.iter().any(|p| href.starts_with(p)) {
        return true;
    }
    match Url::parse(href) {
        Ok(url) => url
            .host_str()
            .is_some_and(|host| host == ENGINE_DOMAIN || host.ends_with(&format!(".{ENGINE_DOMAIN}"))),
        // Unparsable URLs fall back to a substring check
        Err(_) => href.contains(ENGINE_DOMAIN),
    }
}

/// Text of the nearest enclosing `div`, with the title substring removed
fn enclosing_block_description(link: ElementRef<'_>, title: &str) -> String {
    for ancestor in link.ancestors() {
        if let Some(element) = ElementRef::wrap(ancestor) {
            if element.value().name() == "div" {
                let text = normalized_text(element);
                return text.replace(title, " ").split_whitespace().collect::<Vec<_>>().join(" ");
            }
        }
    }
    String::new()
}

/// Extract results by scanning outbound links
///
/// Only links yielding a non-empty title (nearest heading, else link
/// text) are emitted. URLs already accumulated in `seen` or earlier in
/// this scan are dropped silently.
pub fn extract_from_links(
    doc: &Html,
    page_number: usize,
    limit: usize,
    seen: &HashSet<String>,
) -> Vec<ResultItem> {
    let mut results: Vec<ResultItem> = Vec::new();

    for link in doc.select(&OUTBOUND_LINKS) {
        if results.len() >= limit {
            break;
        }

        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if is_excluded_link(href) {
            continue;
        }
        if seen.contains(href) || results.iter().any(|r| r.url == href) {
            continue;
        }

        let title = match link.select(&HEADING).next() {
            Some(heading) => normalized_text(heading),
            None => normalized_text(link),
        };
        if title.is_empty() {
            continue;
        }

        let description = enclosing_block_description(link, &title);

        results.push(ResultItem {
            title,
            url: href.to_string(),
            description,
            page: page_number,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(html: &str, limit: usize) -> Vec<ResultItem> {
        let doc = Html::parse_document(html);
        extract_from_links(&doc, 1, limit, &HashSet::new())
    }

    #[test]
    fn test_titled_links_only() {
        let html = r#"
            <div>
                <a href="http://example.com/a"><h3>First result</h3></a>
                <a href="http://example.com/b"></a>
                <a href="http://example.com/c">Plain text link</a>
            </div>
        "#;
        let results = scan(html, 10);
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://example.com/a", "http://example.com/c"]);
        assert_eq!(results[0].title, "First result");
        assert_eq!(results[1].title, "Plain text link");
    }

    #[test]
    fn test_engine_links_excluded() {
        let html = r#"
            <div>
                <a href="https://www.google.com/preferences">Settings</a>
                <a href="https://accounts.google.com/signin">Sign in</a>
                <a href="https://support.google.com/websearch">Help</a>
                <a href="http://example.com/page">Real result</a>
            </div>
        "#;
        let results = scan(html, 10);
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://example.com/page"]);
    }

    #[test]
    fn test_description_strips_title() {
        let html = r#"
            <div>
                <a href="http://example.com/a"><h3>Rust language</h3></a>
                Rust language is a systems programming language.
            </div>
        "#;
        let results = scan(html, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].description,
            "is a systems programming language."
        );
    }

    #[test]
    fn test_limit_respected() {
        let html = r#"
            <div>
                <a href="http://example.com/1">One</a>
                <a href="http://example.com/2">Two</a>
                <a href="http://example.com/3">Three</a>
            </div>
        "#;
        assert_eq!(scan(html, 2).len(), 2);
    }

    #[test]
    fn test_seen_urls_dropped() {
        let html = r#"<a href="http://example.com/1">One</a>"#;
        let doc = Html::parse_document(html);
        let seen: HashSet<String> = ["http://example.com/1".to_string()].into();
        assert!(extract_from_links(&doc, 1, 10, &seen).is_empty());
    }
}
