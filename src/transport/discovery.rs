//! Feed autodiscovery from HTML pages.
//!
//! When a subscription URL turns out to serve HTML instead of a feed, the
//! page's `<link>` metadata usually knows where the real feed lives. Two
//! kinds of hints are honored:
//!
//! - `rel="alternate"` with a feed MIME type, href resolved against the
//!   page URL;
//! - `rel="canonical"` on video-host pages whose canonical URL a
//!   host-specific resolver can translate into a feed URL.
//!
//! The scan is plain string matching over the markup (no HTML parser
//! dependency) and tolerates attribute ordering and quoting variations.

use url::Url;

use crate::videosites;

/// MIME types that mark a `rel=alternate` link as a feed.
const FEED_MIME_TYPES: &[&str] = &[
    "application/rss+xml",
    "application/atom+xml",
    "application/rdf+xml",
    "application/xml",
    "text/xml",
];

/// Scans an HTML page for the feed URL it advertises.
///
/// Returns an absolute URL, or `None` if the page offers no usable hint.
pub fn discover_feed_url(html: &str, base_url: &str) -> Option<String> {
    // ASCII-only lowercasing keeps byte offsets aligned with the original
    let html_lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(link_start) = html_lower[search_from..].find("<link") {
        let abs_start = search_from + link_start;
        let remaining = &html_lower[abs_start..];

        let Some(tag_end) = remaining.find('>') else {
            break;
        };
        let tag = &remaining[..=tag_end];
        // Original-case slice of the same tag, for case-preserving hrefs
        let original_tag = &html[abs_start..abs_start + tag_end + 1];

        if contains_attr(tag, "rel", "alternate") && has_feed_type(tag) {
            if let Some(href) = extract_attr_value(original_tag, "href") {
                return Some(resolve_href(href, base_url));
            }
        }

        if contains_attr(tag, "rel", "canonical") {
            if let Some(href) = extract_attr_value(original_tag, "href") {
                let resolved = resolve_href(href, base_url);
                if let Ok(url) = Url::parse(&resolved) {
                    if let Some(feed_url) = videosites::feed_url_for_page(&url) {
                        return Some(feed_url);
                    }
                }
            }
        }

        search_from = abs_start + tag_end + 1;
    }

    None
}

/// Checks if a lowercased tag contains an attribute with the given value.
fn contains_attr(tag: &str, attr_name: &str, attr_value: &str) -> bool {
    let pattern_double = format!("{attr_name}=\"{attr_value}\"");
    let pattern_single = format!("{attr_name}='{attr_value}'");
    tag.contains(&pattern_double) || tag.contains(&pattern_single)
}

/// Checks if a lowercased `<link>` tag declares one of the feed MIME types.
fn has_feed_type(tag: &str) -> bool {
    FEED_MIME_TYPES.iter().any(|mime| tag.contains(mime))
}

/// Extracts the value of an attribute from a tag string (case-preserving).
fn extract_attr_value<'a>(tag: &'a str, attr_name: &str) -> Option<&'a str> {
    let tag_lower = tag.to_ascii_lowercase();
    let attr_prefix = format!("{attr_name}=");

    let attr_start = tag_lower.find(&attr_prefix)?;
    let value_start = attr_start + attr_prefix.len();
    if value_start >= tag.len() {
        return None;
    }

    let rest = &tag[value_start..];
    let quote = *rest.as_bytes().first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let inner = &rest[1..];
    let end = inner.find(quote as char)?;
    Some(&inner[..end])
}

/// Resolves a potentially relative href against the page URL.
fn resolve_href(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_owned();
    }

    // Protocol-relative: normalize through the URL parser
    if href.starts_with("//") {
        let with_scheme = format!("https:{href}");
        if let Ok(parsed) = Url::parse(&with_scheme) {
            return parsed.to_string();
        }
    }

    if let Ok(base) = Url::parse(base_url) {
        if let Ok(resolved) = base.join(href) {
            return resolved.to_string();
        }
    }

    href.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_rss_alternate_link() {
        let html = r#"<html><head>
            <link rel="alternate" type="application/rss+xml" href="/feed.xml" title="RSS">
        </head><body></body></html>"#;
        assert_eq!(
            discover_feed_url(html, "http://example.com/page"),
            Some("http://example.com/feed.xml".to_owned())
        );
    }

    #[test]
    fn finds_atom_and_generic_xml_types() {
        for mime in [
            "application/atom+xml",
            "application/rdf+xml",
            "application/xml",
            "text/xml",
        ] {
            let html = format!(
                r#"<link rel="alternate" type="{mime}" href="https://example.com/feed">"#
            );
            assert_eq!(
                discover_feed_url(&html, "https://example.com"),
                Some("https://example.com/feed".to_owned()),
                "should discover type {mime}"
            );
        }
    }

    #[test]
    fn attribute_order_and_quoting_do_not_matter() {
        let html = r#"<link href='/rss' type='application/rss+xml' rel='alternate'>"#;
        assert_eq!(
            discover_feed_url(html, "https://example.com"),
            Some("https://example.com/rss".to_owned())
        );
    }

    #[test]
    fn stylesheet_links_are_ignored() {
        let html = r#"<link rel="stylesheet" href="/style.css">"#;
        assert_eq!(discover_feed_url(html, "https://example.com"), None);
    }

    #[test]
    fn alternate_without_feed_type_is_ignored() {
        let html = r#"<link rel="alternate" type="text/html" href="/en/page">"#;
        assert_eq!(discover_feed_url(html, "https://example.com"), None);
    }

    #[test]
    fn canonical_video_host_page_translates_to_feed() {
        let html = r#"<html><head>
            <link rel="canonical" href="https://www.youtube.com/channel/UCabc">
        </head></html>"#;
        assert_eq!(
            discover_feed_url(html, "https://www.youtube.com/some-page"),
            Some("https://www.youtube.com/feeds/videos.xml?channel_id=UCabc".to_owned())
        );
    }

    #[test]
    fn canonical_on_ordinary_site_is_ignored() {
        let html = r#"<link rel="canonical" href="https://example.com/page">"#;
        assert_eq!(discover_feed_url(html, "https://example.com/page"), None);
    }

    #[test]
    fn protocol_relative_href_is_normalized() {
        let html =
            r#"<link rel="alternate" type="application/rss+xml" href="//cdn.example.com/feed">"#;
        assert_eq!(
            discover_feed_url(html, "https://example.com"),
            Some("https://cdn.example.com/feed".to_owned())
        );
    }

    #[test]
    fn unterminated_tag_stops_scan() {
        let html = r#"<link rel="alternate" type="application/rss+xml" href="/feed.xml"#;
        assert_eq!(discover_feed_url(html, "https://example.com"), None);
    }
}
