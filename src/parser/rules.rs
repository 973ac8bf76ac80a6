//! The path-keyed rule table.
//!
//! Every structural path the pipeline cares about ("rss/channel/item/title",
//! "feed/entry/link", ...) maps to one [`PathRule`]: whether the element's
//! accumulated text is wanted, a start-of-element callback for
//! attribute-bearing fields, and an end-of-element callback that commits the
//! field. Both the RSS 2.0 and Atom path families are covered. Paths not in
//! the table are skipped, which is what makes unknown elements harmless.

use super::{Attrs, FeedBuilder};
use crate::parser::dates::parse_pubdate;
use crate::util::parse_duration;

/// A declarative rule for one structural path.
#[derive(Clone, Copy)]
pub(super) struct PathRule {
    /// Accumulate character data for this element and hand it to `on_end`.
    pub wants_text: bool,
    pub on_start: Option<fn(&mut FeedBuilder, &Attrs)>,
    /// Receives the whitespace-squashed text (empty when `wants_text` is off).
    pub on_end: Option<fn(&mut FeedBuilder, String)>,
}

const fn text(on_end: fn(&mut FeedBuilder, String)) -> PathRule {
    PathRule {
        wants_text: true,
        on_start: None,
        on_end: Some(on_end),
    }
}

const fn on_start(f: fn(&mut FeedBuilder, &Attrs)) -> PathRule {
    PathRule {
        wants_text: false,
        on_start: Some(f),
        on_end: None,
    }
}

/// Looks up the rule for a joined element path.
pub(super) fn lookup(path: &str) -> Option<PathRule> {
    Some(match path {
        // Channel metadata
        "rss/channel/title" | "feed/title" => text(set_feed_title),
        "rss/channel/link" => text(set_feed_link),
        "feed/link" | "rss/channel/atom:link" => on_start(feed_atom_link),
        "rss/channel/description" | "feed/subtitle" => text(set_feed_description),
        "rss/channel/image/url" | "feed/logo" => text(set_feed_cover),
        "rss/channel/itunes:image" => on_start(feed_itunes_image),

        // Entry boundaries
        "rss/channel/item" | "feed/entry" => PathRule {
            wants_text: false,
            on_start: Some(begin_episode),
            on_end: Some(end_episode),
        },

        // Entry fields
        "rss/channel/item/title" | "feed/entry/title" => text(set_episode_title),
        "rss/channel/item/description" | "feed/entry/summary" => text(set_episode_description),
        "feed/entry/content" => text(set_episode_description_fallback),
        "rss/channel/item/link" => text(set_episode_link),
        "feed/entry/link" | "rss/channel/item/atom:link" => on_start(episode_atom_link),
        "rss/channel/item/pubDate" | "feed/entry/published" => text(set_episode_published),
        "feed/entry/updated" => text(set_episode_published_fallback),
        "rss/channel/item/guid" => PathRule {
            wants_text: true,
            on_start: Some(episode_guid_start),
            on_end: Some(set_episode_guid),
        },
        "feed/entry/id" => text(set_episode_guid),
        "rss/channel/item/enclosure" => on_start(episode_enclosure),
        "rss/channel/item/media:content" => on_start(episode_media_content),
        "rss/channel/item/itunes:duration" | "feed/entry/itunes:duration" => {
            text(set_episode_duration)
        }

        _ => return None,
    })
}

// --- Channel-level commits ---

fn set_feed_title(b: &mut FeedBuilder, text: String) {
    b.feed.title = text;
}

fn set_feed_link(b: &mut FeedBuilder, text: String) {
    b.feed.link = text;
}

fn set_feed_description(b: &mut FeedBuilder, text: String) {
    b.feed.description = text;
}

fn set_feed_cover(b: &mut FeedBuilder, text: String) {
    if !text.is_empty() {
        b.feed.cover_url = Some(text);
    }
}

fn feed_itunes_image(b: &mut FeedBuilder, attrs: &Attrs) {
    if let Some(href) = attrs.get("href") {
        if !href.is_empty() {
            b.feed.cover_url = Some(href.to_owned());
        }
    }
}

/// `<atom:link>` at channel level (or `<link>` in an Atom feed): alternate
/// links give the website, payment links give the funding URL.
fn feed_atom_link(b: &mut FeedBuilder, attrs: &Attrs) {
    let Some(href) = attrs.get("href") else {
        return;
    };
    match attrs.get("rel") {
        Some("payment") => b.feed.payment_url = Some(href.to_owned()),
        Some("alternate") | None => b.feed.link = href.to_owned(),
        _ => {}
    }
}

// --- Entry lifecycle ---

fn begin_episode(b: &mut FeedBuilder, _attrs: &Attrs) {
    b.begin_episode();
}

fn end_episode(b: &mut FeedBuilder, _text: String) {
    b.finish_episode();
}

// --- Entry-level commits ---

fn set_episode_title(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        ep.title = text;
    }
}

fn set_episode_description(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        ep.description = text;
    }
}

/// Atom `<content>` only fills the description when `<summary>` did not.
fn set_episode_description_fallback(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        if ep.description.is_empty() {
            ep.description = text;
        }
    }
}

fn set_episode_link(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        ep.link = text;
    }
}

fn set_episode_published(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        ep.published = parse_pubdate(&text);
    }
}

/// Atom `<updated>` is only trusted when nothing better was seen.
fn set_episode_published_fallback(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        if ep.published == 0 {
            ep.published = parse_pubdate(&text);
        }
    }
}

/// A guid is a permalink only when `isPermaLink` says `"true"` outright.
fn episode_guid_start(b: &mut FeedBuilder, attrs: &Attrs) {
    if let Some(ep) = b.episode_mut() {
        ep.guid_is_permalink = attrs
            .get("isPermaLink")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
    }
}

fn set_episode_guid(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        ep.guid = text;
    }
}

fn episode_enclosure(b: &mut FeedBuilder, attrs: &Attrs) {
    if let Some(ep) = b.episode_mut() {
        ep.push_enclosure(attrs.get("url"), attrs.get("length"), attrs.get("type"));
    }
}

fn episode_media_content(b: &mut FeedBuilder, attrs: &Attrs) {
    if let Some(ep) = b.episode_mut() {
        ep.push_enclosure(attrs.get("url"), attrs.get("fileSize"), attrs.get("type"));
    }
}

/// `<link>` in an Atom entry (or `<atom:link>` in an RSS item): enclosure
/// rels are media, payment rels fund the episode, alternate rels are the
/// episode's web page.
fn episode_atom_link(b: &mut FeedBuilder, attrs: &Attrs) {
    let Some(ep) = b.episode_mut() else {
        return;
    };
    let Some(href) = attrs.get("href") else {
        return;
    };
    match attrs.get("rel") {
        Some("enclosure") => {
            ep.push_enclosure(Some(href), attrs.get("length"), attrs.get("type"));
        }
        Some("payment") => ep.payment_url = Some(href.to_owned()),
        Some("alternate") | None => ep.link = href.to_owned(),
        _ => {}
    }
}

fn set_episode_duration(b: &mut FeedBuilder, text: String) {
    if let Some(ep) = b.episode_mut() {
        ep.total_time = parse_duration(&text);
    }
}
