//! Streaming structural feed parser.
//!
//! Consumes a byte stream and incrementally builds a normalized
//! [`ParsedFeed`] by dispatching XML events through the declarative
//! path-keyed rule table in [`rules`]. The parser never partially mutates
//! caller state: it is purely a pull from the stream to the output
//! structure.
//!
//! Real-world feeds are malformed in every way imaginable; the policy
//! throughout is to normalize bad *fields* (dates → 0, sizes → -1, MIME →
//! generic binary) and only fail on documents that are not parseable feeds
//! at all.

mod dates;
mod rules;

use std::io::BufRead;

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;
use crate::model::{ParsedEpisode, ParsedFeed};
use crate::util::{normalize_mime_type, parse_file_size, squash_whitespace, DEFAULT_MIME_TYPE};
use crate::videosites;

/// MIME type assumed for implicit video-host enclosures.
const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Parses a feed document into a [`ParsedFeed`].
///
/// `feed_url` is used as the fallback channel title and is never fetched.
/// A non-zero `max_episodes` keeps only the newest N entries after the
/// global sort; 0 means unlimited.
///
/// # Errors
///
/// [`FeedError::InvalidFeed`] when the document is not well-formed XML or
/// its root element is neither `rss` nor `feed`. Malformed individual
/// fields never error; they are normalized per the fallback policies.
pub fn parse<R: BufRead>(
    reader: R,
    feed_url: &str,
    max_episodes: usize,
) -> Result<ParsedFeed, FeedError> {
    let mut xml = Reader::from_reader(reader);

    let mut builder = FeedBuilder::default();
    let mut path: Vec<String> = Vec::new();
    // Some(depth) while a wants_text rule is accumulating; nested unknown
    // elements (embedded markup in descriptions) keep appending to it.
    let mut capture: Option<(usize, String)> = None;
    let mut root_ok = false;

    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf) {
            Err(e) => return Err(FeedError::InvalidFeed(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = normalize_name(&String::from_utf8_lossy(e.name().as_ref()));
                if path.is_empty() {
                    root_ok = name == "rss" || name == "feed";
                }
                path.push(name);
                let joined = path.join("/");
                if let Some(rule) = rules::lookup(&joined) {
                    if let Some(f) = rule.on_start {
                        f(&mut builder, &Attrs::from_event(&e));
                    }
                    if rule.wants_text && capture.is_none() {
                        capture = Some((path.len(), String::new()));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = normalize_name(&String::from_utf8_lossy(e.name().as_ref()));
                path.push(name);
                let joined = path.join("/");
                if let Some(rule) = rules::lookup(&joined) {
                    if let Some(f) = rule.on_start {
                        f(&mut builder, &Attrs::from_event(&e));
                    }
                    if let Some(f) = rule.on_end {
                        f(&mut builder, String::new());
                    }
                }
                path.pop();
            }
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = capture.as_mut() {
                    let raw = String::from_utf8_lossy(t.as_ref()).into_owned();
                    // Undefined entities are common in the wild; keep the
                    // raw text rather than failing the field
                    match unescape(&raw) {
                        Ok(unescaped) => text.push_str(&unescaped),
                        Err(_) => text.push_str(&raw),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                let joined = path.join("/");
                if let Some(rule) = rules::lookup(&joined) {
                    let text = match capture.as_ref() {
                        Some((depth, _)) if rule.wants_text && *depth == path.len() => {
                            let (_, text) = capture.take().unwrap_or_default();
                            text
                        }
                        _ => String::new(),
                    };
                    if let Some(f) = rule.on_end {
                        f(&mut builder, squash_whitespace(&text));
                    }
                }
                path.pop();
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    if !root_ok {
        return Err(FeedError::InvalidFeed(
            "not an RSS or Atom document".to_owned(),
        ));
    }

    let mut feed = builder.feed;
    if feed.title.is_empty() {
        feed.title = feed_url.to_owned();
    }

    // Document order is explicitly not trusted: re-sort globally by
    // published time, newest first, before any truncation
    feed.episodes.sort_by(|a, b| b.published.cmp(&a.published));
    if max_episodes > 0 {
        feed.episodes.truncate(max_episodes);
    }

    Ok(feed)
}

/// Normalizes an element name: the conventional `itunes:`, `media:`, and
/// `atom:` prefixes are kept, any other prefix is stripped.
fn normalize_name(raw: &str) -> String {
    match raw.split_once(':') {
        Some((prefix @ ("itunes" | "media" | "atom"), local)) => format!("{prefix}:{local}"),
        Some((_, local)) => local.to_owned(),
        None => raw.to_owned(),
    }
}

/// Decoded, unescaped attributes of one element.
pub(crate) struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn from_event(e: &quick_xml::events::BytesStart<'_>) -> Self {
        let pairs = e
            .attributes()
            .flatten()
            .map(|a| {
                let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                let raw = String::from_utf8_lossy(&a.value).into_owned();
                let value = match unescape(&raw) {
                    Ok(v) => v.into_owned(),
                    Err(_) => raw,
                };
                (key, value)
            })
            .collect();
        Self(pairs)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// One recorded enclosure-like element.
struct Enclosure {
    url: String,
    size: i64,
    mime_type: String,
}

/// Accumulator for the entry currently being parsed.
#[derive(Default)]
pub(crate) struct EpisodeBuilder {
    title: String,
    description: String,
    link: String,
    guid: String,
    guid_is_permalink: bool,
    published: i64,
    total_time: u32,
    payment_url: Option<String>,
    enclosures: Vec<Enclosure>,
}

impl EpisodeBuilder {
    /// Records an enclosure-like element. Entries without a URL are not
    /// enclosures at all and are ignored here; the drop decision for the
    /// whole entry happens at commit time.
    fn push_enclosure(&mut self, url: Option<&str>, length: Option<&str>, mime: Option<&str>) {
        let Some(url) = url else { return };
        if url.is_empty() {
            return;
        }
        self.enclosures.push(Enclosure {
            url: url.to_owned(),
            size: parse_file_size(length.unwrap_or("")),
            mime_type: normalize_mime_type(mime.unwrap_or(DEFAULT_MIME_TYPE)),
        });
    }
}

/// Accumulator for the whole document.
#[derive(Default)]
pub(crate) struct FeedBuilder {
    feed: ParsedFeed,
    episode: Option<EpisodeBuilder>,
}

impl FeedBuilder {
    fn episode_mut(&mut self) -> Option<&mut EpisodeBuilder> {
        self.episode.as_mut()
    }

    fn begin_episode(&mut self) {
        self.episode = Some(EpisodeBuilder::default());
    }

    /// Commits the current entry, applying the enclosure and guid policies.
    ///
    /// The first recorded enclosure becomes the canonical download; with
    /// none, a recognized video-host permalink in the link field becomes a
    /// single implicit video enclosure; otherwise the entry is dropped so
    /// the "every episode has a non-empty URL" invariant holds.
    fn finish_episode(&mut self) {
        let Some(ep) = self.episode.take() else {
            return;
        };
        let EpisodeBuilder {
            title,
            description,
            mut link,
            guid,
            guid_is_permalink,
            published,
            total_time,
            payment_url,
            enclosures,
        } = ep;

        let (url, file_size, mime_type) = match enclosures.into_iter().next() {
            Some(enc) => (enc.url, enc.size, enc.mime_type),
            None if videosites::is_video_link(&link) => {
                (link.clone(), -1, VIDEO_MIME_TYPE.to_owned())
            }
            None => return,
        };

        let guid = if guid.is_empty() { url.clone() } else { guid };
        if link.is_empty() && guid_is_permalink {
            link = guid.clone();
        }

        self.feed.episodes.push(ParsedEpisode {
            title,
            description,
            url,
            published,
            guid,
            link,
            file_size,
            mime_type,
            total_time,
            payment_url,
        });
    }
}
