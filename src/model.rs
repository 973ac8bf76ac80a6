//! Data shapes flowing through the pipeline.
//!
//! [`ParsedFeed`] and [`ParsedEpisode`] are the parser's output;
//! [`EpisodeRecord`] is the persistent shape handed to the caller's
//! storage layer; [`Podcast`] is the caller-owned subscription state read
//! by the transport on every fetch.

use serde::{Deserialize, Serialize};

/// The two opaque HTTP cache validators persisted per podcast.
///
/// Both strings are stored and echoed back verbatim: the entity tag goes
/// out as `If-None-Match`, the last-modified string (the server's own
/// RFC-822-formatted header) as `If-Modified-Since`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheValidators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl CacheValidators {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// A normalized feed: channel metadata plus its episodes, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedFeed {
    /// Channel title; defaults to the feed URL when the feed declares none.
    pub title: String,
    /// Channel website link; possibly empty.
    pub link: String,
    pub description: String,
    pub cover_url: Option<String>,
    pub payment_url: Option<String>,
    pub episodes: Vec<ParsedEpisode>,
}

/// One normalized episode entry.
///
/// Invariant: `url` is never empty — entries without an enclosure that are
/// not recognized video-host permalinks are dropped before emission.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedEpisode {
    pub title: String,
    pub description: String,
    /// Canonical download URL (the picked enclosure).
    pub url: String,
    /// Published timestamp, epoch seconds; 0 if unparseable.
    pub published: i64,
    /// Dedup key; defaults to `url` when the feed declares no guid.
    pub guid: String,
    pub link: String,
    /// Enclosure size in bytes; -1 if unknown or unparseable.
    pub file_size: i64,
    /// Enclosure MIME type; `application/octet-stream` if missing or malformed.
    pub mime_type: String,
    /// Total playback time in seconds; 0 if undeclared or unparseable.
    pub total_time: u32,
    pub payment_url: Option<String>,
}

/// Caller-owned subscription state threaded into each fetch.
///
/// The pipeline never creates or destroys podcasts; it only reads the URL
/// and validators and hands fresh validators back for the caller to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Podcast {
    pub id: i64,
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Podcast {
    pub fn validators(&self) -> CacheValidators {
        CacheValidators {
            etag: self.etag.clone(),
            last_modified: self.last_modified.clone(),
        }
    }
}

/// Persistent episode shape, keyed uniquely by `(podcast_id, guid)`.
///
/// Created on first sighting of a guid, overwritten in place on every later
/// sighting. `id` and `playback_position` are local state the feed knows
/// nothing about; the reconciler preserves them across updates. Never
/// deleted by this pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Storage-assigned row id; `None` until the caller persists the record.
    pub id: Option<i64>,
    pub podcast_id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub published: i64,
    pub guid: String,
    pub link: String,
    pub file_size: i64,
    pub mime_type: String,
    pub total_time: u32,
    pub payment_url: Option<String>,
    /// Resume position in seconds; owned by the player, not the feed.
    pub playback_position: u32,
}

impl EpisodeRecord {
    /// Builds a fresh record from a parsed entry on first sighting.
    pub fn from_parsed(podcast_id: i64, parsed: &ParsedEpisode) -> Self {
        Self {
            id: None,
            podcast_id,
            title: parsed.title.clone(),
            description: parsed.description.clone(),
            url: parsed.url.clone(),
            published: parsed.published,
            guid: parsed.guid.clone(),
            link: parsed.link.clone(),
            file_size: parsed.file_size,
            mime_type: parsed.mime_type.clone(),
            total_time: parsed.total_time,
            payment_url: parsed.payment_url.clone(),
            playback_position: 0,
        }
    }

    /// Overwrites the feed-sourced fields from a fresh parse, keeping the
    /// record's identity and locally-held state intact.
    pub fn overwrite_from(&mut self, parsed: &ParsedEpisode) {
        self.title = parsed.title.clone();
        self.description = parsed.description.clone();
        self.url = parsed.url.clone();
        self.published = parsed.published;
        self.guid = parsed.guid.clone();
        self.link = parsed.link.clone();
        self.file_size = parsed.file_size;
        self.mime_type = parsed.mime_type.clone();
        self.total_time = parsed.total_time;
        self.payment_url = parsed.payment_url.clone();
    }
}
