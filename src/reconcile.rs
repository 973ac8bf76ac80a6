//! Reconciling a freshly parsed feed against a podcast's stored episodes.
//!
//! Pure data transformation: explicit inputs (the parse result and the
//! existing records), explicit outputs (new records, updated records, the
//! set of guids present in this fetch). No network, no storage, no hidden
//! state — safe to re-run and to call from any worker context.

use std::collections::{HashMap, HashSet};

use crate::model::{EpisodeRecord, ParsedFeed};

/// Outcome of merging one parse against one podcast's episode collection.
#[derive(Debug, Default)]
pub struct MergeResult {
    /// Records for guids never seen before; `id` is unset until persisted.
    pub new_episodes: Vec<EpisodeRecord>,
    /// Existing records with feed fields overwritten in place; identity and
    /// locally-held state (playback position) are preserved.
    pub updated_episodes: Vec<EpisodeRecord>,
    /// Every guid present in this fetch, returned even when the feed is
    /// otherwise empty. Diffing it against the podcast's historical guid
    /// set is how callers detect server-side removals; this pipeline never
    /// deletes anything itself.
    pub seen_guids: HashSet<String>,
}

/// Merges `feed` into the episode collection of podcast `podcast_id`.
///
/// Unknown guid → new record; known guid → update-in-place. A guid that
/// appears more than once in a single fetch is counted once (the first,
/// i.e. newest after the parser's sort, occurrence wins).
pub fn merge(podcast_id: i64, feed: &ParsedFeed, existing: &[EpisodeRecord]) -> MergeResult {
    let by_guid: HashMap<&str, &EpisodeRecord> =
        existing.iter().map(|e| (e.guid.as_str(), e)).collect();

    let mut result = MergeResult::default();
    for parsed in &feed.episodes {
        if !result.seen_guids.insert(parsed.guid.clone()) {
            continue;
        }
        match by_guid.get(parsed.guid.as_str()) {
            Some(known) => {
                let mut record = (*known).clone();
                record.overwrite_from(parsed);
                result.updated_episodes.push(record);
            }
            None => {
                result
                    .new_episodes
                    .push(EpisodeRecord::from_parsed(podcast_id, parsed));
            }
        }
    }
    result
}
