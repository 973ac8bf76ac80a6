//! Feed acquisition and normalization for a podcast aggregator.
//!
//! Given a podcast's feed URL and its cached HTTP validators, this crate
//! fetches the feed, decides whether it changed, parses it into normalized
//! podcast/episode records, and reconciles those records against the
//! podcast's stored episode collection — without ever duplicating or
//! losing an episode across repeated updates.
//!
//! The pipeline has three stages, strictly sequential per podcast:
//!
//! - [`transport`] — one conditional GET, typed status classification,
//!   bounded redirects, and HTML feed autodiscovery;
//! - [`parser`] — a streaming structural parser driven by a declarative
//!   path-keyed rule table, tolerant of the malformed fields real feeds
//!   ship;
//! - [`reconcile`] — a pure merge of the parse result against existing
//!   episodes, keyed by guid.
//!
//! [`pipeline::update_podcast`] wires the stages together for one podcast;
//! [`pipeline::update_all`] fans many podcasts out over a bounded worker
//! pool. Persistence, scheduling, and UI are the caller's business: the
//! crate hands back records and validators and never touches storage.
//!
//! ```no_run
//! use feedcore::{Fetcher, Podcast, UpdateOutcome};
//!
//! # async fn example() -> Result<(), feedcore::FeedError> {
//! let fetcher = Fetcher::new()?;
//! let podcast = Podcast {
//!     id: 1,
//!     url: "https://example.com/feed.xml".to_owned(),
//!     etag: None,
//!     last_modified: None,
//! };
//!
//! match feedcore::update_podcast(&fetcher, &podcast, &[], 0).await? {
//!     UpdateOutcome::Unchanged => {}
//!     UpdateOutcome::MovedTo(new_url) => { /* persist the new URL */ }
//!     UpdateOutcome::Updated(update) => {
//!         // persist update.new_episodes / update.updated_episodes,
//!         // store update.validators for the next fetch
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod model;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod transport;
mod util;
pub mod videosites;

pub use error::FeedError;
pub use model::{CacheValidators, EpisodeRecord, ParsedEpisode, ParsedFeed, Podcast};
pub use pipeline::{
    update_all, update_podcast, FeedUpdate, UpdateJob, UpdateOutcome, UpdateResult,
    DEFAULT_CONCURRENCY,
};
pub use reconcile::{merge, MergeResult};
pub use transport::{FetchOutcome, FetchedFeed, Fetcher, FetcherConfig};
pub use videosites::FeedUrlResolver;
