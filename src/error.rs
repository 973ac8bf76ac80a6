//! Error taxonomy for the update pipeline.
//!
//! Fatal conditions (gone feeds, revoked access, redirect loops, unparseable
//! documents) should stop automatic updates and be surfaced to a human;
//! transient conditions are safe to retry on the next scheduled run;
//! authentication is its own category so callers can prompt for credentials
//! instead of retrying or unsubscribing.

use thiserror::Error;

/// Errors that can occur while fetching, parsing, or merging a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP 401: the feed wants credentials. Carries the URL so callers can
    /// prompt and retry with authentication baked into it.
    #[error("authentication required for {0}")]
    AuthenticationRequired(String),
    /// HTTP 403 or 410: access permanently revoked or resource gone. The
    /// subscription should stop being updated.
    #[error("feed permanently unavailable (HTTP {0})")]
    Unsubscribe(u16),
    /// HTTP 404.
    #[error("feed not found")]
    NotFound,
    /// Any other 4xx; transient, retry on the next scheduled update.
    #[error("bad request (HTTP {0})")]
    BadRequest(u16),
    /// 5xx; transient.
    #[error("server error (HTTP {0})")]
    InternalServerError(u16),
    /// A status code outside every class we know how to handle.
    #[error("unknown status code {0}")]
    UnknownStatusCode(u16),
    /// The redirect chain exceeded the hop bound (includes cycles).
    #[error("too many redirects")]
    TooManyRedirects,
    /// The uniform per-request timeout expired.
    #[error("request timed out")]
    Timeout,
    /// Network-level error (DNS, connection, TLS, ...).
    #[error("request failed: {0}")]
    Network(reqwest::Error),
    /// Response body exceeded the size cap.
    #[error("response too large")]
    ResponseTooLarge,
    /// The document could not be parsed as a feed at the XML level.
    /// Field-level malformation never produces this; it is normalized away.
    #[error("invalid feed: {0}")]
    InvalidFeed(String),
    /// Reading a local `file://` feed failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Folds reqwest's error surface into the taxonomy: redirect-policy
    /// failures become [`FeedError::TooManyRedirects`], timeouts become
    /// [`FeedError::Timeout`], everything else stays a network error.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_redirect() {
            FeedError::TooManyRedirects
        } else if err.is_timeout() {
            FeedError::Timeout
        } else {
            FeedError::Network(err)
        }
    }

    /// True for conditions that should stop automatic updates of the
    /// subscription until a human intervenes.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FeedError::Unsubscribe(_)
                | FeedError::NotFound
                | FeedError::TooManyRedirects
                | FeedError::InvalidFeed(_)
        )
    }

    /// True for conditions that are safe to retry on the next scheduled
    /// update without user intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FeedError::BadRequest(_)
                | FeedError::InternalServerError(_)
                | FeedError::UnknownStatusCode(_)
                | FeedError::Timeout
                | FeedError::Network(_)
                | FeedError::ResponseTooLarge
                | FeedError::Io(_)
        )
    }
}
