//! HTTP transport: conditional fetching with typed outcomes.
//!
//! One GET with the cached validators attached, an exhaustive mapping of
//! the status code into [`FetchOutcome`] or [`FeedError`], bounded
//! redirect handling, and HTML autodiscovery when a subscription URL turns
//! out to be a web page. NotModified and Redirected are expected states,
//! not errors; only genuine failures surface through `Result`.

mod discovery;

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, LOCATION};
use reqwest::{redirect, StatusCode};
use url::Url;

use crate::error::FeedError;
use crate::model::CacheValidators;
use crate::videosites::{FeedUrlResolver, VimeoResolver, YoutubeResolver};

/// Hop bound for a single fetch; a chain this long is a loop.
const MAX_REDIRECTS: usize = 10;

/// Transport configuration. One conservative timeout applied uniformly to
/// every request; no per-host tuning.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_body_bytes: 10 * 1024 * 1024,
            user_agent: concat!("feedcore/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Result of one fetch. Only `Updated` carries feed data.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The feed changed (or freshness could not be established); the body
    /// and the validators to persist for the next fetch are attached.
    Updated(FetchedFeed),
    /// The server confirmed the cached copy is still current.
    NotModified,
    /// The feed moved permanently (HTTP 301/308 or autodiscovery); the
    /// caller should persist the new subscription URL.
    Redirected(String),
}

/// Body and response metadata of an updated feed.
#[derive(Debug)]
pub struct FetchedFeed {
    pub data: Vec<u8>,
    /// Final response URL after any transparently-followed redirects.
    pub url: String,
    /// Lowercased `Content-Type` header; empty if the server sent none.
    pub content_type: String,
    /// Fresh validators captured from `ETag` / `Last-Modified`.
    pub validators: CacheValidators,
}

impl FetchedFeed {
    fn looks_like_html(&self) -> bool {
        self.content_type.contains("text/html") || self.content_type.contains("application/xhtml")
    }
}

/// Feed fetcher with conditional-request and autodiscovery support.
///
/// Cheap to share behind a reference across concurrent podcast updates;
/// holds no per-feed state.
pub struct Fetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
    resolvers: Vec<Box<dyn FeedUrlResolver>>,
}

impl Fetcher {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect_policy())
            .build()
            .map_err(FeedError::Network)?;
        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
            resolvers: vec![Box::new(YoutubeResolver), Box::new(VimeoResolver)],
        })
    }

    /// Registers an additional host-specific URL resolver, consulted when
    /// autodiscovery finds nothing in the page itself.
    pub fn with_resolver(mut self, resolver: Box<dyn FeedUrlResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Fetches `url` conditionally and classifies the result.
    ///
    /// # Errors
    ///
    /// The full [`FeedError`] taxonomy: status-code classes, network
    /// failures, timeouts, oversized bodies, redirect loops.
    pub async fn fetch(
        &self,
        url: &str,
        validators: &CacheValidators,
    ) -> Result<FetchOutcome, FeedError> {
        let outcome = self.fetch_once(url, validators).await?;

        let FetchOutcome::Updated(fetched) = &outcome else {
            return Ok(outcome);
        };
        if !fetched.looks_like_html() {
            return Ok(outcome);
        }

        // The subscription URL served a web page. Try the page's own hint
        // first, then the host-specific resolvers; failing both, hand the
        // HTML back as a literal (likely failing) feed rather than erroring
        // here. Candidates matching the page URL itself are skipped: after
        // a transparently-followed redirect the page may advertise its own
        // final location.
        let body = String::from_utf8_lossy(&fetched.data);
        let mut candidates: Vec<String> = discovery::discover_feed_url(&body, &fetched.url)
            .into_iter()
            .chain(self.resolve_with_hooks(url))
            .filter(|found| found != url && *found != fetched.url)
            .collect();
        candidates.dedup();

        for found in candidates {
            // One recursive fetch, autodiscovery off. Its body is discarded;
            // the caller owns the re-subscribe and will fetch the new URL on
            // its own schedule.
            match self.fetch_once(&found, &CacheValidators::default()).await {
                Ok(_) => {
                    tracing::info!(feed = %url, discovered = %found, "autodiscovered feed URL");
                    return Ok(FetchOutcome::Redirected(found));
                }
                Err(e) => {
                    tracing::warn!(
                        feed = %url,
                        discovered = %found,
                        error = %e,
                        "discovered feed URL failed, falling back"
                    );
                }
            }
        }
        Ok(outcome)
    }

    fn resolve_with_hooks(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        self.resolvers.iter().find_map(|r| r.resolve(&parsed))
    }

    /// One conditional GET with no autodiscovery.
    async fn fetch_once(
        &self,
        url: &str,
        validators: &CacheValidators,
    ) -> Result<FetchOutcome, FeedError> {
        // Local files bypass HTTP entirely and are always updated
        if let Some(path) = url.strip_prefix("file://") {
            let data = tokio::fs::read(path).await?;
            return Ok(FetchOutcome::Updated(FetchedFeed {
                data,
                url: url.to_owned(),
                content_type: String::new(),
                validators: CacheValidators::default(),
            }));
        }

        let mut request = self.client.get(url);
        if let Some(etag) = &validators.etag {
            request = request.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &validators.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send().await.map_err(FeedError::from_reqwest)?;
        let status = response.status();

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_MODIFIED => return Ok(FetchOutcome::NotModified),
            StatusCode::MOVED_PERMANENTLY | StatusCode::PERMANENT_REDIRECT => {
                // The redirect policy stops on permanent redirects so the
                // new location can be persisted by the caller
                let new_url = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| response.url().join(loc).ok())
                    .ok_or(FeedError::UnknownStatusCode(status.as_u16()))?;
                return Ok(FetchOutcome::Redirected(new_url.to_string()));
            }
            StatusCode::UNAUTHORIZED => {
                return Err(FeedError::AuthenticationRequired(url.to_owned()))
            }
            StatusCode::FORBIDDEN | StatusCode::GONE => {
                return Err(FeedError::Unsubscribe(status.as_u16()))
            }
            StatusCode::NOT_FOUND => return Err(FeedError::NotFound),
            s if s.is_client_error() => return Err(FeedError::BadRequest(status.as_u16())),
            s if s.is_server_error() => {
                return Err(FeedError::InternalServerError(status.as_u16()))
            }
            _ => return Err(FeedError::UnknownStatusCode(status.as_u16())),
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let fresh = CacheValidators {
            etag: header_string(&response, ETAG),
            last_modified: header_string(&response, LAST_MODIFIED),
        };
        let final_url = response.url().to_string();

        let data = read_limited_bytes(response, self.max_body_bytes).await?;
        Ok(FetchOutcome::Updated(FetchedFeed {
            data,
            url: final_url,
            content_type,
            validators: fresh,
        }))
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Follows temporary redirects transparently, stops on permanent ones so
/// the caller can persist the new URL, and errors past the hop bound
/// (which also breaks redirect cycles).
fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match attempt.status() {
            StatusCode::MOVED_PERMANENTLY | StatusCode::PERMANENT_REDIRECT => attempt.stop(),
            _ => attempt.follow(),
        }
    })
}

/// Reads a response body with a hard size cap, streaming so an oversized
/// body is rejected without being buffered whole.
async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FeedError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FeedError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FeedError::from_reqwest)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
