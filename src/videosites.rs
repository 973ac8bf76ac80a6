//! Per-host recognizers for video platforms that publish feeds.
//!
//! Two independent jobs:
//!
//! - recognizing a *video permalink* (a page that is itself one episode's
//!   canonical location), so the parser can treat an enclosure-less entry
//!   pointing at it as an implicit video enclosure;
//! - translating a *channel/user page* into that host's feed URL, used by
//!   autodiscovery when an HTML response only offers a `rel=canonical`
//!   link, and by the fallback resolvers when autodiscovery finds nothing.

use url::Url;

/// Host-specific URL rewriting hook consulted when autodiscovery fails.
///
/// Implementations map a page URL they understand onto the real feed URL
/// for that page. Additional resolvers can be plugged into the fetcher via
/// [`crate::transport::Fetcher::with_resolver`].
pub trait FeedUrlResolver: Send + Sync {
    /// Returns the feed URL for `url`, or `None` if this resolver does not
    /// recognize the host or page shape.
    fn resolve(&self, url: &Url) -> Option<String>;
}

/// True if `link` is a recognized single-video permalink on any supported
/// host. Consulted for entries with no enclosure.
pub fn is_video_link(link: &str) -> bool {
    let Ok(url) = Url::parse(link) else {
        return false;
    };
    youtube::is_video_link(&url) || vimeo::is_video_link(&url)
}

/// Translates a channel/user/playlist page URL into that host's feed URL.
pub fn feed_url_for_page(url: &Url) -> Option<String> {
    youtube::feed_url_for_page(url).or_else(|| vimeo::feed_url_for_page(url))
}

pub mod youtube {
    use super::*;

    fn is_youtube_host(url: &Url) -> bool {
        matches!(
            url.host_str(),
            Some("youtube.com" | "www.youtube.com" | "m.youtube.com")
        )
    }

    pub fn is_video_link(url: &Url) -> bool {
        if url.host_str() == Some("youtu.be") {
            return url.path().len() > 1;
        }
        if !is_youtube_host(url) {
            return false;
        }
        match url.path() {
            "/watch" => url.query_pairs().any(|(k, v)| k == "v" && !v.is_empty()),
            p => p.starts_with("/shorts/") && p.len() > "/shorts/".len(),
        }
    }

    pub fn feed_url_for_page(url: &Url) -> Option<String> {
        if !is_youtube_host(url) {
            return None;
        }
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["channel", id] => Some(format!(
                "https://www.youtube.com/feeds/videos.xml?channel_id={id}"
            )),
            ["user", name] => Some(format!(
                "https://www.youtube.com/feeds/videos.xml?user={name}"
            )),
            ["playlist"] => {
                let list = url
                    .query_pairs()
                    .find(|(k, _)| k == "list")
                    .map(|(_, v)| v.into_owned())?;
                Some(format!(
                    "https://www.youtube.com/feeds/videos.xml?playlist_id={list}"
                ))
            }
            _ => None,
        }
    }
}

pub mod vimeo {
    use super::*;

    fn is_vimeo_host(url: &Url) -> bool {
        matches!(url.host_str(), Some("vimeo.com" | "www.vimeo.com"))
    }

    pub fn is_video_link(url: &Url) -> bool {
        if !is_vimeo_host(url) {
            return false;
        }
        // Video permalinks are /<numeric id>
        let mut segments = url.path_segments().into_iter().flatten();
        match (segments.next(), segments.next()) {
            (Some(first), None) => !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()),
            _ => false,
        }
    }

    pub fn feed_url_for_page(url: &Url) -> Option<String> {
        if !is_vimeo_host(url) {
            return None;
        }
        let mut segments = url.path_segments().into_iter().flatten();
        let user = match (segments.next(), segments.next()) {
            (Some(first), None) if !first.is_empty() => first,
            _ => return None,
        };
        // A numeric segment is a video page, not a user page
        if user.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(format!("https://vimeo.com/{user}/videos/rss"))
    }
}

/// Default resolver for YouTube channel, user, and playlist pages.
pub struct YoutubeResolver;

impl FeedUrlResolver for YoutubeResolver {
    fn resolve(&self, url: &Url) -> Option<String> {
        youtube::feed_url_for_page(url)
    }
}

/// Default resolver for Vimeo user pages.
pub struct VimeoResolver;

impl FeedUrlResolver for VimeoResolver {
    fn resolve(&self, url: &Url) -> Option<String> {
        vimeo::feed_url_for_page(url)
    }
}
