//! End-to-end tests for the update pipeline: fetch, parse, merge, and the
//! validator round-trip a caller performs between scheduled runs.
//!
//! Each test stands up its own wiremock server and plays the caller's role:
//! persisting returned records and validators by hand, then feeding them
//! back into the next update.

use std::collections::HashSet;

use feedcore::{update_podcast, EpisodeRecord, FeedError, Fetcher, Podcast, UpdateOutcome};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_V1: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Test Show</title>
  <link>https://example.com</link>
  <item>
    <guid isPermaLink="false">ep-1</guid>
    <title>Episode 1</title>
    <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    <enclosure url="https://example.com/1.mp3" length="1000" type="audio/mpeg"/>
  </item>
</channel></rss>"#;

const FEED_V2: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Test Show</title>
  <link>https://example.com</link>
  <item>
    <guid isPermaLink="false">ep-2</guid>
    <title>Episode 2</title>
    <pubDate>Mon, 08 Jan 2024 00:00:00 +0000</pubDate>
    <enclosure url="https://example.com/2.mp3" length="2000" type="audio/mpeg"/>
  </item>
  <item>
    <guid isPermaLink="false">ep-1</guid>
    <title>Episode 1 (fixed audio)</title>
    <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    <enclosure url="https://example.com/1-fixed.mp3" length="1100" type="audio/mpeg"/>
  </item>
</channel></rss>"#;

fn podcast(url: String) -> Podcast {
    Podcast {
        id: 1,
        url,
        etag: None,
        last_modified: None,
    }
}

#[tokio::test]
async fn first_update_creates_episodes_and_validators() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_V1, "application/rss+xml")
                .insert_header("ETag", "\"v1\""),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/feed.xml", server.uri()));

    let outcome = update_podcast(&fetcher, &p, &[], 0).await.unwrap();
    let update = match outcome {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected Updated, got {other:?}"),
    };

    assert_eq!(update.feed.title, "Test Show");
    assert_eq!(update.new_episodes.len(), 1);
    assert!(update.updated_episodes.is_empty());
    assert_eq!(update.new_episodes[0].guid, "ep-1");
    assert_eq!(update.new_episodes[0].file_size, 1000);
    assert!(update.seen_guids.contains("ep-1"));
    assert_eq!(update.validators.etag.as_deref(), Some("\"v1\""));
}

#[tokio::test]
async fn second_run_with_validators_is_unchanged_and_unparsed() {
    let server = MockServer::start().await;
    // Only a conditional request matches; an unconditional one would 404
    Mock::given(method("GET"))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let mut p = podcast(format!("{}/feed.xml", server.uri()));
    p.etag = Some("\"v1\"".to_owned());

    let outcome = update_podcast(&fetcher, &p, &[], 0).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Unchanged));
}

#[tokio::test]
async fn changed_feed_updates_in_place_and_reports_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_V2, "application/rss+xml")
                .insert_header("ETag", "\"v2\""),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/feed.xml", server.uri()));

    // The stored collection from a previous v1 run, with local state
    let mut stored = EpisodeRecord {
        id: Some(7),
        podcast_id: 1,
        title: "Episode 1".to_owned(),
        description: String::new(),
        url: "https://example.com/1.mp3".to_owned(),
        published: 1_704_067_200,
        guid: "ep-1".to_owned(),
        link: String::new(),
        file_size: 1000,
        mime_type: "audio/mpeg".to_owned(),
        total_time: 0,
        payment_url: None,
        playback_position: 0,
    };
    stored.playback_position = 300;

    let outcome = update_podcast(&fetcher, &p, std::slice::from_ref(&stored), 0)
        .await
        .unwrap();
    let update = match outcome {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected Updated, got {other:?}"),
    };

    assert_eq!(update.new_episodes.len(), 1);
    assert_eq!(update.new_episodes[0].guid, "ep-2");

    assert_eq!(update.updated_episodes.len(), 1);
    let refreshed = &update.updated_episodes[0];
    assert_eq!(refreshed.id, Some(7));
    assert_eq!(refreshed.playback_position, 300);
    assert_eq!(refreshed.title, "Episode 1 (fixed audio)");
    assert_eq!(refreshed.url, "https://example.com/1-fixed.mp3");
    assert_eq!(refreshed.file_size, 1100);

    // Episodes come back newest first
    assert!(update.feed.episodes[0].published > update.feed.episodes[1].published);
    assert_eq!(
        update.seen_guids,
        HashSet::from(["ep-1".to_owned(), "ep-2".to_owned()])
    );
    assert_eq!(update.validators.etag.as_deref(), Some("\"v2\""));
}

#[tokio::test]
async fn rerunning_the_same_update_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_V1, "application/rss+xml"),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/feed.xml", server.uri()));

    let first = match update_podcast(&fetcher, &p, &[], 0).await.unwrap() {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected Updated, got {other:?}"),
    };
    let mut stored = first.new_episodes;
    stored[0].id = Some(1);

    let second = match update_podcast(&fetcher, &p, &stored, 0).await.unwrap() {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected Updated, got {other:?}"),
    };

    // No duplicate for a guid merged before
    assert!(second.new_episodes.is_empty());
    assert_eq!(second.updated_episodes.len(), 1);
    assert_eq!(second.updated_episodes[0].guid, "ep-1");
}

#[tokio::test]
async fn moved_feed_reports_new_url_without_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", "https://example.com/new.xml"),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/feed.xml", server.uri()));

    let outcome = update_podcast(&fetcher, &p, &[], 0).await.unwrap();
    match outcome {
        UpdateOutcome::MovedTo(url) => assert_eq!(url, "https://example.com/new.xml"),
        other => panic!("expected MovedTo, got {other:?}"),
    }
}

#[tokio::test]
async fn html_page_autodiscovers_to_moved() {
    let server = MockServer::start().await;
    let html = r#"<html><head>
        <link rel="alternate" type="application/rss+xml" href="/real.xml">
    </head><body>blog</body></html>"#;
    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_V1, "application/rss+xml"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/blog", server.uri()));

    let outcome = update_podcast(&fetcher, &p, &[], 0).await.unwrap();
    match outcome {
        UpdateOutcome::MovedTo(url) => {
            assert_eq!(url, format!("{}/real.xml", server.uri()));
        }
        other => panic!("expected MovedTo, got {other:?}"),
    }
}

#[tokio::test]
async fn gone_feed_is_a_fatal_unsubscribe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/feed.xml", server.uri()));

    let err = update_podcast(&fetcher, &p, &[], 0).await.unwrap_err();
    assert!(matches!(err, FeedError::Unsubscribe(410)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn truncation_applies_after_sorting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_V2, "application/rss+xml"),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let p = podcast(format!("{}/feed.xml", server.uri()));

    let update = match update_podcast(&fetcher, &p, &[], 1).await.unwrap() {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected Updated, got {other:?}"),
    };
    // Only the newest entry survives the cap
    assert_eq!(update.feed.episodes.len(), 1);
    assert_eq!(update.feed.episodes[0].guid, "ep-2");
    assert_eq!(update.seen_guids.len(), 1);
}
