//! View-count fetching against YouTube's public endpoints.
//!
//! Primary source is the Data API v3 `videos` endpoint. When it yields no
//! usable statistics, the oEmbed endpoint serves as an existence check
//! only — a confirmed-existing video with no statistics is still
//! `Unavailable`. No outcome is ever fabricated and nothing escapes this
//! boundary as an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use swishview_core::config::YouTubeConfig;
use swishview_core::types::FetchOutcome;
use swishview_core::{TrackerError, TrackerResult};

use crate::resolver::VideoId;

/// Source of current view counts for a video.
#[async_trait]
pub trait ViewSource: Send + Sync {
    async fn fetch_views(&self, video: &VideoId) -> FetchOutcome;
}

/// Fetcher backed by the YouTube Data API with an oEmbed existence check.
pub struct YouTubeFetcher {
    client: Client,
    config: YouTubeConfig,
}

/// Wire shape of the Data API `videos?part=statistics` response. Only the
/// fields we read; everything else is ignored.
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoStatistics {
    /// The API serializes counts as decimal strings.
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

impl YouTubeFetcher {
    pub fn new(config: YouTubeConfig) -> TrackerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| TrackerError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Query the Data API. `Ok(None)` means the call worked but carried no
    /// usable statistics; transport and decode failures surface as `Err`.
    async fn fetch_primary(&self, video: &VideoId) -> Result<Option<u64>, reqwest::Error> {
        let response = self
            .client
            .get(&self.config.data_api_endpoint)
            .query(&[
                ("id", video.as_str()),
                ("part", "statistics"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(
                video = %video,
                status = response.status().as_u16(),
                "statistics endpoint returned non-success"
            );
            return Ok(None);
        }

        let body: VideoListResponse = response.json().await?;
        let count = body
            .items
            .first()
            .and_then(|item| item.statistics.as_ref())
            .and_then(|stats| stats.view_count.as_deref())
            // A malformed count coerces to zero rather than failing the fetch.
            .map(|raw| raw.parse::<u64>().unwrap_or(0));

        Ok(count)
    }

    /// oEmbed lookup for the canonical watch URL. Only the status matters;
    /// the payload is discarded.
    async fn video_exists(&self, video: &VideoId) -> bool {
        let result = self
            .client
            .get(&self.config.oembed_endpoint)
            .query(&[("url", video.watch_url().as_str()), ("format", "json")])
            .send()
            .await;

        matches!(result, Ok(response) if response.status().is_success())
    }
}

#[async_trait]
impl ViewSource for YouTubeFetcher {
    async fn fetch_views(&self, video: &VideoId) -> FetchOutcome {
        let start = std::time::Instant::now();

        let primary = self.fetch_primary(video).await;
        metrics::histogram!("youtube.fetch_latency_ms")
            .record(start.elapsed().as_millis() as f64);

        match primary {
            Ok(Some(count)) => {
                metrics::counter!("youtube.fetch_measured").increment(1);
                FetchOutcome::Measured(count)
            }
            Ok(None) => {
                // Keep the video-gone / stats-missing distinction visible in
                // logs even though the caller treats both as Unavailable.
                if self.video_exists(video).await {
                    debug!(video = %video, "video exists but statistics are unavailable");
                } else {
                    debug!(video = %video, "video not found by existence check");
                }
                metrics::counter!("youtube.fetch_unavailable").increment(1);
                FetchOutcome::Unavailable
            }
            Err(e) => {
                warn!(video = %video, error = %e, "statistics provider unreachable");
                if self.video_exists(video).await {
                    debug!(video = %video, "existence check succeeded during provider outage");
                }
                metrics::counter!("youtube.fetch_unavailable").increment(1);
                FetchOutcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::extract_video_id;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vid(raw: &str) -> VideoId {
        extract_video_id(&format!("https://youtu.be/{raw}")).unwrap()
    }

    fn test_config(server: &MockServer) -> YouTubeConfig {
        YouTubeConfig {
            data_api_endpoint: format!("{}/youtube/v3/videos", server.uri()),
            oembed_endpoint: format!("{}/oembed", server.uri()),
            api_key: "test-api-key".to_string(),
            request_timeout_ms: 2_000,
        }
    }

    fn statistics_body(view_count: &str) -> serde_json::Value {
        json!({
            "items": [
                { "statistics": { "viewCount": view_count } }
            ]
        })
    }

    #[tokio::test]
    async fn test_measured_view_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "vid-1"))
            .and(query_param("part", "statistics"))
            .and(query_param("key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(statistics_body("123456")))
            .mount(&server)
            .await;

        let fetcher = YouTubeFetcher::new(test_config(&server)).unwrap();
        let id = vid("vid-1");
        assert_eq!(fetcher.fetch_views(&id).await, FetchOutcome::Measured(123_456));
    }

    #[tokio::test]
    async fn test_malformed_count_coerces_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(statistics_body("not-a-number")))
            .mount(&server)
            .await;

        let fetcher = YouTubeFetcher::new(test_config(&server)).unwrap();
        let id = vid("vid-2");
        assert_eq!(fetcher.fetch_views(&id).await, FetchOutcome::Measured(0));
    }

    #[tokio::test]
    async fn test_missing_statistics_is_unavailable_even_when_video_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;
        // The existence check succeeding must NOT manufacture a count.
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "still up" })))
            .mount(&server)
            .await;

        let fetcher = YouTubeFetcher::new(test_config(&server)).unwrap();
        let id = vid("vid-3");
        assert_eq!(fetcher.fetch_views(&id).await, FetchOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_provider_error_and_missing_video_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = YouTubeFetcher::new(test_config(&server)).unwrap();
        let id = vid("vid-4");
        assert_eq!(fetcher.fetch_views(&id).await, FetchOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_oembed_receives_canonical_watch_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .and(query_param("url", "https://www.youtube.com/watch?v=vid-5"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = YouTubeFetcher::new(test_config(&server)).unwrap();
        let id = vid("vid-5");
        assert_eq!(fetcher.fetch_views(&id).await, FetchOutcome::Unavailable);
    }
}
