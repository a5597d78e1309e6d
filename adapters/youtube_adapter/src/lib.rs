//! YouTube Data API v3 client used as both the stats lookup and the
//! channel resolver.
//!
//! - `channels.list` backs [`StatsLookup`]
//! - `search.list` (one channel result) backs [`ChannelResolver`]
//!
//! Responses are decoded by the `parse_*` functions so they can be
//! exercised without a network.

use milestone_core::domain::{ChannelStats, ResolvedChannel};
use milestone_core::ports::{ChannelResolver, Result, StatsLookup};
use milestone_core::TrackerError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Canonical YouTube Data API base URL.
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_CHARS: usize = 2048;

/// Carries the API key so it never appears in a request URL
const API_KEY_HEADER: &str = "X-Goog-Api-Key";

#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response is missing {0}")]
    MissingField(&'static str),

    #[error("invalid subscriber count {0:?}")]
    InvalidCount(String),
}

impl From<YoutubeError> for TrackerError {
    fn from(err: YoutubeError) -> Self {
        TrackerError::external("youtube", err)
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    title: String,
    custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
    channel_title: String,
}

fn read_subscriber_count(statistics: Option<ChannelStatistics>) -> std::result::Result<u64, YoutubeError> {
    let raw = statistics
        .and_then(|s| s.subscriber_count)
        .ok_or(YoutubeError::MissingField("statistics.subscriberCount"))?;
    raw.parse().map_err(|_| YoutubeError::InvalidCount(raw))
}

/// Decodes a `channels.list` response with `statistics,snippet` parts.
/// An empty item list means the id does not name a channel.
pub fn parse_channel_stats(body: &str) -> std::result::Result<Option<ChannelStats>, YoutubeError> {
    let response: ChannelListResponse = serde_json::from_str(body)?;
    let Some(item) = response.items.into_iter().next() else {
        return Ok(None);
    };

    let snippet = item.snippet.ok_or(YoutubeError::MissingField("snippet"))?;
    let handle = snippet
        .custom_url
        .ok_or(YoutubeError::MissingField("snippet.customUrl"))?;

    Ok(Some(ChannelStats {
        title: snippet.title,
        handle,
        subscriber_count: read_subscriber_count(item.statistics)?,
    }))
}

/// Decodes a `channels.list` response with only the `statistics` part
pub fn parse_subscriber_count(body: &str) -> std::result::Result<Option<u64>, YoutubeError> {
    let response: ChannelListResponse = serde_json::from_str(body)?;
    match response.items.into_iter().next() {
        Some(item) => Ok(Some(read_subscriber_count(item.statistics)?)),
        None => Ok(None),
    }
}

/// Decodes a `search.list` response, taking the first channel hit
pub fn parse_search_result(body: &str) -> std::result::Result<Option<ResolvedChannel>, YoutubeError> {
    let response: SearchListResponse = serde_json::from_str(body)?;
    Ok(response.items.into_iter().next().map(|item| ResolvedChannel {
        channel_id: item.snippet.channel_id,
        title: item.snippet.channel_title,
    }))
}

/// Blocking YouTube Data API client authenticated with an API key
#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(api_key: impl Into<String>) -> std::result::Result<Self, YoutubeError> {
        Self::with_base_url(api_key, YOUTUBE_API_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> std::result::Result<Self, YoutubeError> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> std::result::Result<String, YoutubeError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, ?query, "youtube request");

        // Transport errors print their URL; strip it so nothing request-specific leaks
        let response = self
            .http
            .get(&url)
            .query(query)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .map_err(|e| YoutubeError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| YoutubeError::Http(e.without_url()))?;
        if !status.is_success() {
            return Err(YoutubeError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        Ok(body)
    }
}

impl StatsLookup for YoutubeClient {
    fn channel_stats(&self, channel_id: &str) -> Result<Option<ChannelStats>> {
        let body = self.get("channels", &[("part", "statistics,snippet"), ("id", channel_id)])?;
        Ok(parse_channel_stats(&body)?)
    }

    fn subscriber_count(&self, channel_id: &str) -> Result<Option<u64>> {
        let body = self.get("channels", &[("part", "statistics"), ("id", channel_id)])?;
        Ok(parse_subscriber_count(&body)?)
    }
}

impl ChannelResolver for YoutubeClient {
    fn resolve(&self, name: &str) -> Result<Option<ResolvedChannel>> {
        let body = self.get(
            "search",
            &[("part", "snippet"), ("q", name), ("type", "channel"), ("maxResults", "1")],
        )?;
        Ok(parse_search_result(&body)?)
    }
}
