//! Announcers: the X/Twitter v2 API client, and a dry-run announcer that
//! only logs what would have been posted.

pub mod oauth;

use milestone_core::domain::PostReceipt;
use milestone_core::ports::{Announcer, Result};
use milestone_core::TrackerError;
use oauth::OAuthCredentials;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Canonical endpoint for creating a post.
pub const CREATE_TWEET_URL: &str = "https://api.twitter.com/2/tweets";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_CHARS: usize = 2048;

#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to sign request: {0}")]
    Signing(String),
}

impl From<TwitterError> for TrackerError {
    fn from(err: TwitterError) -> Self {
        TrackerError::external("twitter", err)
    }
}

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Decodes the `POST /2/tweets` confirmation
pub fn parse_create_tweet(body: &str) -> std::result::Result<PostReceipt, TwitterError> {
    let response: CreateTweetResponse = serde_json::from_str(body)?;
    Ok(PostReceipt { id: response.data.id })
}

/// Posts announcements with OAuth 1.0a user-context credentials
pub struct TwitterClient {
    http: reqwest::blocking::Client,
    credentials: OAuthCredentials,
    endpoint: String,
}

impl TwitterClient {
    pub fn new(credentials: OAuthCredentials) -> std::result::Result<Self, TwitterError> {
        Self::with_endpoint(credentials, CREATE_TWEET_URL)
    }

    pub fn with_endpoint(
        credentials: OAuthCredentials,
        endpoint: impl Into<String>,
    ) -> std::result::Result<Self, TwitterError> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            credentials,
            endpoint: endpoint.into(),
        })
    }

    fn create_tweet(&self, text: &str) -> std::result::Result<PostReceipt, TwitterError> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let authorization =
            oauth::authorization_header(&self.credentials, "POST", &self.endpoint, &[], &nonce, timestamp)
                .map_err(|e| TwitterError::Signing(e.to_string()))?;

        let body = serde_json::to_vec(&CreateTweetRequest { text })?;
        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(TwitterError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        parse_create_tweet(&body)
    }
}

impl Announcer for TwitterClient {
    fn publish(&self, text: &str) -> Result<PostReceipt> {
        let receipt = self.create_tweet(text)?;
        tracing::debug!(id = %receipt.id, "tweet created");
        Ok(receipt)
    }
}

/// Logs the announcement instead of posting it
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunAnnouncer;

impl Announcer for DryRunAnnouncer {
    fn publish(&self, text: &str) -> Result<PostReceipt> {
        tracing::info!(text, "dry run, not posting");
        Ok(PostReceipt {
            id: "dry-run".to_string(),
        })
    }
}
