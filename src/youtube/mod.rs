pub mod channels;
pub mod playlist_items;
pub mod videos;

use crate::quota::QuotaGate;
use async_trait::async_trait;
use std::sync::Arc;
use videos::VideoSnapshot;

#[derive(Debug)]
pub struct YouTubeApiError {
    pub status: u16,
    pub message: String,
    pub reason: Option<String>,
}

impl std::fmt::Display for YouTubeApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "YouTube API error {}: {}", self.status, self.message)
    }
}

impl std::error::Error for YouTubeApiError {}

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub async fn youtube_get(
    http: &reqwest::Client,
    url: &str,
) -> Result<serde_json::Value, YouTubeApiError> {
    let res = http.get(url).send().await.map_err(|e| YouTubeApiError {
        status: 0,
        message: e.to_string(),
        reason: None,
    })?;

    let status = res.status().as_u16();
    if status >= 400 {
        let body: serde_json::Value = res.json().await.unwrap_or_default();
        let reason = body["error"]["errors"][0]["reason"]
            .as_str()
            .map(|s| s.to_string());

        if status == 403 && reason.as_deref() == Some("quotaExceeded") {
            return Err(YouTubeApiError {
                status: 403,
                message: "Quota exceeded".to_string(),
                reason: Some("quotaExceeded".to_string()),
            });
        }

        return Err(YouTubeApiError {
            status,
            message: format!("YouTube API error: {}", status),
            reason,
        });
    }

    res.json().await.map_err(|e| YouTubeApiError {
        status: 0,
        message: e.to_string(),
        reason: None,
    })
}

pub async fn with_retry<F, Fut, T>(quota: &Arc<QuotaGate>, f: F) -> Result<T, YouTubeApiError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, YouTubeApiError>>,
{
    const MAX_RETRIES: u32 = 3;

    for attempt in 0..MAX_RETRIES {
        if quota.is_blocked() {
            return Err(YouTubeApiError {
                status: 403,
                message: "Quota exceeded".to_string(),
                reason: Some("quotaExceeded".to_string()),
            });
        }

        match f().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if e.reason.as_deref() == Some("quotaExceeded") {
                    quota.block_until_reset();
                    return Err(e);
                }
                if attempt < MAX_RETRIES - 1 {
                    tokio::time::sleep(std::time::Duration::from_secs((attempt + 1) as u64))
                        .await;
                } else {
                    return Err(e);
                }
            }
        }
    }
    unreachable!()
}

/// Read-only lookups against the video platform. Every failure degrades to
/// "no result" so one broken channel never stops a polling pass.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn latest_video_id(&self, channel_id: &str) -> Option<String>;
    async fn video_snapshot(&self, video_id: &str) -> Option<VideoSnapshot>;
}

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    quota: Arc<QuotaGate>,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, api_key: String, quota: Arc<QuotaGate>) -> Self {
        Self {
            http,
            api_key,
            quota,
        }
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn latest_video_id(&self, channel_id: &str) -> Option<String> {
        if self.quota.is_blocked() {
            return None;
        }

        let playlist_id = match channels::fetch_uploads_playlist(
            &self.http,
            &self.quota,
            &self.api_key,
            channel_id,
        )
        .await
        {
            Ok(Some(id)) => id,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(
                    "[youtube] Error resolving uploads playlist for {}: {}",
                    channel_id,
                    e
                );
                return None;
            }
        };

        match playlist_items::fetch_latest_video_id(
            &self.http,
            &self.quota,
            &self.api_key,
            &playlist_id,
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    "[youtube] Error fetching latest upload for {}: {}",
                    channel_id,
                    e
                );
                None
            }
        }
    }

    async fn video_snapshot(&self, video_id: &str) -> Option<VideoSnapshot> {
        if self.quota.is_blocked() {
            return None;
        }

        match videos::fetch_video_snapshot(&self.http, &self.quota, &self.api_key, video_id).await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("[youtube] Error fetching video {}: {}", video_id, e);
                None
            }
        }
    }
}
