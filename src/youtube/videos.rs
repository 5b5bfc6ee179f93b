use crate::quota::QuotaGate;
use crate::youtube::{with_retry, youtube_get, YouTubeApiError, YOUTUBE_API_BASE};
use serde_json::Value;
use std::sync::Arc;

/// Fresh metadata for one video, produced each polling pass and never mutated.
#[derive(Debug, Clone)]
pub struct VideoSnapshot {
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: Option<String>,
    pub url: String,
    pub published_at: String,
    pub scheduled_start_time: Option<String>,
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Fetches snippet metadata; for an upcoming broadcast a second lookup fills
/// the scheduled start time. Ok(None) when the video is gone or the snippet
/// shape is incomplete. A failed live-details lookup degrades the video to a
/// plain snapshot instead of dropping it.
pub async fn fetch_video_snapshot(
    http: &reqwest::Client,
    quota: &Arc<QuotaGate>,
    api_key: &str,
    video_id: &str,
) -> Result<Option<VideoSnapshot>, YouTubeApiError> {
    let url = format!(
        "{}/videos?part=snippet&id={}&key={}",
        YOUTUBE_API_BASE, video_id, api_key
    );

    let http_client = http.clone();
    let data = with_retry(quota, || {
        let h = http_client.clone();
        let u = url.clone();
        async move { youtube_get(&h, &u).await }
    })
    .await?;

    let mut snapshot = match parse_snapshot(video_id, &data) {
        Some(s) => s,
        None => return Ok(None),
    };

    if is_upcoming(&data) {
        let url = format!(
            "{}/videos?part=liveStreamingDetails&id={}&key={}",
            YOUTUBE_API_BASE, video_id, api_key
        );
        let h = http.clone();
        match with_retry(quota, || {
            let h = h.clone();
            let u = url.clone();
            async move { youtube_get(&h, &u).await }
        })
        .await
        {
            Ok(live) => snapshot.scheduled_start_time = parse_scheduled_start(&live),
            Err(e) => {
                tracing::warn!(
                    "[youtube] Live details lookup failed for {}: {}",
                    video_id,
                    e
                );
            }
        }
    }

    Ok(Some(snapshot))
}

fn parse_snapshot(video_id: &str, data: &Value) -> Option<VideoSnapshot> {
    let snippet = &data["items"][0]["snippet"];
    if snippet.is_null() {
        return None;
    }

    Some(VideoSnapshot {
        title: snippet["title"].as_str()?.to_string(),
        channel_title: snippet["channelTitle"].as_str()?.to_string(),
        thumbnail_url: snippet["thumbnails"]["high"]["url"]
            .as_str()
            .or_else(|| snippet["thumbnails"]["default"]["url"].as_str())
            .map(|s| s.to_string()),
        url: watch_url(video_id),
        published_at: snippet["publishedAt"].as_str()?.to_string(),
        scheduled_start_time: None,
    })
}

fn is_upcoming(data: &Value) -> bool {
    data["items"][0]["snippet"]["liveBroadcastContent"].as_str() == Some("upcoming")
}

fn parse_scheduled_start(data: &Value) -> Option<String> {
    data["items"][0]["liveStreamingDetails"]["scheduledStartTime"]
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snippet_payload() -> Value {
        json!({
            "items": [{
                "snippet": {
                    "title": "Test Video",
                    "channelTitle": "Test Channel",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/vi/vid001/default.jpg" },
                        "high": { "url": "https://i.ytimg.com/vi/vid001/hqdefault.jpg" }
                    },
                    "publishedAt": "2024-01-15T12:00:00Z",
                    "liveBroadcastContent": "none"
                }
            }]
        })
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc123"), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_parse_snapshot() {
        let snapshot = parse_snapshot("vid001", &snippet_payload()).unwrap();
        assert_eq!(snapshot.title, "Test Video");
        assert_eq!(snapshot.channel_title, "Test Channel");
        assert_eq!(
            snapshot.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/vid001/hqdefault.jpg")
        );
        assert_eq!(snapshot.url, "https://www.youtube.com/watch?v=vid001");
        assert_eq!(snapshot.published_at, "2024-01-15T12:00:00Z");
        assert!(snapshot.scheduled_start_time.is_none());
    }

    #[test]
    fn test_parse_snapshot_thumbnail_fallback() {
        let mut data = snippet_payload();
        data["items"][0]["snippet"]["thumbnails"]
            .as_object_mut()
            .unwrap()
            .remove("high");
        let snapshot = parse_snapshot("vid001", &data).unwrap();
        assert_eq!(
            snapshot.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/vid001/default.jpg")
        );
    }

    #[test]
    fn test_parse_snapshot_no_items() {
        let data = json!({ "items": [] });
        assert!(parse_snapshot("vid001", &data).is_none());
    }

    #[test]
    fn test_parse_snapshot_missing_title() {
        let mut data = snippet_payload();
        data["items"][0]["snippet"]
            .as_object_mut()
            .unwrap()
            .remove("title");
        assert!(parse_snapshot("vid001", &data).is_none());
    }

    #[test]
    fn test_is_upcoming() {
        let mut data = snippet_payload();
        assert!(!is_upcoming(&data));
        data["items"][0]["snippet"]["liveBroadcastContent"] = json!("upcoming");
        assert!(is_upcoming(&data));
    }

    #[test]
    fn test_parse_scheduled_start() {
        let data = json!({
            "items": [{
                "liveStreamingDetails": { "scheduledStartTime": "2024-02-01T18:00:00Z" }
            }]
        });
        assert_eq!(
            parse_scheduled_start(&data),
            Some("2024-02-01T18:00:00Z".to_string())
        );
    }

    #[test]
    fn test_parse_scheduled_start_missing() {
        let data = json!({ "items": [{}] });
        assert_eq!(parse_scheduled_start(&data), None);
    }
}
