use crate::quota::QuotaGate;
use crate::youtube::{with_retry, youtube_get, YouTubeApiError, YOUTUBE_API_BASE};
use serde_json::Value;
use std::sync::Arc;

/// The most recent item of a playlist. Ok(None) for an empty playlist.
pub async fn fetch_latest_video_id(
    http: &reqwest::Client,
    quota: &Arc<QuotaGate>,
    api_key: &str,
    playlist_id: &str,
) -> Result<Option<String>, YouTubeApiError> {
    let url = format!(
        "{}/playlistItems?part=contentDetails&playlistId={}&maxResults=1&key={}",
        YOUTUBE_API_BASE, playlist_id, api_key
    );

    let http = http.clone();
    let data = with_retry(quota, || {
        let h = http.clone();
        let u = url.clone();
        async move { youtube_get(&h, &u).await }
    })
    .await?;

    Ok(parse_latest_video_id(&data))
}

fn parse_latest_video_id(data: &Value) -> Option<String> {
    data["items"][0]["contentDetails"]["videoId"]
        .as_str()
        .map(|s| s.to_string())
}
