use crate::quota::QuotaGate;
use crate::youtube::{with_retry, youtube_get, YouTubeApiError, YOUTUBE_API_BASE};
use serde_json::Value;
use std::sync::Arc;

/// Resolves the id of the channel's canonical uploads playlist.
/// Ok(None) when the channel does not exist or has no uploads playlist.
pub async fn fetch_uploads_playlist(
    http: &reqwest::Client,
    quota: &Arc<QuotaGate>,
    api_key: &str,
    channel_id: &str,
) -> Result<Option<String>, YouTubeApiError> {
    let url = format!(
        "{}/channels?part=contentDetails&id={}&key={}",
        YOUTUBE_API_BASE, channel_id, api_key
    );

    let http = http.clone();
    let data = with_retry(quota, || {
        let h = http.clone();
        let u = url.clone();
        async move { youtube_get(&h, &u).await }
    })
    .await?;

    Ok(parse_uploads_playlist(&data))
}

fn parse_uploads_playlist(data: &Value) -> Option<String> {
    data["items"][0]["contentDetails"]["relatedPlaylists"]["uploads"]
        .as_str()
        .map(|s| s.to_string())
}
