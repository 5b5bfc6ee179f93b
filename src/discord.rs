use crate::youtube::videos::VideoSnapshot;
use async_trait::async_trait;
use serde_json::{json, Value};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const COLOR_NEW_VIDEO: u32 = 0xd93025;
const COLOR_SCHEDULED: u32 = 0x5865f2;

/// Destination resolution and message delivery for a guild. Send failures
/// are reported to the caller, never retried here.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Some(destination) when the channel exists and belongs to the guild.
    async fn resolve_destination(&self, guild_id: &str, channel_id: &str) -> Option<String>;
    async fn send_embed(&self, channel_id: &str, embed: Value) -> bool;
}

pub struct DiscordApi {
    http: reqwest::Client,
    bot_token: String,
}

impl DiscordApi {
    pub fn new(http: reqwest::Client, bot_token: String) -> Self {
        Self { http, bot_token }
    }
}

#[async_trait]
impl Messenger for DiscordApi {
    async fn resolve_destination(&self, guild_id: &str, channel_id: &str) -> Option<String> {
        let url = format!("{}/channels/{}", DISCORD_API_BASE, channel_id);
        let res = match self
            .http
            .get(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!("[discord] Channel lookup failed for {}: {:?}", channel_id, e);
                return None;
            }
        };

        if !res.status().is_success() {
            tracing::warn!(
                "[discord] Channel {} not accessible: {}",
                channel_id,
                res.status()
            );
            return None;
        }

        let channel: Value = res.json().await.ok()?;
        if channel["guild_id"].as_str() != Some(guild_id) {
            tracing::warn!(
                "[discord] Channel {} does not belong to guild {}",
                channel_id,
                guild_id
            );
            return None;
        }

        Some(channel_id.to_string())
    }

    async fn send_embed(&self, channel_id: &str, embed: Value) -> bool {
        let url = format!("{}/channels/{}/messages", DISCORD_API_BASE, channel_id);
        let body = json!({ "embeds": [embed] });
        match self
            .http
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&body)
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => true,
            Ok(res) => {
                tracing::error!(
                    "[discord] Failed to send to {}: {}",
                    channel_id,
                    res.status()
                );
                false
            }
            Err(e) => {
                tracing::error!("[discord] Failed to send to {}: {:?}", channel_id, e);
                false
            }
        }
    }
}

pub(crate) fn build_new_video_embed(video: &VideoSnapshot) -> Value {
    let mut embed = json!({
        "author": { "name": video.channel_title },
        "title": video.title,
        "url": video.url,
        "color": COLOR_NEW_VIDEO,
        "timestamp": video.published_at,
    });
    if let Some(ref thumb) = video.thumbnail_url {
        embed["image"] = json!({ "url": thumb });
    }
    embed
}

pub(crate) fn build_scheduled_video_embed(video: &VideoSnapshot, start_time: &str) -> Value {
    let mut embed = json!({
        "author": { "name": video.channel_title },
        "title": video.title,
        "url": video.url,
        "color": COLOR_SCHEDULED,
        "timestamp": video.published_at,
        "fields": [{
            "name": "Scheduled for",
            "value": discord_timestamp(start_time),
        }],
    });
    if let Some(ref thumb) = video.thumbnail_url {
        embed["image"] = json!({ "url": thumb });
    }
    embed
}

// Discord renders <t:unix:F> in the reader's local time zone.
fn discord_timestamp(rfc3339: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(rfc3339) {
        Ok(dt) => format!("<t:{}:F>", dt.timestamp()),
        Err(_) => rfc3339.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> VideoSnapshot {
        VideoSnapshot {
            title: "Test Video".to_string(),
            channel_title: "Test Channel".to_string(),
            thumbnail_url: Some("https://i.ytimg.com/vi/vid001/hqdefault.jpg".to_string()),
            url: "https://www.youtube.com/watch?v=vid001".to_string(),
            published_at: "2024-01-15T12:00:00Z".to_string(),
            scheduled_start_time: None,
        }
    }

    #[test]
    fn test_new_video_embed_structure() {
        let embed = build_new_video_embed(&snapshot());

        assert_eq!(embed["author"]["name"], "Test Channel");
        assert_eq!(embed["title"], "Test Video");
        assert_eq!(embed["url"], "https://www.youtube.com/watch?v=vid001");
        assert_eq!(embed["color"], COLOR_NEW_VIDEO);
        assert_eq!(
            embed["image"]["url"],
            "https://i.ytimg.com/vi/vid001/hqdefault.jpg"
        );
        assert_eq!(embed["timestamp"], "2024-01-15T12:00:00Z");
        assert!(embed.get("fields").is_none());
    }

    #[test]
    fn test_new_video_embed_without_thumbnail() {
        let mut video = snapshot();
        video.thumbnail_url = None;
        let embed = build_new_video_embed(&video);
        assert!(embed.get("image").is_none());
    }

    #[test]
    fn test_scheduled_video_embed_has_start_time_field() {
        let embed = build_scheduled_video_embed(&snapshot(), "2024-02-01T18:00:00Z");

        assert_eq!(embed["color"], COLOR_SCHEDULED);
        assert_eq!(embed["fields"][0]["name"], "Scheduled for");
        assert_eq!(embed["fields"][0]["value"], "<t:1706810400:F>");
    }

    #[test]
    fn test_discord_timestamp_invalid_falls_back_to_raw() {
        assert_eq!(discord_timestamp("not-a-date"), "not-a-date");
    }
}
