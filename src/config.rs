use std::env;

const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub youtube_api_key: String,
    pub discord_bot_token: String,
    pub poll_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let db_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./notify.db".to_string());

        let youtube_api_key = env::var("YOUTUBE_API_KEY").unwrap_or_default();
        let discord_bot_token = env::var("DISCORD_BOT_TOKEN").unwrap_or_default();

        let poll_interval_ms = env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        if youtube_api_key.is_empty() {
            tracing::warn!("YOUTUBE_API_KEY not set. Video lookups will not work.");
        }
        if discord_bot_token.is_empty() {
            tracing::warn!("DISCORD_BOT_TOKEN not set. Notifications will not be delivered.");
        }

        Self {
            port,
            db_path,
            youtube_api_key,
            discord_bot_token,
            poll_interval_ms,
        }
    }
}
