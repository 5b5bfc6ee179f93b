use crate::config::Config;
use crate::discord::DiscordApi;
use crate::youtube::YouTubeClient;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Config,
    pub youtube: Arc<YouTubeClient>,
    pub discord: Arc<DiscordApi>,
}
