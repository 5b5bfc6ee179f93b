mod config;
mod db;
mod discord;
mod error;
mod notifier;
mod quota;
mod routes;
mod state;
mod subscriptions;
mod youtube;

use config::Config;
use state::AppState;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let conn = db::open(&config.db_path);
    let http = reqwest::Client::new();
    let quota = Arc::new(quota::QuotaGate::new());

    let youtube = Arc::new(youtube::YouTubeClient::new(
        http.clone(),
        config.youtube_api_key.clone(),
        quota,
    ));
    let discord = Arc::new(discord::DiscordApi::new(
        http,
        config.discord_bot_token.clone(),
    ));

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        youtube,
        discord,
    };

    notifier::start_notifier(state.clone());

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await.expect("Server error");
}
