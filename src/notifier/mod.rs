pub mod engine;
pub mod inflight;

use crate::state::AppState;
use crate::subscriptions;
use inflight::InFlight;
use std::sync::Arc;
use std::time::Duration;

pub fn start_notifier(state: AppState) {
    let inflight = Arc::new(InFlight::new());

    tokio::spawn(async move {
        tracing::info!(
            "[notifier] Polling every {}ms",
            state.config.poll_interval_ms
        );
        let mut interval =
            tokio::time::interval(Duration::from_millis(state.config.poll_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let state = state.clone();
            let inflight = inflight.clone();
            // The pass runs on its own task so a slow channel never delays the
            // timer; the in-flight guard handles any overlap.
            tokio::spawn(async move {
                run_tick(&state, &inflight).await;
            });
        }
    });
}

async fn run_tick(state: &AppState, inflight: &InFlight) {
    let subs = {
        let conn = state.db.lock().unwrap();
        match subscriptions::find_all(&conn) {
            Ok(subs) => subs,
            Err(e) => {
                tracing::error!("[notifier] DB error loading subscriptions: {}", e);
                return;
            }
        }
    };

    for sub in subs {
        if !inflight.begin(&sub.guild_id, &sub.youtube_channel_id) {
            tracing::debug!(
                "[notifier] {}/{} still in flight, skipping",
                sub.guild_id,
                sub.youtube_channel_id
            );
            continue;
        }

        engine::process_subscription(
            &state.db,
            state.youtube.as_ref(),
            state.discord.as_ref(),
            &sub.guild_id,
            &sub.youtube_channel_id,
        )
        .await;

        inflight.end(&sub.guild_id, &sub.youtube_channel_id);
    }
}
