use crate::error::AppError;
use crate::state::AppState;
use crate::subscriptions;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/subscriptions",
        get(list_subscriptions)
            .post(subscribe)
            .delete(unsubscribe),
    )
}

async fn list_subscriptions(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let rows = {
        let conn = state.db.lock().unwrap();
        let subs = subscriptions::find_all(&conn)?;
        subs.into_iter()
            .map(|sub| {
                let scheduled =
                    subscriptions::scheduled_videos(&conn, &sub.guild_id, &sub.youtube_channel_id)?;
                Ok(json!({
                    "guild_id": sub.guild_id,
                    "youtube_channel_id": sub.youtube_channel_id,
                    "notify_channel_id": sub.notify_channel_id,
                    "latest_video": sub.latest_video.map(|v| json!({
                        "url": v.url,
                        "published_at": v.published_at,
                    })),
                    "scheduled_videos": scheduled.into_iter().map(|v| json!({
                        "url": v.url,
                        "published_at": v.published_at,
                        "scheduled_start_time": v.scheduled_start_time,
                    })).collect::<Vec<_>>(),
                }))
            })
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
    };
    Ok(Json(Value::Array(rows)))
}

#[derive(Deserialize)]
struct SubscribeBody {
    guild_id: String,
    youtube_channel_id: String,
    notify_channel_id: String,
}

async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeBody>,
) -> Result<Json<Value>, AppError> {
    let created = {
        let conn = state.db.lock().unwrap();
        subscriptions::subscribe(
            &conn,
            &body.guild_id,
            &body.youtube_channel_id,
            &body.notify_channel_id,
        )?
    };
    if created {
        tracing::info!(
            "[subscriptions] {} subscribed to {}",
            body.guild_id,
            body.youtube_channel_id
        );
    }
    Ok(Json(json!({ "created": created })))
}

#[derive(Deserialize)]
struct UnsubscribeBody {
    guild_id: String,
    youtube_channel_id: String,
}

async fn unsubscribe(
    State(state): State<AppState>,
    Json(body): Json<UnsubscribeBody>,
) -> Result<Json<Value>, AppError> {
    let removed = {
        let conn = state.db.lock().unwrap();
        subscriptions::unsubscribe(&conn, &body.guild_id, &body.youtube_channel_id)?
    };
    if removed {
        tracing::info!(
            "[subscriptions] {} unsubscribed from {}",
            body.guild_id,
            body.youtube_channel_id
        );
    }
    Ok(Json(json!({ "removed": removed })))
}
