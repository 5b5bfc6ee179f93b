use crate::discord::{build_new_video_embed, build_scheduled_video_embed, Messenger};
use crate::subscriptions::{self, LatestVideo};
use crate::youtube::videos::VideoSnapshot;
use crate::youtube::VideoSource;
use rusqlite::Connection;
use std::sync::Mutex;

/// One full pass for one subscription. Each stage short-circuits to "done"
/// on absence or failure so the remaining subscriptions of the tick are
/// unaffected.
pub async fn process_subscription<V, M>(
    db: &Mutex<Connection>,
    video_source: &V,
    messenger: &M,
    guild_id: &str,
    youtube_channel_id: &str,
) where
    V: VideoSource + ?Sized,
    M: Messenger + ?Sized,
{
    let Some(video_id) = video_source.latest_video_id(youtube_channel_id).await else {
        return;
    };
    let Some(snapshot) = video_source.video_snapshot(&video_id).await else {
        return;
    };

    // Reload after the network round-trips: the record may have been
    // unsubscribed in the meantime.
    let sub = {
        let conn = db.lock().unwrap();
        match subscriptions::find_one(&conn, guild_id, youtube_channel_id) {
            Ok(sub) => sub,
            Err(e) => {
                tracing::error!(
                    "[notifier] DB error reloading {}/{}: {}",
                    guild_id,
                    youtube_channel_id,
                    e
                );
                return;
            }
        }
    };
    let Some(sub) = sub else {
        return;
    };

    if !is_new_video(sub.latest_video.as_ref(), &snapshot) {
        return;
    }

    // Persist before sending: a crash or send failure after this point must
    // not re-notify the same video on the next pass.
    let advanced = {
        let conn = db.lock().unwrap();
        let prev_url = sub.latest_video.as_ref().map(|v| v.url.as_str());
        match subscriptions::advance_latest(
            &conn,
            guild_id,
            youtube_channel_id,
            prev_url,
            &snapshot.url,
            &snapshot.published_at,
        ) {
            Ok(won) => won,
            Err(e) => {
                tracing::error!(
                    "[notifier] DB error advancing {}/{}: {}",
                    guild_id,
                    youtube_channel_id,
                    e
                );
                return;
            }
        }
    };
    if !advanced {
        // Another in-flight pass claimed this video first.
        return;
    }

    let destination = messenger
        .resolve_destination(guild_id, &sub.notify_channel_id)
        .await;
    let Some(destination) = destination else {
        tracing::warn!(
            "[notifier] Destination {} gone, removing subscription {}/{}",
            sub.notify_channel_id,
            guild_id,
            youtube_channel_id
        );
        let conn = db.lock().unwrap();
        if let Err(e) = subscriptions::unsubscribe(&conn, guild_id, youtube_channel_id) {
            tracing::error!(
                "[notifier] DB error pruning {}/{}: {}",
                guild_id,
                youtube_channel_id,
                e
            );
        }
        return;
    };

    if let Some(ref start_time) = snapshot.scheduled_start_time {
        let first_announcement = {
            let conn = db.lock().unwrap();
            match subscriptions::mark_scheduled(
                &conn,
                guild_id,
                youtube_channel_id,
                &snapshot.url,
                &snapshot.published_at,
                start_time,
            ) {
                Ok(first) => first,
                Err(e) => {
                    tracing::error!(
                        "[notifier] DB error tracking scheduled video for {}/{}: {}",
                        guild_id,
                        youtube_channel_id,
                        e
                    );
                    return;
                }
            }
        };
        if first_announcement {
            messenger
                .send_embed(&destination, build_scheduled_video_embed(&snapshot, start_time))
                .await;
        }
    } else {
        messenger
            .send_embed(&destination, build_new_video_embed(&snapshot))
            .await;
    }
}

/// A fetched video is notification-worthy when nothing was notified yet, or
/// when it is a different video with a strictly later publish time. Equal or
/// earlier timestamps are ignored even for a different url, so a stale or
/// reordered API response cannot roll the snapshot backwards.
fn is_new_video(stored: Option<&LatestVideo>, snapshot: &VideoSnapshot) -> bool {
    match stored {
        None => true,
        Some(latest) => {
            snapshot.url != latest.url
                && published_after(&snapshot.published_at, &latest.published_at)
        }
    }
}

fn published_after(candidate: &str, stored: &str) -> bool {
    match (
        chrono::DateTime::parse_from_rfc3339(candidate),
        chrono::DateTime::parse_from_rfc3339(stored),
    ) {
        (Ok(candidate), Ok(stored)) => candidate > stored,
        _ => false,
    }
}
