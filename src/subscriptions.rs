use rusqlite::Connection;

#[derive(Debug, Clone)]
pub struct Subscription {
    pub guild_id: String,
    pub youtube_channel_id: String,
    pub notify_channel_id: String,
    pub latest_video: Option<LatestVideo>,
}

/// The last video already notified for a subscription.
#[derive(Debug, Clone)]
pub struct LatestVideo {
    pub url: String,
    pub published_at: String,
}

#[derive(Debug, Clone)]
pub struct ScheduledVideo {
    pub url: String,
    pub published_at: String,
    pub scheduled_start_time: String,
}

fn row_to_subscription(row: &rusqlite::Row) -> rusqlite::Result<Subscription> {
    let url: Option<String> = row.get(3)?;
    let published_at: Option<String> = row.get(4)?;
    Ok(Subscription {
        guild_id: row.get(0)?,
        youtube_channel_id: row.get(1)?,
        notify_channel_id: row.get(2)?,
        latest_video: match (url, published_at) {
            (Some(url), Some(published_at)) => Some(LatestVideo { url, published_at }),
            _ => None,
        },
    })
}

pub fn find_all(conn: &Connection) -> rusqlite::Result<Vec<Subscription>> {
    let mut stmt = conn.prepare(
        "SELECT guild_id, youtube_channel_id, notify_channel_id,
                latest_video_url, latest_video_published_at
         FROM subscriptions",
    )?;
    let rows = stmt.query_map([], |row| row_to_subscription(row))?;
    rows.collect()
}

pub fn find_one(
    conn: &Connection,
    guild_id: &str,
    youtube_channel_id: &str,
) -> rusqlite::Result<Option<Subscription>> {
    let mut stmt = conn.prepare(
        "SELECT guild_id, youtube_channel_id, notify_channel_id,
                latest_video_url, latest_video_published_at
         FROM subscriptions
         WHERE guild_id = ?1 AND youtube_channel_id = ?2",
    )?;
    let mut rows = stmt.query_map(
        rusqlite::params![guild_id, youtube_channel_id],
        |row| row_to_subscription(row),
    )?;
    rows.next().transpose()
}

/// Returns false without mutation when the (guild, channel) pair already exists.
pub fn subscribe(
    conn: &Connection,
    guild_id: &str,
    youtube_channel_id: &str,
    notify_channel_id: &str,
) -> rusqlite::Result<bool> {
    let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let changed = conn.execute(
        "INSERT INTO subscriptions (guild_id, youtube_channel_id, notify_channel_id, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (guild_id, youtube_channel_id) DO NOTHING",
        rusqlite::params![guild_id, youtube_channel_id, notify_channel_id, now],
    )?;
    Ok(changed == 1)
}

pub fn unsubscribe(
    conn: &Connection,
    guild_id: &str,
    youtube_channel_id: &str,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "DELETE FROM subscriptions WHERE guild_id = ?1 AND youtube_channel_id = ?2",
        rusqlite::params![guild_id, youtube_channel_id],
    )?;
    Ok(changed == 1)
}

/// Compare-and-set on the previously observed url: the write only lands if
/// the stored url is still `prev_url`, so two in-flight workers cannot both
/// claim the same video as new. Returns whether this caller won.
pub fn advance_latest(
    conn: &Connection,
    guild_id: &str,
    youtube_channel_id: &str,
    prev_url: Option<&str>,
    url: &str,
    published_at: &str,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE subscriptions
         SET latest_video_url = ?4, latest_video_published_at = ?5
         WHERE guild_id = ?1 AND youtube_channel_id = ?2 AND latest_video_url IS ?3",
        rusqlite::params![guild_id, youtube_channel_id, prev_url, url, published_at],
    )?;
    Ok(changed == 1)
}

/// Records a video as announced-as-scheduled. Returns true only on the first
/// call per url; repeats are ignored by the primary key.
pub fn mark_scheduled(
    conn: &Connection,
    guild_id: &str,
    youtube_channel_id: &str,
    url: &str,
    published_at: &str,
    scheduled_start_time: &str,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO scheduled_videos
         (guild_id, youtube_channel_id, url, published_at, scheduled_start_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![guild_id, youtube_channel_id, url, published_at, scheduled_start_time],
    )?;
    Ok(changed == 1)
}

pub fn scheduled_videos(
    conn: &Connection,
    guild_id: &str,
    youtube_channel_id: &str,
) -> rusqlite::Result<Vec<ScheduledVideo>> {
    let mut stmt = conn.prepare(
        "SELECT url, published_at, scheduled_start_time
         FROM scheduled_videos
         WHERE guild_id = ?1 AND youtube_channel_id = ?2
         ORDER BY published_at",
    )?;
    let rows = stmt.query_map(rusqlite::params![guild_id, youtube_channel_id], |row| {
        Ok(ScheduledVideo {
            url: row.get(0)?,
            published_at: row.get(1)?,
            scheduled_start_time: row.get(2)?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_subscribe_new() {
        let conn = db::open_memory();
        assert!(subscribe(&conn, "g1", "UC1", "c1").unwrap());

        let sub = find_one(&conn, "g1", "UC1").unwrap().unwrap();
        assert_eq!(sub.notify_channel_id, "c1");
        assert!(sub.latest_video.is_none());
    }

    #[test]
    fn test_subscribe_duplicate_returns_false() {
        let conn = db::open_memory();
        assert!(subscribe(&conn, "g1", "UC1", "c1").unwrap());
        assert!(!subscribe(&conn, "g1", "UC1", "c2").unwrap());

        // The existing record is untouched
        let sub = find_one(&conn, "g1", "UC1").unwrap().unwrap();
        assert_eq!(sub.notify_channel_id, "c1");
    }

    #[test]
    fn test_same_channel_different_guilds() {
        let conn = db::open_memory();
        assert!(subscribe(&conn, "g1", "UC1", "c1").unwrap());
        assert!(subscribe(&conn, "g2", "UC1", "c9").unwrap());
        assert_eq!(find_all(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_unsubscribe_missing_returns_false() {
        let conn = db::open_memory();
        assert!(!unsubscribe(&conn, "g1", "UC1").unwrap());
    }

    #[test]
    fn test_unsubscribe_existing() {
        let conn = db::open_memory();
        subscribe(&conn, "g1", "UC1", "c1").unwrap();
        assert!(unsubscribe(&conn, "g1", "UC1").unwrap());
        assert!(find_one(&conn, "g1", "UC1").unwrap().is_none());
    }

    #[test]
    fn test_advance_latest_from_empty() {
        let conn = db::open_memory();
        subscribe(&conn, "g1", "UC1", "c1").unwrap();

        let won = advance_latest(
            &conn,
            "g1",
            "UC1",
            None,
            "https://www.youtube.com/watch?v=a",
            "2024-01-01T00:00:00Z",
        )
        .unwrap();
        assert!(won);

        let sub = find_one(&conn, "g1", "UC1").unwrap().unwrap();
        let latest = sub.latest_video.unwrap();
        assert_eq!(latest.url, "https://www.youtube.com/watch?v=a");
        assert_eq!(latest.published_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_advance_latest_stale_prev_url_loses() {
        let conn = db::open_memory();
        subscribe(&conn, "g1", "UC1", "c1").unwrap();
        advance_latest(&conn, "g1", "UC1", None, "url-a", "2024-01-01T00:00:00Z").unwrap();

        // A worker that still believes the record is empty must not overwrite
        let won =
            advance_latest(&conn, "g1", "UC1", None, "url-b", "2024-01-02T00:00:00Z").unwrap();
        assert!(!won);

        let sub = find_one(&conn, "g1", "UC1").unwrap().unwrap();
        assert_eq!(sub.latest_video.unwrap().url, "url-a");
    }

    #[test]
    fn test_advance_latest_with_matching_prev_url() {
        let conn = db::open_memory();
        subscribe(&conn, "g1", "UC1", "c1").unwrap();
        advance_latest(&conn, "g1", "UC1", None, "url-a", "2024-01-01T00:00:00Z").unwrap();

        let won = advance_latest(
            &conn,
            "g1",
            "UC1",
            Some("url-a"),
            "url-b",
            "2024-01-02T00:00:00Z",
        )
        .unwrap();
        assert!(won);
        let sub = find_one(&conn, "g1", "UC1").unwrap().unwrap();
        assert_eq!(sub.latest_video.unwrap().url, "url-b");
    }

    #[test]
    fn test_advance_latest_missing_subscription() {
        let conn = db::open_memory();
        let won = advance_latest(&conn, "g1", "UC1", None, "url-a", "2024-01-01T00:00:00Z").unwrap();
        assert!(!won);
    }

    #[test]
    fn test_mark_scheduled_once_per_url() {
        let conn = db::open_memory();
        subscribe(&conn, "g1", "UC1", "c1").unwrap();

        let first = mark_scheduled(
            &conn,
            "g1",
            "UC1",
            "url-b",
            "2024-01-02T00:00:00Z",
            "2024-01-03T18:00:00Z",
        )
        .unwrap();
        assert!(first);

        let second = mark_scheduled(
            &conn,
            "g1",
            "UC1",
            "url-b",
            "2024-01-02T00:00:00Z",
            "2024-01-03T18:00:00Z",
        )
        .unwrap();
        assert!(!second);

        let scheduled = scheduled_videos(&conn, "g1", "UC1").unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].scheduled_start_time, "2024-01-03T18:00:00Z");
    }

    #[test]
    fn test_scheduled_videos_removed_with_subscription() {
        let conn = db::open_memory();
        subscribe(&conn, "g1", "UC1", "c1").unwrap();
        mark_scheduled(
            &conn,
            "g1",
            "UC1",
            "url-b",
            "2024-01-02T00:00:00Z",
            "2024-01-03T18:00:00Z",
        )
        .unwrap();

        unsubscribe(&conn, "g1", "UC1").unwrap();
        assert!(scheduled_videos(&conn, "g1", "UC1").unwrap().is_empty());
    }
}
