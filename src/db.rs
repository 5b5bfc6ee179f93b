use rusqlite::Connection;

pub fn open(path: &str) -> Connection {
    tracing::info!("Database: {}", path);
    let conn = Connection::open(path).expect("Failed to open database");

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
    .expect("Failed to set PRAGMA");

    create_tables(&conn);

    conn
}

#[cfg(test)]
pub fn open_memory() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("Failed to set PRAGMA");

    create_tables(&conn);

    conn
}

fn create_tables(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            guild_id TEXT NOT NULL,
            youtube_channel_id TEXT NOT NULL,
            notify_channel_id TEXT NOT NULL,
            latest_video_url TEXT,
            latest_video_published_at TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (guild_id, youtube_channel_id)
        );

        CREATE TABLE IF NOT EXISTS scheduled_videos (
            guild_id TEXT NOT NULL,
            youtube_channel_id TEXT NOT NULL,
            url TEXT NOT NULL,
            published_at TEXT NOT NULL,
            scheduled_start_time TEXT NOT NULL,
            PRIMARY KEY (guild_id, youtube_channel_id, url),
            FOREIGN KEY (guild_id, youtube_channel_id)
                REFERENCES subscriptions(guild_id, youtube_channel_id)
                ON DELETE CASCADE
        );",
    )
    .expect("Failed to create tables");
}
