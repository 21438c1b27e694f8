//! store.rs — rooms 表：一房一列，以 name 為主鍵
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;

#[cfg(test)]
use crate::error::malformed;
use crate::{
    error::AppResult,
    state::{ListenerCount, RoomSnapshot},
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS rooms (
    name              TEXT PRIMARY KEY,
    participant_count INTEGER NOT NULL DEFAULT 0,
    listener_count    INTEGER NOT NULL DEFAULT 0,
    media_type        TEXT    NOT NULL,
    updated_at        TEXT    NOT NULL
)
"#;

// ?3 為 NULL（聽眾數未知）時保留舊值
const UPSERT: &str = r#"
INSERT INTO rooms (name, participant_count, listener_count, media_type, updated_at)
VALUES (?1, ?2, COALESCE(?3, 0), ?4, ?5)
ON CONFLICT(name) DO UPDATE SET
    participant_count = excluded.participant_count,
    listener_count    = COALESCE(?3, rooms.listener_count),
    media_type        = excluded.media_type,
    updated_at        = excluded.updated_at
"#;

/// `sqlite::memory:`, `sqlite://:memory:` or any url with `mode=memory`.
fn is_memory(url: &str) -> bool {
    if url.contains(":memory:") {
        return true;
    }
    url.split_once('?')
        .map(|(_, query)| query.split('&').any(|kv| kv == "mode=memory"))
        .unwrap_or(false)
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub name:              String,
    pub participant_count: u32,
    pub listener_count:    u32,
    pub media_type:        String,
    pub updated_at:        String,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens the pool and makes sure the table exists.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // in-memory 資料庫每條連線各一份，只能開一條
        let pool = if is_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            SqlitePoolOptions::new().max_connections(5).connect_with(opts).await?
        };

        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn upsert(&self, room: &RoomSnapshot, listeners: ListenerCount) -> AppResult<()> {
        sqlx::query(UPSERT)
            .bind(&room.name)
            .bind(i64::from(room.participant_count))
            .bind(listeners.known().map(i64::from))
            .bind(room.media_type.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/* 讀回來只在測試用 */
#[cfg(test)]
impl Store {
    pub async fn get(&self, name: &str) -> AppResult<Option<RoomRecord>> {
        let row: Option<(String, i64, i64, String, String)> = sqlx::query_as(
            "SELECT name, participant_count, listener_count, media_type, updated_at FROM rooms WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(name, p, l, media_type, updated_at)| -> AppResult<RoomRecord> {
            Ok(RoomRecord {
                name,
                participant_count: u32::try_from(p).map_err(malformed)?,
                listener_count:    u32::try_from(l).map_err(malformed)?,
                media_type,
                updated_at,
            })
        })
        .transpose()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM rooms").fetch_one(&self.pool).await?)
    }
}
