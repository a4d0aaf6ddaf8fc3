use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::Result;

/// One queued local-storage write.
#[derive(Debug, Clone)]
pub struct StorageWrite {
    pub key: String,
    pub value: String,
}

/// Open (creating if needed) the SQLite file backing local storage and run migrations.
pub async fn open_pool(path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Local storage ready at {path}");
    Ok(pool)
}

/// Every persisted item, for hydrating a `MemoryStorage` at startup.
pub async fn load_items(pool: &SqlitePool) -> Result<Vec<(String, String)>> {
    let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM local_storage")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Receives writes from `MemoryStorage` and upserts them into SQLite.
/// Runs as a dedicated background task so storage never blocks a caller.
pub struct StorageWriter {
    pool: SqlitePool,
    write_rx: mpsc::Receiver<StorageWrite>,
}

impl StorageWriter {
    pub fn new(pool: SqlitePool, write_rx: mpsc::Receiver<StorageWrite>) -> Self {
        Self { pool, write_rx }
    }

    pub async fn run(mut self) {
        while let Some(write) = self.write_rx.recv().await {
            if let Err(e) = self.upsert(&write).await {
                error!(key = %write.key, "local storage write error: {e}");
            }
        }
    }

    async fn upsert(&self, w: &StorageWrite) -> Result<()> {
        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&w.key)
        .bind(&w.value)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, MemoryStorage};

    #[tokio::test]
    async fn writes_survive_a_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache.db");
        let path = path.to_str().expect("utf-8 path");

        let pool = open_pool(path).await.expect("open");
        let (tx, rx) = mpsc::channel(16);
        let writer = tokio::spawn(StorageWriter::new(pool.clone(), rx).run());

        let storage = MemoryStorage::with_write_behind(tx);
        storage.set_item("k", "[1,2,3]".to_string()).unwrap();
        storage.set_item("k:time", "1000".to_string()).unwrap();
        storage.set_item("k:time", "2000".to_string()).unwrap();
        drop(storage);
        writer.await.expect("writer task");
        pool.close().await;

        let pool = open_pool(path).await.expect("reopen");
        let mut items = load_items(&pool).await.expect("load");
        items.sort();
        assert_eq!(
            items,
            vec![
                ("k".to_string(), "[1,2,3]".to_string()),
                ("k:time".to_string(), "2000".to_string()),
            ]
        );

        let restored = MemoryStorage::new();
        restored.hydrate(items);
        assert_eq!(restored.get_item("k:time").unwrap().as_deref(), Some("2000"));
    }
}
