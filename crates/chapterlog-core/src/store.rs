use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::item::{ItemId, OwnerId, RawRecord};
use crate::{Error, Result};

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    owner_id TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id, seq);
"#;

/// One stored document as delivered in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: ItemId,
    pub data: Value,
}

/// Every document an owner has, in creation order
pub type Snapshot = Arc<Vec<Document>>;

/// Live view of one owner's documents.
///
/// Only the most recent snapshot is retained; intermediate ones may be
/// skipped. Dropping the subscription releases it.
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    /// The latest snapshot, marking it as seen.
    pub fn latest(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Whether a snapshot newer than the last one seen has arrived.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next snapshot. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    #[must_use]
    pub fn into_receiver(self) -> watch::Receiver<Snapshot> {
        self.rx
    }
}

/// Document persistence with live per-owner subscriptions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn subscribe(&self, owner: &str) -> Result<Subscription>;

    /// Store a new document and return its assigned id.
    async fn create(&self, owner: &str, payload: RawRecord) -> Result<ItemId>;

    /// Overwrite the top-level fields present in `payload`, keeping the rest.
    async fn replace(&self, owner: &str, id: &str, payload: RawRecord) -> Result<()>;

    async fn delete(&self, owner: &str, id: &str) -> Result<()>;
}

pub struct Storage {
    pool: Pool<Sqlite>,
    channels: Mutex<HashMap<OwnerId, watch::Sender<Snapshot>>>,
}

impl Storage {
    pub async fn open(path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{path}?mode=rwc"))
            .await?;

        Self::init(pool).await
    }

    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::init(pool).await
    }

    async fn init(pool: Pool<Sqlite>) -> Result<Self> {
        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self {
            pool,
            channels: Mutex::new(HashMap::new()),
        })
    }

    async fn load(&self, owner: &str) -> Result<Snapshot> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, data FROM documents
            WHERE owner_id = ?
            ORDER BY seq
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let documents = rows
            .into_iter()
            .map(|(id, data)| {
                let data = serde_json::from_str(&data).unwrap_or_else(|e| {
                    tracing::warn!(document = %id, "Unreadable document body: {}", e);
                    Value::Null
                });
                Document { id, data }
            })
            .collect();

        Ok(Arc::new(documents))
    }

    /// Push the owner's current state to its subscribers.
    ///
    /// The channel lock is held across the reload so snapshots go out in
    /// commit order.
    async fn publish(&self, owner: &str) -> Result<()> {
        let mut channels = self.channels.lock().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);

        if !channels.contains_key(owner) {
            return Ok(());
        }

        let snapshot = self.load(owner).await?;
        if let Some(tx) = channels.get(owner) {
            tx.send_replace(snapshot);
            tracing::debug!(owner, subscribers = tx.receiver_count(), "Published snapshot");
        }

        Ok(())
    }

    /// Publish after a committed write. The write stands even when the
    /// reload fails; subscribers catch up on the next successful publish.
    async fn publish_committed(&self, owner: &str) {
        if let Err(e) = self.publish(owner).await {
            tracing::warn!(owner, "Snapshot publish failed after commit: {}", e);
        }
    }

    #[cfg(test)]
    async fn channel_count(&self) -> usize {
        self.channels.lock().await.len()
    }
}

#[async_trait]
impl DocumentStore for Storage {
    async fn subscribe(&self, owner: &str) -> Result<Subscription> {
        let mut channels = self.channels.lock().await;

        let rx = match channels.get(owner) {
            Some(tx) if tx.receiver_count() > 0 => tx.subscribe(),
            _ => {
                let snapshot = self.load(owner).await?;
                let (tx, rx) = watch::channel(snapshot);
                channels.insert(owner.to_string(), tx);
                rx
            }
        };

        Ok(Subscription { rx })
    }

    async fn create(&self, owner: &str, payload: RawRecord) -> Result<ItemId> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(&payload)?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, owner_id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(owner)
        .bind(data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.publish_committed(owner).await;
        Ok(id)
    }

    async fn replace(&self, owner: &str, id: &str, payload: RawRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await?;

        let (existing,) = existing.ok_or_else(|| Error::ItemNotFound(id.to_string()))?;

        let mut merged = match serde_json::from_str::<Value>(&existing) {
            Ok(Value::Object(map)) => map,
            _ => RawRecord::new(),
        };
        merged.extend(payload);

        sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE id = ? AND owner_id = ?")
            .bind(serde_json::to_string(&merged)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.publish_committed(owner).await;
        Ok(())
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(id.to_string()));
        }

        self.publish_committed(owner).await;
        Ok(())
    }
}
