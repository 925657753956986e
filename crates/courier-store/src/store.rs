use std::path::PathBuf;

use chrono::{Local, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{
    ContentType, MessageHit, NewMessage, Session, StoreStats, StoredMessage,
};

const SCHEMA: &str = "
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS chat_sessions (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    model TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    message_count INTEGER NOT NULL DEFAULT 0,
    is_archived INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    content_type TEXT NOT NULL DEFAULT 'text',
    media_data TEXT,
    model TEXT,
    provider TEXT,
    file_name TEXT,
    file_size INTEGER,
    created_at TEXT NOT NULL,
    FOREIGN KEY (session_id) REFERENCES chat_sessions (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages(session_id);
CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON chat_sessions(updated_at DESC);
";

/// SQLite-backed session/message store. Every operation opens its own
/// connection and runs on the blocking pool; cross-process coordination is
/// left to SQLite itself.
#[derive(Debug, Clone)]
pub struct ChatStore {
    db_path: PathBuf,
}

impl ChatStore {
    pub async fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            db_path: db_path.into(),
        };
        store
            .run(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        info!(path = %store.db_path.display(), "chat store ready");
        Ok(store)
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            let conn = Connection::open(path)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            op(&conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("storage task failed: {e}")))?
    }

    // ── Sessions ──

    pub async fn create_session(
        &self,
        title: Option<String>,
        model: Option<String>,
    ) -> Result<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("对话 {}", Local::now().format("%Y-%m-%d %H:%M")));

        self.run(move |conn| {
            let now = now_rfc3339();
            conn.execute(
                "INSERT INTO chat_sessions (id, title, model, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, title, model, now, now],
            )?;
            read_session(conn, &id)?.ok_or(StoreError::SessionNotFound(id))
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let session_id = session_id.to_string();
        self.run(move |conn| read_session(conn, &session_id)).await
    }

    pub async fn list_sessions(
        &self,
        limit: i64,
        offset: i64,
        include_archived: bool,
    ) -> Result<Vec<Session>> {
        self.run(move |conn| {
            let sql = if include_archived {
                "SELECT id, title, model, created_at, updated_at, message_count, is_archived
                 FROM chat_sessions
                 ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2"
            } else {
                "SELECT id, title, model, created_at, updated_at, message_count, is_archived
                 FROM chat_sessions
                 WHERE is_archived = 0
                 ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2"
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![limit, offset], map_session)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::from)
        })
        .await
    }

    pub async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
        let session_id = session_id.to_string();
        let title = title.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_sessions SET title = ?1, updated_at = ?2 WHERE id = ?3",
                params![title, now_rfc3339(), session_id],
            )?;
            if changed == 0 {
                return Err(StoreError::SessionNotFound(session_id));
            }
            Ok(())
        })
        .await
    }

    /// Deletes a session; messages cascade through the foreign key.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "DELETE FROM chat_sessions WHERE id = ?1",
                params![session_id],
            )?;
            if changed == 0 {
                return Err(StoreError::SessionNotFound(session_id));
            }
            Ok(())
        })
        .await
    }

    /// Soft flag excluding the session from default listings.
    pub async fn archive_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_sessions SET is_archived = 1, updated_at = ?1 WHERE id = ?2",
                params![now_rfc3339(), session_id],
            )?;
            if changed == 0 {
                return Err(StoreError::SessionNotFound(session_id));
            }
            Ok(())
        })
        .await
    }

    // ── Messages ──

    pub async fn append_message(
        &self,
        session_id: &str,
        message: NewMessage,
    ) -> Result<StoredMessage> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM chat_sessions WHERE id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::SessionNotFound(session_id));
            }

            let now = now_rfc3339();
            conn.execute(
                "INSERT INTO messages
                 (session_id, role, content, content_type, media_data, model, provider, file_name, file_size, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    session_id,
                    message.role,
                    message.content,
                    message.content_type.as_str(),
                    message.media_data,
                    message.model,
                    message.provider,
                    message.file_name,
                    message.file_size,
                    now,
                ],
            )?;
            let message_id = conn.last_insert_rowid();

            conn.execute(
                "UPDATE chat_sessions
                 SET message_count = message_count + 1, updated_at = ?1
                 WHERE id = ?2",
                params![now, session_id],
            )?;

            conn.query_row(
                "SELECT id, session_id, role, content, content_type, media_data, model, provider, file_name, file_size, created_at
                 FROM messages WHERE id = ?1",
                params![message_id],
                map_message,
            )
            .map_err(StoreError::from)
        })
        .await
    }

    pub async fn messages(
        &self,
        session_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredMessage>> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, content_type, media_data, model, provider, file_name, file_size, created_at
                 FROM messages
                 WHERE session_id = ?1
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt.query_map(params![session_id, limit, offset], map_message)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::from)
        })
        .await
    }

    pub async fn search_messages(
        &self,
        query: &str,
        session_id: Option<String>,
        limit: i64,
    ) -> Result<Vec<MessageHit>> {
        let pattern = format!("%{}%", query);
        self.run(move |conn| {
            let (sql, bind_session) = match &session_id {
                Some(_) => (
                    "SELECT m.id, m.session_id, s.title, m.role, m.content, m.content_type, m.created_at
                     FROM messages m JOIN chat_sessions s ON m.session_id = s.id
                     WHERE m.session_id = ?1 AND m.content LIKE ?2
                     ORDER BY m.created_at DESC LIMIT ?3",
                    true,
                ),
                None => (
                    "SELECT m.id, m.session_id, s.title, m.role, m.content, m.content_type, m.created_at
                     FROM messages m JOIN chat_sessions s ON m.session_id = s.id
                     WHERE m.content LIKE ?1
                     ORDER BY m.created_at DESC LIMIT ?2",
                    false,
                ),
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = if bind_session {
                stmt.query_map(params![session_id, pattern, limit], map_hit)?
            } else {
                stmt.query_map(params![pattern, limit], map_hit)?
            };
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::from)
        })
        .await
    }

    pub async fn statistics(&self) -> Result<StoreStats> {
        self.run(|conn| {
            let today_prefix = format!("{}%", Utc::now().format("%Y-%m-%d"));

            let total_sessions = conn.query_row(
                "SELECT COUNT(*) FROM chat_sessions WHERE is_archived = 0",
                [],
                |row| row.get(0),
            )?;
            let total_messages =
                conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
            let today_sessions = conn.query_row(
                "SELECT COUNT(*) FROM chat_sessions WHERE is_archived = 0 AND created_at LIKE ?1",
                params![today_prefix],
                |row| row.get(0),
            )?;
            let today_messages = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE created_at LIKE ?1",
                params![today_prefix],
                |row| row.get(0),
            )?;

            Ok(StoreStats {
                total_sessions,
                total_messages,
                today_sessions,
                today_messages,
            })
        })
        .await
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn read_session(conn: &Connection, session_id: &str) -> Result<Option<Session>> {
    conn.query_row(
        "SELECT id, title, model, created_at, updated_at, message_count, is_archived
         FROM chat_sessions WHERE id = ?1",
        params![session_id],
        map_session,
    )
    .optional()
    .map_err(StoreError::from)
}

fn map_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        title: row.get(1)?,
        model: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        message_count: row.get(5)?,
        archived: row.get::<_, i64>(6)? != 0,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        content_type: ContentType::parse(&row.get::<_, String>(4)?),
        media_data: row.get(5)?,
        model: row.get(6)?,
        provider: row.get(7)?,
        file_name: row.get(8)?,
        file_size: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn map_hit(row: &Row<'_>) -> rusqlite::Result<MessageHit> {
    Ok(MessageHit {
        id: row.get(0)?,
        session_id: row.get(1)?,
        session_title: row.get(2)?,
        role: row.get(3)?,
        content: row.get(4)?,
        content_type: ContentType::parse(&row.get::<_, String>(5)?),
        created_at: row.get(6)?,
    })
}
