use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

use crate::errors::{MigrateError, Result};

/// One remembered turn of an agent conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub role: String,
    pub content: String,
}

/// Agent conversation memory living behind the coordinator's storage handle.
///
/// `":memory:"` keeps everything in-process; any other value is a SQLite file.
pub struct Memory {
    conn: Mutex<Connection>,
}

fn storage_err(e: rusqlite::Error) -> MigrateError {
    MigrateError::Storage(e.to_string())
}

impl Memory {
    pub fn open(handle: &str) -> Result<Self> {
        let conn = if handle == ":memory:" {
            Connection::open_in_memory()
        } else {
            if let Some(parent) = Path::new(handle).parent().filter(|p| !p.as_os_str().is_empty()) {
                fs_err::create_dir_all(parent).map_err(|e| MigrateError::Storage(e.to_string()))?;
            }
            Connection::open(handle)
        }
        .map_err(storage_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS agent_messages (
                 id         INTEGER PRIMARY KEY AUTOINCREMENT,
                 agent      TEXT NOT NULL,
                 run_id     TEXT NOT NULL,
                 role       TEXT NOT NULL,
                 content    TEXT NOT NULL,
                 created_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_agent_messages_agent ON agent_messages(agent, id);",
        )
        .map_err(storage_err)?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn append(&self, agent: &str, run_id: &str, role: &str, content: &str) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO agent_messages (agent, run_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![agent, run_id, role, content, Utc::now().to_rfc3339()],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    /// Last `limit` entries for `agent`, oldest first.
    pub fn recent(&self, agent: &str, limit: usize) -> Result<Vec<MemoryEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT role, content FROM agent_messages
                 WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![agent, limit as i64], |r| {
                Ok(MemoryEntry { role: r.get(0)?, content: r.get(1)? })
            })
            .map_err(storage_err)?;
        let mut out = rows.collect::<std::result::Result<Vec<_>, _>>().map_err(storage_err)?;
        out.reverse();
        Ok(out)
    }

    pub fn count(&self, agent: &str) -> Result<usize> {
        let n: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM agent_messages WHERE agent = ?1", params![agent], |r| r.get(0))
            .map_err(storage_err)?;
        Ok(n as usize)
    }
}
