use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::{FlashRow, SessionRow};
use crate::queries::OptionalExt;

impl Database {
    // -- Sessions --

    pub fn create_session(&self, id: &str, ttl_hours: u64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, expires_at)
                 VALUES (?1, datetime('now', '+' || ?2 || ' hours'))",
                params![id, ttl_hours as i64],
            )?;
            Ok(())
        })
    }

    /// A live session with its user's name joined in. Expired sessions read
    /// as absent.
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT s.id, s.user_id, u.username, s.return_to
                 FROM sessions s
                 LEFT JOIN users u ON u.id = s.user_id
                 WHERE s.id = ?1 AND s.expires_at > datetime('now')",
                [id],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        username: row.get(2)?,
                        return_to: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Log a user in (`Some`) or out (`None`) on an existing session.
    pub fn set_session_user(&self, id: &str, user_id: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET user_id = ?2 WHERE id = ?1",
                params![id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn set_return_to(&self, id: &str, path: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET return_to = ?2 WHERE id = ?1",
                params![id, path],
            )?;
            Ok(())
        })
    }

    /// Read and clear the remembered path in one step.
    pub fn take_return_to(&self, id: &str) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let path: Option<String> = tx
                .query_row("SELECT return_to FROM sessions WHERE id = ?1", [id], |r| {
                    r.get::<_, Option<String>>(0)
                })
                .optional()?
                .flatten();
            tx.execute("UPDATE sessions SET return_to = NULL WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(path)
        })
    }

    // -- Flash notices --

    pub fn push_flash(&self, session_id: &str, severity: &str, message: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO flashes (session_id, severity, message) VALUES (?1, ?2, ?3)",
                params![session_id, severity, message],
            )?;
            Ok(())
        })
    }

    /// Drain the session's notices, oldest first. Each notice is returned
    /// exactly once.
    pub fn take_flashes(&self, session_id: &str) -> Result<Vec<FlashRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let rows = {
                let mut stmt = tx.prepare(
                    "SELECT severity, message FROM flashes WHERE session_id = ?1 ORDER BY id",
                )?;
                stmt.query_map([session_id], |row| {
                    Ok(FlashRow {
                        severity: row.get(0)?,
                        message: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?
            };
            tx.execute("DELETE FROM flashes WHERE session_id = ?1", [session_id])?;
            tx.commit()?;
            Ok(rows)
        })
    }

    /// Remove expired sessions (their notices go with them). Returns the count.
    pub fn delete_expired_sessions(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= datetime('now')",
                [],
            )?;
            Ok(count)
        })
    }
}
