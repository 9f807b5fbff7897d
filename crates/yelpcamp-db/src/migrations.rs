use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, campgrounds, reviews)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE campgrounds (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                location        TEXT NOT NULL,
                price           REAL NOT NULL CHECK (price >= 0),
                geometry_lng    REAL,
                geometry_lat    REAL,
                author_id       TEXT NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE campground_images (
                campground_id   TEXT NOT NULL REFERENCES campgrounds(id) ON DELETE CASCADE,
                position        INTEGER NOT NULL,
                url             TEXT NOT NULL,
                filename        TEXT NOT NULL,
                PRIMARY KEY (campground_id, position)
            );

            CREATE TABLE reviews (
                id          TEXT PRIMARY KEY,
                body        TEXT NOT NULL,
                rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                author_id   TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- A review belongs to at most one campground.
            CREATE TABLE campground_reviews (
                campground_id   TEXT NOT NULL REFERENCES campgrounds(id) ON DELETE CASCADE,
                review_id       TEXT NOT NULL UNIQUE REFERENCES reviews(id) ON DELETE CASCADE,
                PRIMARY KEY (campground_id, review_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (sessions, flashes)");
        conn.execute_batch(
            "
            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT REFERENCES users(id) ON DELETE SET NULL,
                return_to   TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                expires_at  TEXT NOT NULL
            );

            CREATE TABLE flashes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                severity    TEXT NOT NULL,
                message     TEXT NOT NULL
            );

            CREATE INDEX idx_flashes_session ON flashes(session_id, id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }
}
