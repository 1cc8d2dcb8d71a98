//! Data access layer.
//!
//! Every operation takes the connection it runs on explicitly; handlers check
//! one out of the pool per request. Writes touching more than one row run in a
//! diesel transaction and roll back on any error before it is returned.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
use diesel::SqliteConnection;
use r2d2::Pool;
use serde::Serialize;

use crate::config::DatabaseSettings;

pub mod favorites;
pub mod movies;
pub mod reviews;
pub mod users;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

// Foreign keys are declarative only. diesel switches SQLite enforcement on
// when a connection is established, so `configure_connection` turns it back
// off; the favorites relation is swept by `favorites::sweep_orphaned_favorites`.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(50) NOT NULL,
    email VARCHAR(100) NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(100) NOT NULL,
    genre VARCHAR(50),
    user_id INTEGER NOT NULL REFERENCES users (id)
);
CREATE INDEX IF NOT EXISTS movies_user_id_title ON movies (user_id, title);
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users (id),
    movie_id INTEGER NOT NULL REFERENCES movies (id),
    review_text TEXT NOT NULL,
    rating INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS reviews_movie_id ON reviews (movie_id);
CREATE TABLE IF NOT EXISTS user_favorite_movies (
    user_id INTEGER NOT NULL REFERENCES users (id),
    movie_id INTEGER NOT NULL REFERENCES movies (id),
    PRIMARY KEY (user_id, movie_id)
);
"#;

/// Result of an idempotent add: either a fresh row or the one already stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Added<T> {
    Created(T),
    Existing(T),
}

impl<T> Added<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Added::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Added::Created(value) | Added::Existing(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FavoriteOutcome {
    Added,
    AlreadyFavorited,
}

#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_connection(conn, self.busy_timeout_ms).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Per-connection pragmas: writers wait up to `busy_timeout_ms` for the lock,
/// and REFERENCES clauses are not enforced.
pub fn configure_connection(
    conn: &mut SqliteConnection,
    busy_timeout_ms: u32,
) -> diesel::QueryResult<()> {
    conn.batch_execute(&format!(
        "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = OFF;",
        busy_timeout_ms
    ))
}

pub fn build_pool(settings: &DatabaseSettings) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(settings.url.as_str());
    let pool = Pool::builder()
        .max_size(settings.max_connections)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout_ms: settings.busy_timeout_ms,
        }))
        .build(manager)?;
    Ok(pool)
}

/// Creates any missing table. Safe to run on every startup.
pub fn init_schema(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
    conn.batch_execute(SCHEMA)
}

#[cfg(test)]
pub mod test_support {
    use diesel::{Connection, SqliteConnection};

    use super::*;

    pub fn connection() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("in-memory database must open");
        configure_connection(&mut conn, 0).expect("pragmas must apply");
        init_schema(&mut conn).expect("schema must apply");
        conn
    }

    /// Single-connection pool so every checkout sees the same in-memory database.
    pub fn pool() -> DbPool {
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(ConnectionOptions { busy_timeout_ms: 0 }))
            .build(ConnectionManager::<SqliteConnection>::new(":memory:"))
            .expect("in-memory pool must build");
        init_schema(&mut pool.get().expect("connection")).expect("schema must apply");
        pool
    }
}

#[cfg(test)]
mod tests {
    use diesel::{QueryDsl, RunQueryDsl};

    use super::*;
    use crate::schema::users;

    #[test]
    fn init_schema_is_idempotent() {
        let mut conn = test_support::connection();
        init_schema(&mut conn).unwrap();

        let count: i64 = users::table.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn references_are_not_enforced() {
        let mut conn = test_support::connection();

        let inserted = diesel::sql_query(
            "INSERT INTO user_favorite_movies (user_id, movie_id) VALUES (404, 404)",
        )
        .execute(&mut conn)
        .unwrap();

        assert_eq!(inserted, 1);
    }

    #[test]
    fn pooled_connections_do_not_enforce_references() {
        let pool = test_support::pool();
        let mut conn = pool.get().unwrap();

        let inserted = diesel::sql_query(
            "INSERT INTO reviews (user_id, movie_id, review_text, rating) VALUES (1, 2, 'x', 5)",
        )
        .execute(&mut conn)
        .unwrap();

        assert_eq!(inserted, 1);
    }

    #[test]
    fn added_exposes_inner_value() {
        assert!(Added::Created(1).is_created());
        assert!(!Added::Existing(1).is_created());
        assert_eq!(Added::Existing(7).into_inner(), 7);
    }
}
