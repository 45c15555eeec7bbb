//! Test database fixtures
//!
//! Rows are written through a separate SQLite connection, the way an import
//! job would create them, after the store has migrated the schema.

use anyhow::Result;
use rusqlite::{params, Connection};
use std::path::Path;

fn open(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Inserts a placeholder movie with box-office facts and stale attachments.
pub fn seed_placeholder(db_path: &Path, id: i64, title: &str) -> Result<()> {
    let conn = open(db_path)?;
    conn.execute(
        "INSERT INTO movies (id, title) VALUES (?1, ?2)",
        params![id, title],
    )?;
    conn.execute_batch(
        "INSERT OR IGNORE INTO genres (id, name) VALUES (99, 'Wrong Genre');
         INSERT OR IGNORE INTO actors (id, name) VALUES (8888, 'Wrong Actor');",
    )?;
    conn.execute(
        "INSERT INTO movie_genres (movie_id, genre_id) VALUES (?1, 99)",
        params![id],
    )?;
    conn.execute(
        "INSERT INTO movie_actors (movie_id, actor_id, cast_order) VALUES (?1, 8888, 0)",
        params![id],
    )?;
    for (weekend, gross) in [("1999-10-15", 11_035_485), ("1999-10-22", 5_603_730)] {
        conn.execute(
            "INSERT INTO revenues (film_id, weekend_start, gross) VALUES (?1, ?2, ?3)",
            params![id, weekend, gross],
        )?;
    }
    conn.execute(
        "INSERT INTO showings (movie_id, theater, show_date, show_time)
         VALUES (?1, 'Odeon', '1999-10-16', '20:30')",
        params![id],
    )?;
    conn.execute(
        "INSERT INTO daily_revenues (film_id, day, gross) VALUES (?1, '1999-10-16', 1200)",
        params![id],
    )?;
    Ok(())
}

/// Inserts a bare canonical movie row.
pub fn seed_movie(db_path: &Path, id: i64, budget: Option<i64>) -> Result<()> {
    let conn = open(db_path)?;
    conn.execute(
        "INSERT INTO movies (id, budget) VALUES (?1, ?2)",
        params![id, budget],
    )?;
    Ok(())
}

/// Counts rows of `table` whose `column` equals `id`.
pub fn count_rows(db_path: &Path, table: &str, column: &str, id: i64) -> Result<i64> {
    let conn = open(db_path)?;
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", table, column),
        params![id],
        |row| row.get(0),
    )?;
    Ok(count)
}
