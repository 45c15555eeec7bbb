//! SQLite-backed movie store implementation.

use super::models::*;
use super::schema::MOVIE_VERSIONED_SCHEMAS;
use super::trait_def::{MergeTransaction, MovieStore};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on bound parameters per statement, below SQLite's historical
/// limit of 999.
const MAX_BATCH_PARAMS: usize = 900;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed movie store.
#[derive(Clone)]
pub struct SqliteMovieStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = MOVIE_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &MOVIE_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating movie db schema at version {}", latest_version);
        let tx = conn.transaction()?;
        latest_schema.create(&tx)?;
        tx.commit()?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database has user_version {} and was not created by this server",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_version {
        bail!(
            "Database schema version {} is newer than supported version {}",
            current_version,
            latest_version
        );
    }

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in MOVIE_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating movie db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
            }
            current_version = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(conn)
        .context("Movie database schema validation failed")
}

/// Run `f` inside `BEGIN IMMEDIATE`, committing on success and rolling back on error.
fn with_immediate_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])?;
    let result = f(conn).and_then(|value| {
        conn.execute("COMMIT", [])?;
        Ok(value)
    });
    if result.is_err() {
        let _ = conn.execute("ROLLBACK", []);
    }
    result
}

/// Multi-row `INSERT OR IGNORE`, chunked to stay under the parameter limit.
/// Returns the number of rows actually inserted.
fn insert_or_ignore_rows(
    conn: &Connection,
    table: &str,
    columns: &[&str],
    rows: &[Vec<Value>],
) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    let row_placeholder = format!("({})", vec!["?"; columns.len()].join(", "));
    let rows_per_chunk = (MAX_BATCH_PARAMS / columns.len()).max(1);

    let mut inserted = 0;
    for chunk in rows.chunks(rows_per_chunk) {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES {}",
            table,
            columns.join(", "),
            vec![row_placeholder.as_str(); chunk.len()].join(", ")
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        inserted += stmt
            .execute(params_from_iter(chunk.iter().flatten()))
            .with_context(|| format!("Batch insert into {} failed", table))?;
    }
    Ok(inserted)
}

fn count_rows_for(conn: &Connection, table: &str, column: &str, id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", table, column),
        params![id],
        |r| r.get(0),
    )?;
    Ok(count as usize)
}

impl SqliteMovieStore {
    /// Open (and create if needed) the movie database.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open movie database {:?}", db_path_ref))?;

        write_conn.pragma_update(None, "foreign_keys", "ON")?;
        write_conn.busy_timeout(BUSY_TIMEOUT)?;

        migrate_if_needed(&mut write_conn)?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on movie write connection")?;

        let movie_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM movies", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened movie store: {} movies", movie_count);

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .context("Failed to open movie database for reading")?;
            read_conn.busy_timeout(BUSY_TIMEOUT)?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteMovieStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn upsert_movie_row(conn: &Connection, e: &MovieEnrichment) -> Result<()> {
        conn.execute(
            "INSERT INTO movies
                (id, title, localized_title, release_date, popularity,
                 poster_path, backdrop_path, budget, runtime)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                title = COALESCE(movies.title, excluded.title),
                localized_title = COALESCE(movies.localized_title, excluded.localized_title),
                release_date = COALESCE(movies.release_date, excluded.release_date),
                popularity = COALESCE(excluded.popularity, movies.popularity),
                poster_path = COALESCE(movies.poster_path, excluded.poster_path),
                backdrop_path = COALESCE(movies.backdrop_path, excluded.backdrop_path),
                budget = CASE
                    WHEN movies.budget IS NULL OR movies.budget = 0 THEN excluded.budget
                    ELSE movies.budget END,
                runtime = CASE
                    WHEN movies.runtime IS NULL OR movies.runtime = 0 THEN excluded.runtime
                    ELSE movies.runtime END",
            params![
                e.movie_id,
                e.title,
                e.release_date,
                e.popularity,
                e.poster_path,
                e.backdrop_path,
                e.budget,
                e.runtime,
            ],
        )?;
        Ok(())
    }

    fn insert_relationships(conn: &Connection, e: &MovieEnrichment) -> Result<EnrichmentSummary> {
        let movie_id = Value::Integer(e.movie_id);

        let genres = insert_or_ignore_rows(
            conn,
            "genres",
            &["id", "name"],
            &e.genres
                .iter()
                .map(|g| vec![g.id.into(), g.name.clone().into()])
                .collect::<Vec<Vec<Value>>>(),
        )?;
        let movie_genres = insert_or_ignore_rows(
            conn,
            "movie_genres",
            &["movie_id", "genre_id"],
            &e.genres
                .iter()
                .map(|g| vec![movie_id.clone(), g.id.into()])
                .collect::<Vec<Vec<Value>>>(),
        )?;

        let countries = insert_or_ignore_rows(
            conn,
            "countries",
            &["code", "name"],
            &e.countries
                .iter()
                .map(|c| vec![c.code.clone().into(), c.name.clone().into()])
                .collect::<Vec<Vec<Value>>>(),
        )?;
        let movie_countries = insert_or_ignore_rows(
            conn,
            "movie_countries",
            &["movie_id", "country_code"],
            &e.countries
                .iter()
                .map(|c| vec![movie_id.clone(), c.code.clone().into()])
                .collect::<Vec<Vec<Value>>>(),
        )?;

        let studios = insert_or_ignore_rows(
            conn,
            "studios",
            &["id", "name", "origin_country"],
            &e.studios
                .iter()
                .map(|s| {
                    vec![
                        s.id.into(),
                        s.name.clone().into(),
                        s.origin_country.clone().into(),
                    ]
                })
                .collect::<Vec<Vec<Value>>>(),
        )?;
        let movie_studio = insert_or_ignore_rows(
            conn,
            "movie_studio",
            &["movie_id", "studio_id"],
            &e.studios
                .iter()
                .map(|s| vec![movie_id.clone(), s.id.into()])
                .collect::<Vec<Vec<Value>>>(),
        )?;

        let crew = insert_or_ignore_rows(
            conn,
            "crew",
            &["id", "name", "profile_path"],
            &e.directors
                .iter()
                .map(|d| {
                    vec![
                        d.person_id.into(),
                        d.name.clone().into(),
                        d.profile_path.clone().into(),
                    ]
                })
                .collect::<Vec<Vec<Value>>>(),
        )?;
        let movie_crew = insert_or_ignore_rows(
            conn,
            "movie_crew",
            &["movie_id", "crew_id", "job"],
            &e.directors
                .iter()
                .map(|d| {
                    vec![
                        movie_id.clone(),
                        d.person_id.into(),
                        Value::Text("Director".to_string()),
                    ]
                })
                .collect::<Vec<Vec<Value>>>(),
        )?;

        let actors = insert_or_ignore_rows(
            conn,
            "actors",
            &["id", "name", "profile_path"],
            &e.cast
                .iter()
                .map(|c| {
                    vec![
                        c.person_id.into(),
                        c.name.clone().into(),
                        c.profile_path.clone().into(),
                    ]
                })
                .collect::<Vec<Vec<Value>>>(),
        )?;
        let movie_actors = insert_or_ignore_rows(
            conn,
            "movie_actors",
            &["movie_id", "actor_id", "cast_order", "character"],
            &e.cast
                .iter()
                .map(|c| {
                    vec![
                        movie_id.clone(),
                        c.person_id.into(),
                        c.cast_order.into(),
                        c.character.clone().into(),
                    ]
                })
                .collect::<Vec<Vec<Value>>>(),
        )?;

        Ok(EnrichmentSummary {
            genres,
            movie_genres,
            countries,
            movie_countries,
            studios,
            movie_studio,
            crew,
            movie_crew,
            actors,
            movie_actors,
        })
    }
}

impl MovieStore for SqliteMovieStore {
    fn get_movie(&self, id: i64) -> Result<Option<MovieRecord>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let movie = conn
            .query_row(
                "SELECT id, title, localized_title, release_date, popularity,
                        poster_path, backdrop_path, budget, runtime
                 FROM movies WHERE id = ?1",
                params![id],
                |row| {
                    Ok(MovieRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        localized_title: row.get(2)?,
                        release_date: row.get(3)?,
                        popularity: row.get(4)?,
                        poster_path: row.get(5)?,
                        backdrop_path: row.get(6)?,
                        budget: row.get(7)?,
                        runtime: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(movie)
    }

    fn count_references(&self, id: i64) -> Result<MovieReferenceCounts> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        Ok(MovieReferenceCounts {
            movie_genres: count_rows_for(&conn, "movie_genres", "movie_id", id)?,
            movie_countries: count_rows_for(&conn, "movie_countries", "movie_id", id)?,
            movie_studio: count_rows_for(&conn, "movie_studio", "movie_id", id)?,
            movie_crew: count_rows_for(&conn, "movie_crew", "movie_id", id)?,
            movie_actors: count_rows_for(&conn, "movie_actors", "movie_id", id)?,
            revenues: count_rows_for(&conn, "revenues", "film_id", id)?,
            showings: count_rows_for(&conn, "showings", "movie_id", id)?,
            daily_revenues: count_rows_for(&conn, "daily_revenues", "film_id", id)?,
        })
    }

    fn get_movies_count(&self) -> usize {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM movies", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    fn ensure_movie(&self, id: i64) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let inserted = conn.execute("INSERT OR IGNORE INTO movies (id) VALUES (?1)", params![id])?;
        Ok(inserted == 1)
    }

    fn begin_merge(&self) -> Result<Box<dyn MergeTransaction + '_>> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", [])
            .context("Failed to begin merge transaction")?;
        Ok(Box::new(SqliteMergeTransaction { conn, open: true }))
    }

    fn apply_enrichment(&self, enrichment: &MovieEnrichment) -> Result<EnrichmentSummary> {
        let conn = self.write_conn.lock().unwrap();
        let summary = with_immediate_transaction(&conn, |conn| {
            Self::upsert_movie_row(conn, enrichment)?;
            Self::insert_relationships(conn, enrichment)
        })?;
        debug!(
            "Enrichment for movie {} inserted {} rows: {:?}",
            enrichment.movie_id,
            summary.total(),
            summary
        );
        Ok(summary)
    }

    fn backfill_localized_title(&self, id: i64, prior: &PriorTitles) -> Result<bool> {
        let Some(value) = prior.backfill_value() else {
            return Ok(false);
        };
        let conn = self.write_conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE movies SET localized_title = ?2 WHERE id = ?1 AND localized_title IS NULL",
            params![id, value],
        )?;
        Ok(changed > 0)
    }
}

// =============================================================================
// Merge transaction
// =============================================================================

/// Holds the write connection for the whole merge. `BEGIN IMMEDIATE` takes the
/// database write lock up front, so concurrent merges serialize here.
struct SqliteMergeTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

impl MergeTransaction for SqliteMergeTransaction<'_> {
    fn load_placeholder(&mut self, placeholder_id: i64) -> Result<Option<PriorTitles>> {
        let prior = self
            .conn
            .query_row(
                "SELECT title, localized_title FROM movies WHERE id = ?1",
                params![placeholder_id],
                |row| {
                    Ok(PriorTitles {
                        title: row.get(0)?,
                        localized_title: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(prior)
    }

    fn lock_movies(&mut self, placeholder_id: i64, canonical_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM movies WHERE id IN (?1, ?2) ORDER BY id ASC")?;
        let ids = stmt
            .query_map(params![placeholder_id, canonical_id], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn purge_attachments(&mut self, movie_id: i64) -> Result<PurgedAttachments> {
        let conn = &self.conn;
        let purge = |table: &str, column: &str| -> Result<usize> {
            conn.execute(
                &format!("DELETE FROM {} WHERE {} = ?1", table, column),
                params![movie_id],
            )
            .with_context(|| format!("Failed to purge {} for movie {}", table, movie_id))
        };
        Ok(PurgedAttachments {
            genres: purge("movie_genres", "movie_id")?,
            countries: purge("movie_countries", "movie_id")?,
            studios: purge("movie_studio", "movie_id")?,
            crew: purge("movie_crew", "movie_id")?,
            actors: purge("movie_actors", "movie_id")?,
            daily_revenues: purge("daily_revenues", "film_id")?,
        })
    }

    fn reassign_facts(&mut self, from_id: i64, to_id: i64) -> Result<ReassignedFacts> {
        let revenues = self
            .conn
            .execute(
                "UPDATE revenues SET film_id = ?2 WHERE film_id = ?1",
                params![from_id, to_id],
            )
            .context("Failed to reassign revenues")?;
        let showings = self
            .conn
            .execute(
                "UPDATE showings SET movie_id = ?2 WHERE movie_id = ?1",
                params![from_id, to_id],
            )
            .context("Failed to reassign showings")?;
        Ok(ReassignedFacts { revenues, showings })
    }

    fn delete_movie(&mut self, movie_id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM movies WHERE id = ?1", params![movie_id])
            .with_context(|| format!("Failed to delete movie {}", movie_id))?;
        if deleted != 1 {
            bail!("Expected to delete movie {}, deleted {} rows", movie_id, deleted);
        }
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

impl SqliteMergeTransaction<'_> {
    /// Ends the transaction. `open` stays set on failure so Drop rolls back again.
    fn finish(&mut self, statement: &str) -> Result<()> {
        self.conn
            .execute(statement, [])
            .with_context(|| format!("Failed to {} merge transaction", statement))?;
        self.open = false;
        Ok(())
    }
}

impl Drop for SqliteMergeTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            warn!("Merge transaction dropped while open, rolling back");
            let _ = self.conn.execute("ROLLBACK", []);
        }
    }
}
