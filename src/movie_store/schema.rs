//! SQLite schema for the box-office catalog.
//!
//! `movies` is the aggregate root. Reference entities are shared across
//! movies and linked through association tables, while fact tables hold
//! observed box-office data keyed by movie id. Every movie reference is a
//! `RESTRICT` foreign key so a movie row cannot disappear while anything
//! still points at it.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const MOVIE_FK: ForeignKey = ForeignKey {
    foreign_table: "movies",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const COUNTRY_FK: ForeignKey = ForeignKey {
    foreign_table: "countries",
    foreign_column: "code",
    on_delete: ForeignKeyOnChange::Restrict,
};

const STUDIO_FK: ForeignKey = ForeignKey {
    foreign_table: "studios",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const CREW_FK: ForeignKey = ForeignKey {
    foreign_table: "crew",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const ACTOR_FK: ForeignKey = ForeignKey {
    foreign_table: "actors",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

// =============================================================================
// Movies
// =============================================================================

const MOVIES_TABLE: Table = Table {
    name: "movies",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("localized_title", &SqlType::Text),
        sqlite_column!("release_date", &SqlType::Text),
        sqlite_column!("popularity", &SqlType::Real),
        sqlite_column!("poster_path", &SqlType::Text),
        sqlite_column!("backdrop_path", &SqlType::Text),
        sqlite_column!("budget", &SqlType::Integer),
        sqlite_column!("runtime", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

// =============================================================================
// Reference entities
// =============================================================================

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const COUNTRIES_TABLE: Table = Table {
    name: "countries",
    columns: &[
        sqlite_column!("code", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const STUDIOS_TABLE: Table = Table {
    name: "studios",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("origin_country", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const CREW_TABLE: Table = Table {
    name: "crew",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("profile_path", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ACTORS_TABLE: Table = Table {
    name: "actors",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("profile_path", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

// =============================================================================
// Associations
// =============================================================================

const MOVIE_GENRES_TABLE: Table = Table {
    name: "movie_genres",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&GENRE_FK)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["movie_id", "genre_id"]],
};

const MOVIE_COUNTRIES_TABLE: Table = Table {
    name: "movie_countries",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "country_code",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&COUNTRY_FK)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["movie_id", "country_code"]],
};

const MOVIE_STUDIO_TABLE: Table = Table {
    name: "movie_studio",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "studio_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&STUDIO_FK)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["movie_id", "studio_id"]],
};

const MOVIE_CREW_TABLE: Table = Table {
    name: "movie_crew",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "crew_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CREW_FK)
        ),
        sqlite_column!("job", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["movie_id", "crew_id", "job"]],
};

const MOVIE_ACTORS_TABLE: Table = Table {
    name: "movie_actors",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "actor_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ACTOR_FK)
        ),
        sqlite_column!("cast_order", &SqlType::Integer, non_null = true),
        sqlite_column!("character", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[&["movie_id", "actor_id", "cast_order"]],
};

// =============================================================================
// Facts
// =============================================================================

const REVENUES_TABLE: Table = Table {
    name: "revenues",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "film_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!("weekend_start", &SqlType::Text, non_null = true),
        sqlite_column!("gross", &SqlType::Integer, non_null = true),
        sqlite_column!("theaters", &SqlType::Integer),
    ],
    indices: &[("idx_revenues_film_id", "film_id")],
    unique_constraints: &[],
};

const SHOWINGS_TABLE: Table = Table {
    name: "showings",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "movie_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!("theater", &SqlType::Text, non_null = true),
        sqlite_column!("show_date", &SqlType::Text, non_null = true),
        sqlite_column!("show_time", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_showings_movie_id", "movie_id")],
    unique_constraints: &[],
};

const DAILY_REVENUES_TABLE: Table = Table {
    name: "daily_revenues",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "film_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!("day", &SqlType::Text, non_null = true),
        sqlite_column!("gross", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_daily_revenues_film_id", "film_id")],
    unique_constraints: &[],
};

pub const MOVIE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        MOVIES_TABLE,
        GENRES_TABLE,
        COUNTRIES_TABLE,
        STUDIOS_TABLE,
        CREW_TABLE,
        ACTORS_TABLE,
        MOVIE_GENRES_TABLE,
        MOVIE_COUNTRIES_TABLE,
        MOVIE_STUDIO_TABLE,
        MOVIE_CREW_TABLE,
        MOVIE_ACTORS_TABLE,
        REVENUES_TABLE,
        SHOWINGS_TABLE,
        DAILY_REVENUES_TABLE,
    ],
    migration: None,
}];
