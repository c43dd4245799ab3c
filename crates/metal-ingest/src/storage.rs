//! Tabular loader
//!
//! Records are normalized into one uniform column set (snake_case names,
//! null for fields a record doesn't carry), projected onto the destination
//! table, and loaded with full-replace semantics: the delete and every insert
//! chunk share one transaction, so a failed load leaves the previous
//! contents in place. Primary-key conflicts inside one load are ignored,
//! which keeps the first row written.

use crate::error::{Result, ScrapeError};
use crate::models::Record;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Rows per INSERT statement
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 500;

/// One destination column and the canonical record field feeding it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub source: &'static str,
    pub required: bool,
}

impl ColumnSpec {
    const fn key(name: &'static str, source: &'static str) -> Self {
        Self {
            name,
            source,
            required: true,
        }
    }

    const fn value(name: &'static str, source: &'static str) -> Self {
        Self {
            name,
            source,
            required: false,
        }
    }
}

/// Destination table definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
    pub primary_key: &'static [&'static str],
}

pub const BAND_TABLE: TableSchema = TableSchema {
    name: "band",
    columns: &[
        ColumnSpec::key("id", "band_id"),
        ColumnSpec::value("name", "band_name"),
        ColumnSpec::value("country", "country_of_origin"),
        ColumnSpec::value("location", "location"),
        ColumnSpec::value("status", "status"),
        ColumnSpec::value("formed_in", "formed_in"),
        ColumnSpec::value("genre", "genre"),
        ColumnSpec::value("themes", "themes"),
        ColumnSpec::value("last_label", "last_label"),
        ColumnSpec::value("years_active", "years_active"),
    ],
    primary_key: &["id"],
};

pub const ALBUM_TABLE: TableSchema = TableSchema {
    name: "album",
    columns: &[
        ColumnSpec::key("band_id", "band_id"),
        ColumnSpec::key("id", "album_id"),
        ColumnSpec::value("name", "name"),
        ColumnSpec::value("type", "type"),
        ColumnSpec::value("year", "year"),
        ColumnSpec::value("reviews", "reviews"),
    ],
    primary_key: &["band_id", "id"],
};

pub const SONG_TABLE: TableSchema = TableSchema {
    name: "song",
    columns: &[
        ColumnSpec::key("album_id", "album_id"),
        ColumnSpec::key("id", "song_id"),
        ColumnSpec::value("name", "name"),
        ColumnSpec::value("length", "length"),
    ],
    primary_key: &["album_id", "id"],
};

impl TableSchema {
    /// Create-if-absent DDL; every column is TEXT, identifiers are NOT NULL
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.required {
                    format!("{} TEXT NOT NULL", quote(c.name))
                } else {
                    format!("{} TEXT", quote(c.name))
                }
            })
            .collect();
        let key: Vec<String> = self.primary_key.iter().map(|k| quote(k)).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
            quote(self.name),
            columns.join(", "),
            key.join(", ")
        )
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| quote(c.name)).collect()
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Canonical column name: lowercase, whitespace runs become `_`
pub fn normalize_column_name(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Records reshaped onto the union of their fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedTable {
    /// Canonical column names, sorted
    pub columns: Vec<String>,
    /// One value per column per record; `None` where the record had no field
    pub rows: Vec<Vec<Option<String>>>,
}

impl NormalizedTable {
    /// Position of a canonical column, if any record carried it
    fn column(&self, source: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == source)
    }
}

/// Union the field names actually seen and fill gaps with nulls
pub fn normalize(records: &[Record]) -> NormalizedTable {
    let canonical: Vec<BTreeMap<String, &str>> = records
        .iter()
        .map(|record| {
            record
                .labels()
                .filter_map(|label| Some((normalize_column_name(label), record.get(label)?)))
                .collect()
        })
        .collect();

    let columns: Vec<String> = canonical
        .iter()
        .flat_map(|row| row.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = canonical
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).map(|v| v.to_string()))
                .collect()
        })
        .collect();

    NormalizedTable { columns, rows }
}

/// Outcome of one table load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub table: String,
    pub rows_received: usize,
    pub rows_inserted: u64,
    pub duplicates_ignored: u64,
}

/// Loads records into the SQLite destination
pub struct TabularLoader {
    pool: SqlitePool,
    chunk_size: usize,
}

impl TabularLoader {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(pool: SqlitePool, chunk_size: usize) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Open (creating if needed) the database file at `path`
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "Opened destination database");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the table if it does not exist; never touches existing data
    pub async fn ensure_schema(&self, table: &TableSchema) -> Result<()> {
        sqlx::query(&table.create_table_sql())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the contents of `table` with `records`
    pub async fn load(&self, records: &[Record], table: &TableSchema) -> Result<LoadStats> {
        self.ensure_schema(table).await?;

        let normalized = normalize(records);
        let rows = project(&normalized, table)?;

        debug!(
            table = table.name,
            rows = rows.len(),
            seen_columns = normalized.columns.len(),
            "Normalized records"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {}", quote(table.name)))
            .execute(&mut *tx)
            .await?;

        let total_chunks = rows.len().div_ceil(self.chunk_size);
        let mut inserted = 0;

        for (chunk_idx, chunk) in rows.chunks(self.chunk_size).enumerate() {
            debug!(
                "Inserting {} chunk {} / {} ({} rows)",
                table.name,
                chunk_idx + 1,
                total_chunks,
                chunk.len()
            );

            let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quote(table.name),
                table.column_names().join(", ")
            ));
            query_builder.push_values(chunk, |mut b, row| {
                for value in row {
                    b.push_bind(value.as_deref());
                }
            });
            query_builder.push(" ON CONFLICT DO NOTHING");

            inserted += query_builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        let stats = LoadStats {
            table: table.name.to_string(),
            rows_received: rows.len(),
            rows_inserted: inserted,
            duplicates_ignored: rows.len() as u64 - inserted,
        };

        info!(
            table = table.name,
            received = stats.rows_received,
            inserted = stats.rows_inserted,
            duplicates = stats.duplicates_ignored,
            "Loaded table"
        );

        Ok(stats)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Map normalized rows onto the table's declared columns
///
/// Fails on the first row lacking a required column, before anything is
/// written.
fn project(normalized: &NormalizedTable, table: &TableSchema) -> Result<Vec<Vec<Option<String>>>> {
    let sources: Vec<Option<usize>> = table
        .columns
        .iter()
        .map(|c| normalized.column(c.source))
        .collect();

    normalized
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            table
                .columns
                .iter()
                .zip(&sources)
                .map(|(column, source)| {
                    let value = source.and_then(|i| row[i].clone());
                    if column.required && value.is_none() {
                        return Err(ScrapeError::MissingIdentifier {
                            table: table.name.to_string(),
                            column: column.name.to_string(),
                            row: row_idx,
                        });
                    }
                    Ok(value)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{fields, RecordKind};

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Country of origin"), "country_of_origin");
        assert_eq!(normalize_column_name("Band ID"), "band_id");
        assert_eq!(normalize_column_name("  Years \t active "), "years_active");
        assert_eq!(normalize_column_name("genre"), "genre");
    }

    #[test]
    fn test_normalize_unions_fields_and_fills_nulls() {
        let records = vec![
            Record::band("1").with(fields::GENRE, "Doom"),
            Record::band("2").with(fields::COUNTRY, "Finland"),
        ];

        let table = normalize(&records);
        assert_eq!(table.columns, vec!["band_id", "country_of_origin", "genre"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Some("1".to_string()), None, Some("Doom".to_string())],
                vec![Some("2".to_string()), Some("Finland".to_string()), None],
            ]
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(&[]), NormalizedTable::default());
    }

    #[test]
    fn test_projection_maps_sources_and_drops_extras() {
        let records = vec![Record::album("1", "10")
            .with(fields::NAME, "Demo")
            .with(fields::ALBUM_URL, "https://x.org/albums/A/Demo/10")];

        let rows = project(&normalize(&records), &ALBUM_TABLE).unwrap();
        assert_eq!(
            rows,
            vec![vec![
                Some("1".to_string()),
                Some("10".to_string()),
                Some("Demo".to_string()),
                None,
                None,
                None,
            ]]
        );
    }

    #[test]
    fn test_projection_rejects_missing_identifier() {
        let records = vec![
            Record::band("1"),
            Record::empty(RecordKind::Band).with(fields::BAND_NAME, "Nameless"),
        ];

        let err = project(&normalize(&records), &BAND_TABLE).unwrap_err();
        match err {
            ScrapeError::MissingIdentifier { table, column, row } => {
                assert_eq!(table, "band");
                assert_eq!(column, "id");
                assert_eq!(row, 1);
            },
            other => panic!("expected missing identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            SONG_TABLE.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS \"song\" (\"album_id\" TEXT NOT NULL, \"id\" TEXT NOT NULL, \
             \"name\" TEXT, \"length\" TEXT, PRIMARY KEY (\"album_id\", \"id\"))"
        );
    }
}
