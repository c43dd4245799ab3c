//! Table loads against a scratch SQLite file

mod common;

use common::{count, open_loader};
use metal_ingest::models::{fields, RecordKind};
use metal_ingest::storage::{TabularLoader, ALBUM_TABLE, BAND_TABLE, SONG_TABLE};
use metal_ingest::{Record, ScrapeError};
use tempfile::TempDir;

fn bands() -> Vec<Record> {
    vec![
        Record::band("1")
            .with(fields::BAND_NAME, "Queensrÿche")
            .with(fields::COUNTRY, "United States of America")
            .with(fields::GENRE, "Heavy Metal"),
        Record::band("2").with(fields::BAND_NAME, "Quo Vadis"),
        Record::band("3"),
    ]
}

async fn snapshot(loader: &TabularLoader) -> Vec<(String, Option<String>, Option<String>)> {
    sqlx::query_as("SELECT id, name, genre FROM band ORDER BY id")
        .fetch_all(loader.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let loader = open_loader(&dir).await;

    loader.load(&bands(), &BAND_TABLE).await.unwrap();
    let first = snapshot(&loader).await;
    let stats = loader.load(&bands(), &BAND_TABLE).await.unwrap();
    let second = snapshot(&loader).await;

    assert_eq!(first, second);
    assert_eq!(stats.rows_inserted, 3);
    assert_eq!(
        first[0],
        (
            "1".to_string(),
            Some("Queensrÿche".to_string()),
            Some("Heavy Metal".to_string())
        )
    );
    assert_eq!(first[2], ("3".to_string(), None, None));
}

#[tokio::test]
async fn test_duplicate_keys_keep_first_row() {
    let dir = TempDir::new().unwrap();
    let loader = open_loader(&dir).await;

    let records = vec![
        Record::band("7").with(fields::BAND_NAME, "First"),
        Record::band("8"),
        Record::band("7").with(fields::BAND_NAME, "Second"),
    ];
    let stats = loader.load(&records, &BAND_TABLE).await.unwrap();

    assert_eq!(stats.rows_received, 3);
    assert_eq!(stats.rows_inserted, 2);
    assert_eq!(stats.duplicates_ignored, 1);

    let name: String = sqlx::query_scalar("SELECT name FROM band WHERE id = '7'")
        .fetch_one(loader.pool())
        .await
        .unwrap();
    assert_eq!(name, "First");
}

#[tokio::test]
async fn test_load_replaces_previous_contents() {
    let dir = TempDir::new().unwrap();
    let loader = open_loader(&dir).await;

    loader.load(&bands(), &BAND_TABLE).await.unwrap();
    loader
        .load(&[Record::band("99")], &BAND_TABLE)
        .await
        .unwrap();

    assert_eq!(count(loader.pool(), "SELECT COUNT(*) FROM band").await, 1);

    loader.load(&[], &BAND_TABLE).await.unwrap();
    assert_eq!(count(loader.pool(), "SELECT COUNT(*) FROM band").await, 0);
}

#[tokio::test]
async fn test_missing_identifier_aborts_before_writing() {
    let dir = TempDir::new().unwrap();
    let loader = open_loader(&dir).await;
    loader.load(&bands(), &BAND_TABLE).await.unwrap();

    let broken = vec![
        Record::band("50"),
        Record::empty(RecordKind::Band).with(fields::BAND_NAME, "No Id"),
    ];
    let err = loader.load(&broken, &BAND_TABLE).await.unwrap_err();

    assert!(matches!(err, ScrapeError::MissingIdentifier { row: 1, .. }));
    assert_eq!(count(loader.pool(), "SELECT COUNT(*) FROM band").await, 3);
}

#[tokio::test]
async fn test_chunked_insert_spans_statements() {
    let dir = TempDir::new().unwrap();
    let pool = open_loader(&dir).await.pool().clone();
    let loader = TabularLoader::with_chunk_size(pool, 4);

    let records: Vec<Record> = (0..11)
        .map(|i| Record::song("500", i.to_string()).with(fields::LENGTH, "03:00"))
        .collect();
    let stats = loader.load(&records, &SONG_TABLE).await.unwrap();

    assert_eq!(stats.rows_inserted, 11);
    assert_eq!(
        count(loader.pool(), "SELECT COUNT(*) FROM song WHERE album_id = '500'").await,
        11
    );
}

#[tokio::test]
async fn test_album_key_is_composite() {
    let dir = TempDir::new().unwrap();
    let loader = open_loader(&dir).await;

    // Same album id under two bands (split releases) are distinct rows
    let records = vec![
        Record::album("1", "900").with(fields::NAME, "Split"),
        Record::album("2", "900").with(fields::NAME, "Split"),
    ];
    let stats = loader.load(&records, &ALBUM_TABLE).await.unwrap();
    assert_eq!(stats.rows_inserted, 2);
}

#[tokio::test]
async fn test_ensure_schema_preserves_data() {
    let dir = TempDir::new().unwrap();
    let loader = open_loader(&dir).await;
    loader.load(&bands(), &BAND_TABLE).await.unwrap();

    loader.ensure_schema(&BAND_TABLE).await.unwrap();
    assert_eq!(count(loader.pool(), "SELECT COUNT(*) FROM band").await, 3);
}
