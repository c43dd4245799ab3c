//! Shared fixtures for integration tests: a mock catalog and a scratch database
#![allow(dead_code)]

use metal_ingest::{IngestConfig, TabularLoader};
use serde_json::json;
use sqlx::SqlitePool;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Detail page URL of band `id` on the mock server
pub fn band_url(server: &MockServer, id: u32) -> String {
    format!("{}/bands/Band_{}/{}", server.uri(), id, id)
}

/// Listing JSON as served by the browse endpoint
pub fn listing_body(total: usize, links: &[String]) -> String {
    let rows: Vec<_> = links
        .iter()
        .map(|link| {
            json!([
                format!("<a href='{}'>Band</a>", link),
                "Finland",
                "Doom Metal",
                "<span class=\"active\">Active</span>"
            ])
        })
        .collect();

    json!({
        "error": "",
        "iTotalRecords": total,
        "iTotalDisplayRecords": total,
        "sEcho": 1,
        "aaData": rows,
    })
    .to_string()
}

/// Band detail page; `genre` is left out of the page when `None`
pub fn band_page(name: &str, genre: Option<&str>) -> String {
    let genre = genre
        .map(|g| format!("<dt>Genre:</dt><dd>{}</dd>", g))
        .unwrap_or_default();

    format!(
        r#"<html><body>
        <h1 class="band_name"><a href="/bands/x">{name}</a></h1>
        <div id="band_stats">
            <dl class="float_left">
                <dt>Country of origin:</dt><dd><a href="/lists/FI">Finland</a></dd>
                <dt>Status:</dt><dd class="active">Active</dd>
                <dt>Formed in:</dt><dd>1999</dd>
            </dl>
            <dl class="float_right">{genre}<dt>Themes:</dt><dd>Despair</dd></dl>
        </div>
        </body></html>"#
    )
}

/// Serve the listing of `letter` split into pages of `page_size`
pub async fn mount_listing(server: &MockServer, letter: &str, page_size: usize, links: &[String]) {
    let total = links.len();
    let pages = total / page_size + 1;

    for page in 0..pages {
        let start = (page * page_size).min(total);
        let end = ((page + 1) * page_size).min(total);
        Mock::given(method("GET"))
            .and(path(format!("/browse/ajax-letter/l/{}/json/1", letter)))
            .and(query_param("iDisplayStart", (page * page_size).to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_body(total, &links[start..end])),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Serve a band page at `url`
pub async fn mount_page(server: &MockServer, url: &str, body: String) {
    let page_path = url.trim_start_matches(&server.uri()).to_string();
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Configuration pointing at the mock server
pub fn test_config(server: &MockServer, database: &Path) -> IngestConfig {
    IngestConfig {
        base_url: server.uri(),
        letters: vec!["Q".to_string()],
        page_size: 5,
        max_workers: 3,
        database_path: database.to_path_buf(),
        ..Default::default()
    }
}

/// Fresh SQLite file inside `dir`
pub async fn open_loader(dir: &TempDir) -> TabularLoader {
    TabularLoader::connect(&dir.path().join("metal_db.sqlite"))
        .await
        .unwrap()
}

/// Run a `SELECT COUNT(*)` style query
pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}
