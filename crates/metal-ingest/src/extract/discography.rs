//! Discography page

use super::{element_text, first_anchor, table_rows};
use crate::models::{fields, last_path_segment, Record};
use scraper::Html;

const DISCOGRAPHY_TABLE: &str = "table.display.discog";

/// Album records listed on a band's discography page
///
/// Rows need exactly four cells and an anchor in the first one; header rows
/// and the "nothing entered yet" placeholder are skipped.
pub fn extract_albums(body: &str, band_id: &str) -> Vec<Record> {
    let document = Html::parse_document(body);

    table_rows(&document, DISCOGRAPHY_TABLE)
        .into_iter()
        .filter(|cells| cells.len() == 4)
        .filter_map(|cells| {
            let anchor = first_anchor(cells[0])?;
            let href = anchor.value().attr("href")?;

            let record = Record::album(band_id, last_path_segment(href))
                .with(fields::NAME, element_text(anchor))
                .with(fields::TYPE, element_text(cells[1]))
                .with(fields::YEAR, element_text(cells[2]))
                .with(fields::REVIEWS, element_text(cells[3]))
                .with(fields::ALBUM_URL, href);
            Some(record)
        })
        .collect()
}
