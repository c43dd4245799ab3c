//! Album track list page

use super::{element_text, first_anchor, table_rows};
use crate::models::{fields, EntityReference, Record};
use scraper::Html;

const TRACKLIST_TABLE: &str = "table.display.table_lyrics";

/// Song records listed on an album page
///
/// A track row is four cells whose first cell holds a named anchor; the
/// anchor name is the song id. Lyrics rows and the total-length footer
/// don't match and are dropped.
pub fn extract_songs(body: &str, album: &EntityReference) -> Vec<Record> {
    let document = Html::parse_document(body);
    let album_id = album.identifier();

    table_rows(&document, TRACKLIST_TABLE)
        .into_iter()
        .filter(|cells| cells.len() == 4)
        .filter_map(|cells| {
            let song_id = first_anchor(cells[0])?.value().attr("name")?;
            let record = Record::song(album_id, song_id)
                .with(fields::NAME, element_text(cells[1]))
                .with(fields::LENGTH, element_text(cells[2]));
            Some(record)
        })
        .collect()
}
