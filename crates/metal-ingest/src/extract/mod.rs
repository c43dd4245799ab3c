//! Record extraction from fetched pages
//!
//! Extractors never fail: a field whose element is missing is left out of
//! the record, and a table row with an unexpected shape is skipped. The
//! identifiers always come from the request URL, not from the page.

mod band;
mod discography;
mod tracklist;

pub use band::{extract_band, BAND_LABELS};
pub use discography::extract_albums;
pub use tracklist::extract_songs;

use scraper::{ElementRef, Html, Selector};

/// Trimmed text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First element matching `css` anywhere in the document
pub(crate) fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Data rows of the first table matching `table_css`
///
/// Each row is returned as its direct `td`/`th` cells.
pub(crate) fn table_rows<'a>(document: &'a Html, table_css: &str) -> Vec<Vec<ElementRef<'a>>> {
    let Some(table) = select_first(document, table_css) else {
        return Vec::new();
    };
    let Ok(row_selector) = Selector::parse("tr") else {
        return Vec::new();
    };

    table
        .select(&row_selector)
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .collect()
        })
        .collect()
}

/// First anchor inside `cell`
pub(crate) fn first_anchor(cell: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("a").ok()?;
    cell.select(&selector).next()
}
