//! Catalog data model
//!
//! Records are flat label → value maps. Only the identifier labels are
//! guaranteed to be present; every other field is set when the page had it.

use std::collections::BTreeMap;
use std::fmt;

/// Field labels, as extracted from pages (normalized to column names at load)
pub mod fields {
    pub const BAND_ID: &str = "Band ID";
    pub const BAND_NAME: &str = "Band Name";
    pub const COUNTRY: &str = "Country of origin";
    pub const LOCATION: &str = "Location";
    pub const STATUS: &str = "Status";
    pub const FORMED_IN: &str = "Formed in";
    pub const GENRE: &str = "Genre";
    pub const THEMES: &str = "Themes";
    pub const LAST_LABEL: &str = "Last label";
    pub const YEARS_ACTIVE: &str = "Years active";

    pub const ALBUM_ID: &str = "Album ID";
    pub const ALBUM_URL: &str = "Album URL";
    pub const NAME: &str = "Name";
    pub const TYPE: &str = "Type";
    pub const YEAR: &str = "Year";
    pub const REVIEWS: &str = "Reviews";

    pub const SONG_ID: &str = "Song ID";
    pub const LENGTH: &str = "Length";
}

/// One slice of the listing space (an index letter such as `Q` or `NBR`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locator of one detail page
///
/// The same entity may be discovered under two partitions; duplicates are
/// kept here and collapse at load time on the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityReference(String);

impl EntityReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }

    /// Trailing path segment, which the catalog uses as the entity identifier
    pub fn identifier(&self) -> &str {
        last_path_segment(&self.0)
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last non-empty `/`-separated segment, ignoring any query string or fragment
pub fn last_path_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Record variants, one per destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Band,
    Album,
    Song,
}

impl RecordKind {
    /// Identifier labels of this kind; the primary one comes last
    pub fn identifier_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Band => &[fields::BAND_ID],
            RecordKind::Album => &[fields::BAND_ID, fields::ALBUM_ID],
            RecordKind::Song => &[fields::ALBUM_ID, fields::SONG_ID],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Band => f.write_str("band"),
            RecordKind::Album => f.write_str("album"),
            RecordKind::Song => f.write_str("song"),
        }
    }
}

/// Flat record extracted from one page (or one row of a listing page)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: RecordKind,
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn band(band_id: impl Into<String>) -> Self {
        Self::empty(RecordKind::Band).with(fields::BAND_ID, band_id)
    }

    pub fn album(band_id: impl Into<String>, album_id: impl Into<String>) -> Self {
        Self::empty(RecordKind::Album)
            .with(fields::BAND_ID, band_id)
            .with(fields::ALBUM_ID, album_id)
    }

    pub fn song(album_id: impl Into<String>, song_id: impl Into<String>) -> Self {
        Self::empty(RecordKind::Song)
            .with(fields::ALBUM_ID, album_id)
            .with(fields::SONG_ID, song_id)
    }

    /// A record with no fields at all; only useful for building records by hand
    pub fn empty(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, label: &str, value: impl Into<String>) -> Self {
        self.set(label, value);
        self
    }

    pub fn set(&mut self, label: &str, value: impl Into<String>) {
        self.fields.insert(label.to_string(), value.into());
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Primary identifier (band id, album id or song id)
    pub fn id(&self) -> Option<&str> {
        self.kind
            .identifier_fields()
            .last()
            .and_then(|label| self.get(label))
    }

    /// Field labels present on this record, in label order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("https://www.metal-archives.com/bands/Queen/9311"),
            "9311"
        );
        assert_eq!(last_path_segment("https://example.org/albums/A/B/77/"), "77");
        assert_eq!(last_path_segment("https://example.org/bands/X/5?tab=all"), "5");
        assert_eq!(last_path_segment("plain"), "plain");
    }

    #[test]
    fn test_reference_identifier() {
        let reference = EntityReference::new("https://www.metal-archives.com/bands/Qntal/3540");
        assert_eq!(reference.identifier(), "3540");
    }

    #[test]
    fn test_constructors_carry_identifiers() {
        let band = Record::band("1");
        assert_eq!(band.id(), Some("1"));
        assert_eq!(band.len(), 1);

        let album = Record::album("1", "22");
        assert_eq!(album.id(), Some("22"));
        assert_eq!(album.get(fields::BAND_ID), Some("1"));

        let song = Record::song("22", "333").with(fields::NAME, "Intro");
        assert_eq!(song.id(), Some("333"));
        assert_eq!(song.get(fields::NAME), Some("Intro"));
    }

    #[test]
    fn test_id_ignores_parent_identifier() {
        let orphan = Record::empty(RecordKind::Album).with(fields::BAND_ID, "1");
        assert_eq!(orphan.id(), None);

        let song = Record::empty(RecordKind::Song).with(fields::ALBUM_ID, "22");
        assert_eq!(song.id(), None);
        assert_eq!(song.with(fields::SONG_ID, "333").id(), Some("333"));
    }
}
