//! Band detail page

use super::{element_text, select_first};
use crate::models::{fields, EntityReference, Record};
use scraper::{ElementRef, Html, Selector};

/// Labels read from the `dt`/`dd` description lists, in probe order
pub const BAND_LABELS: &[&str] = &[
    fields::COUNTRY,
    fields::LOCATION,
    fields::STATUS,
    fields::FORMED_IN,
    fields::GENRE,
    fields::THEMES,
    fields::LAST_LABEL,
    fields::YEARS_ACTIVE,
];

/// Extract a band record from its detail page
pub fn extract_band(body: &str, reference: &EntityReference) -> Record {
    let document = Html::parse_document(body);
    let mut record = Record::band(reference.identifier());

    if let Some(name) = select_first(&document, "h1.band_name a") {
        record.set(fields::BAND_NAME, element_text(name));
    }

    let terms = description_terms(&document);
    for label in BAND_LABELS {
        if let Some(value) = definition_for(&terms, label) {
            record.set(label, value);
        }
    }

    record
}

/// Every `dt` and `dd` element, in document order
fn description_terms(document: &Html) -> Vec<ElementRef<'_>> {
    match Selector::parse("dt, dd") {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Text of the first `dd` following the `dt` whose text is `label:`
fn definition_for(terms: &[ElementRef<'_>], label: &str) -> Option<String> {
    let position = terms.iter().position(|term| {
        term.value().name() == "dt"
            && element_text(*term)
                .strip_suffix(':')
                .is_some_and(|text| text.trim_end() == label)
    })?;

    terms[position + 1..]
        .iter()
        .find(|term| term.value().name() == "dd")
        .map(|dd| element_text(*dd))
}
