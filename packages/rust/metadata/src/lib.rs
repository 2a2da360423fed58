//! Metadata extraction from Slov-Lex promulgated-wording XML.
//!
//! Law documents are published in the Metalex schema. This crate reads the
//! official heading, counts articles, and collects the publication-related
//! dates that the PDF resolver turns into file name guesses.
//!
//! Both public entry points degrade instead of failing: [`summarize`] falls
//! back to sentinel titles and [`extract_candidate_dates`] to an empty set.
//! Callers that need to tell a broken document apart use [`parse_document`].

mod parser;

use chrono::NaiveDate;
use slovlex_shared::{CandidateDateSet, LawSummary};
use tracing::debug;

pub use parser::{METALEX_NS, MetaProperty, ParsedLaw, parse_document};

/// Metadata properties whose content carries a usable date.
pub const DATE_PROPERTIES: [&str; 3] = [
    "slovlex-owl:platny",
    "slovlex-owl:ucinny",
    "slovlex-owl:vyhlaseny",
];

/// Marker introducing the start of a validity interval inside `content`.
const INTERVAL_START: &str = "zaciatok=";

/// Title and article count of a document.
///
/// Unparseable input yields `{"Parse Error", 0}`; a missing heading yields `"Unknown"`.
pub fn summarize(xml: &[u8]) -> LawSummary {
    match parse_document(xml) {
        Ok(parsed) => parsed.summary(),
        Err(e) => {
            debug!(error = %e, "document not parseable, using sentinel summary");
            LawSummary::parse_error()
        }
    }
}

/// Dates found in the document's effective/valid/promulgated metadata.
pub fn extract_candidate_dates(xml: &[u8]) -> CandidateDateSet {
    match parse_document(xml) {
        Ok(parsed) => candidate_dates(&parsed.meta),
        Err(e) => {
            debug!(error = %e, "document not parseable, no candidate dates");
            CandidateDateSet::new()
        }
    }
}

/// Reduce metadata entries to the set of recognized, well-formed dates.
pub fn candidate_dates(meta: &[MetaProperty]) -> CandidateDateSet {
    meta.iter()
        .filter(|m| DATE_PROPERTIES.contains(&m.property.as_str()))
        .filter_map(|m| {
            let date = parse_meta_date(&m.content);
            if date.is_none() {
                debug!(property = %m.property, content = %m.content, "skipping unparsable date");
            }
            date
        })
        .collect()
}

/// Parse either a bare `YYYY-MM-DD` or the start of a `zaciatok=..;` interval.
fn parse_meta_date(content: &str) -> Option<NaiveDate> {
    let raw = match content.rsplit_once(INTERVAL_START) {
        Some((_, rest)) => rest.split_once(';').map_or(rest, |(start, _)| start),
        None => content,
    };
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
