//! Core domain types for Slov-Lex law retrieval.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

/// Title reported when a document has no usable heading.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Title reported when a document could not be parsed at all.
pub const PARSE_ERROR_TITLE: &str = "Parse Error";

/// Publication-related dates found in one document's metadata.
///
/// Deduplicated and iterated in ascending order.
pub type CandidateDateSet = BTreeSet<NaiveDate>;

// ---------------------------------------------------------------------------
// LawIdentity
// ---------------------------------------------------------------------------

/// Key of one legislative act in the collection: year plus sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LawIdentity {
    pub year: u32,
    pub id: u32,
}

impl LawIdentity {
    pub fn new(year: u32, id: u32) -> Self {
        Self { year, id }
    }

    /// Local directory holding this law's artifacts (`{root}/downloads/{year}/{id}`).
    pub fn download_dir(&self, root: &Path) -> PathBuf {
        root.join("downloads")
            .join(self.year.to_string())
            .join(self.id.to_string())
    }

    /// File name of the stored XML (`law_{year}_{id}.xml`).
    pub fn xml_filename(&self) -> String {
        format!("law_{}_{}.xml", self.year, self.id)
    }

    /// File name of the published PDF for a `YYYYMMDD` date stamp.
    pub fn pdf_filename(&self, date_stamp: &str) -> String {
        format!("ZZ_{}_{}_{date_stamp}.pdf", self.year, self.id)
    }
}

impl std::fmt::Display for LawIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.year, self.id)
    }
}

// ---------------------------------------------------------------------------
// LawSummary
// ---------------------------------------------------------------------------

/// Title and article count of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LawSummary {
    pub title: String,
    pub article_count: usize,
}

impl LawSummary {
    /// Summary used when the document is not parseable.
    pub fn parse_error() -> Self {
        Self {
            title: PARSE_ERROR_TITLE.into(),
            article_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// PdfResolution
// ---------------------------------------------------------------------------

/// Outcome of guessing the PDF file name from metadata dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PdfResolution {
    /// A guess resolved and the PDF was written to `path`.
    Found { filename: String, path: PathBuf },
    /// No guess resolved. `attempts` is the number of URLs checked.
    NotFound { attempts: usize },
}

impl PdfResolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Found { filename, .. } => Some(filename),
            Self::NotFound { .. } => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found { path, .. } => Some(path),
            Self::NotFound { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch pipeline results
// ---------------------------------------------------------------------------

/// Everything learned while downloading one law.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedLaw {
    pub identity: LawIdentity,
    pub summary: LawSummary,
    pub pdf: PdfResolution,
    /// Dates the PDF guesses were derived from.
    pub candidate_dates: Vec<NaiveDate>,
    /// Directory holding the downloaded artifacts.
    pub directory: PathBuf,
    /// Path of the stored XML document.
    pub xml_path: PathBuf,
    /// SHA-256 of the XML bytes, hex encoded.
    pub xml_sha256: String,
}

/// Result of `fetch_specific_law`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LawFetchOutcome {
    /// The XML was downloaded; the PDF may or may not have been found.
    Fetched(FetchedLaw),
    /// The origin has no XML for this identity.
    NotFound { identity: LawIdentity },
}

impl LawFetchOutcome {
    pub fn identity(&self) -> LawIdentity {
        match self {
            Self::Fetched(law) => law.identity,
            Self::NotFound { identity } => *identity,
        }
    }
}

// ---------------------------------------------------------------------------
// Scan pipeline results
// ---------------------------------------------------------------------------

/// A law whose title contained the scanned keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanMatch {
    pub id: u32,
    pub title: String,
}

/// Matches of a keyword scan, or the explicit absence of any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "matches", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Sorted ascending by id.
    Matches(Vec<ScanMatch>),
    NoMatches,
}

impl ScanOutcome {
    /// Build an outcome from matches in any order.
    pub fn from_unordered(mut matches: Vec<ScanMatch>) -> Self {
        if matches.is_empty() {
            return Self::NoMatches;
        }
        matches.sort_by_key(|m| m.id);
        Self::Matches(matches)
    }

    pub fn matches(&self) -> &[ScanMatch] {
        match self {
            Self::Matches(matches) => matches,
            Self::NoMatches => &[],
        }
    }
}

/// Summary of a completed keyword scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub year: u32,
    pub keyword: String,
    /// Highest identifier checked.
    pub limit: u32,
    /// Number of identifiers that returned a parseable document.
    pub documents_seen: usize,
    pub outcome: ScanOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_layout() {
        let law = LawIdentity::new(2024, 181);
        assert_eq!(
            law.download_dir(Path::new("/data")),
            PathBuf::from("/data/downloads/2024/181")
        );
        assert_eq!(law.xml_filename(), "law_2024_181.xml");
        assert_eq!(law.pdf_filename("20240628"), "ZZ_2024_181_20240628.pdf");
        assert_eq!(law.to_string(), "2024/181");
    }

    #[test]
    fn scan_outcome_sorts_by_id() {
        let outcome = ScanOutcome::from_unordered(vec![
            ScanMatch { id: 42, title: "c".into() },
            ScanMatch { id: 3, title: "a".into() },
            ScanMatch { id: 17, title: "b".into() },
        ]);
        let ids: Vec<u32> = outcome.matches().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 17, 42]);
    }

    #[test]
    fn empty_scan_is_no_matches() {
        assert_eq!(
            ScanOutcome::from_unordered(Vec::new()),
            ScanOutcome::NoMatches
        );
        assert!(ScanOutcome::NoMatches.matches().is_empty());
    }

    #[test]
    fn pdf_resolution_accessors() {
        let found = PdfResolution::Found {
            filename: "ZZ_2020_1_20200514.pdf".into(),
            path: PathBuf::from("/tmp/ZZ_2020_1_20200514.pdf"),
        };
        assert!(found.is_found());
        assert_eq!(found.filename(), Some("ZZ_2020_1_20200514.pdf"));

        let missing = PdfResolution::NotFound { attempts: 5 };
        assert!(!missing.is_found());
        assert!(missing.path().is_none());
    }

    #[test]
    fn outcomes_serialize_with_status_tag() {
        let outcome = LawFetchOutcome::NotFound {
            identity: LawIdentity::new(1900, 999_999),
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["identity"]["id"], 999_999);

        let scan = ScanOutcome::NoMatches;
        let json = serde_json::to_value(&scan).expect("serialize");
        assert_eq!(json["status"], "no_matches");
    }
}
