//! Law discovery and retrieval for the Slov-Lex collection.
//!
//! This crate ties the metadata parser and the fetcher into the two
//! user-facing workflows:
//! - [`law`]: download one law's XML and PDF, then summarize it
//! - [`scan`]: concurrent keyword search over a year's law titles
//!
//! [`LawTools`] exposes both behind one configured value.

pub mod law;
pub mod pdf;
pub mod scan;
pub mod tools;

pub use pdf::{DATE_DRIFT_DAYS, PdfResolver, pdf_date_guesses};
pub use scan::{ScanProgress, SilentProgress};
pub use tools::LawTools;
