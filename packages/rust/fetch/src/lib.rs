//! Remote retrieval for the Slov-Lex static origin.
//!
//! [`Fetcher`] is the only component that performs network I/O or writes
//! downloaded artifacts. Every call makes exactly one attempt and reports
//! failure as [`Fetched::Absent`] rather than as an error.

mod fetcher;

pub use fetcher::{Absence, BROWSER_USER_AGENT, Fetched, Fetcher};
