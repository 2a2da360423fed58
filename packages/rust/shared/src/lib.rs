//! Shared types, error model, and configuration for slovlex.
//!
//! This crate is the foundation depended on by all other slovlex crates.
//! It provides:
//! - [`SlovLexError`], the unified error type
//! - Domain types ([`LawIdentity`], [`LawSummary`], [`PdfResolution`], [`ScanReport`])
//! - Configuration ([`AppConfig`], [`SourceConfig`], [`FetchConfig`], [`ScanConfig`])

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, FetchSection, ScanConfig, ScanSection, SourceConfig, SourceSection,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{Result, SlovLexError};
pub use types::{
    CandidateDateSet, FetchedLaw, LawFetchOutcome, LawIdentity, LawSummary, PARSE_ERROR_TITLE,
    PdfResolution, ScanMatch, ScanOutcome, ScanReport, UNKNOWN_TITLE,
};
