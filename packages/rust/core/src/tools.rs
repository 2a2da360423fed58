//! The two operations offered to callers: fetch one law, scan for a keyword.

use tracing::instrument;

use slovlex_fetch::Fetcher;
use slovlex_shared::{
    AppConfig, FetchConfig, LawFetchOutcome, LawIdentity, Result, ScanConfig, ScanReport,
    SourceConfig,
};

use crate::law::fetch_law;
use crate::scan::{ScanProgress, scan_titles};

/// Entry point bundling the HTTP client with immutable runtime configuration.
///
/// The two operations are independent; neither calls the other.
#[derive(Debug, Clone)]
pub struct LawTools {
    fetcher: Fetcher,
    source: SourceConfig,
    fetch: FetchConfig,
    scan: ScanConfig,
}

impl LawTools {
    pub fn new(source: SourceConfig, fetch: FetchConfig, scan: ScanConfig) -> Result<Self> {
        let fetcher = Fetcher::new(fetch.timeout)?;
        Ok(Self {
            fetcher,
            source,
            fetch,
            scan,
        })
    }

    /// Build from a loaded config file without CLI overrides.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            SourceConfig::try_from(config)?,
            FetchConfig::from(config),
            ScanConfig::from(config),
        )
    }

    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch
    }

    pub fn scan_config(&self) -> &ScanConfig {
        &self.scan
    }

    /// Download the XML and best-effort PDF of law `year/id`.
    pub async fn fetch_specific_law(&self, year: u32, id: u32) -> LawFetchOutcome {
        fetch_law(
            &self.fetcher,
            &self.source,
            &self.fetch,
            LawIdentity::new(year, id),
        )
        .await
    }

    /// Search titles of laws `1..=limit` of `year`; `None` uses the configured limit.
    #[instrument(skip(self, progress))]
    pub async fn scan_laws_for_keyword(
        &self,
        year: u32,
        keyword: &str,
        limit: Option<u32>,
        progress: &dyn ScanProgress,
    ) -> ScanReport {
        let limit = limit.unwrap_or(self.scan.limit);
        scan_titles(
            &self.fetcher,
            &self.source,
            &self.scan,
            year,
            keyword,
            limit,
            progress,
        )
        .await
    }
}
