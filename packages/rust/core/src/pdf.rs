//! PDF discovery by date guessing.
//!
//! PDFs are published under a file name that embeds a date stamp not linked
//! from the XML. The stamp usually sits within a couple of days of one of the
//! metadata dates, so every candidate date is widened to a small window and
//! the resulting stamps are checked in ascending order.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{debug, info, instrument, warn};

use slovlex_fetch::{Fetched, Fetcher};
use slovlex_shared::{CandidateDateSet, LawIdentity, PdfResolution, SourceConfig};

/// Days checked on each side of a candidate date.
pub const DATE_DRIFT_DAYS: i64 = 2;

/// Date stamps (`YYYYMMDD`) to try, deduplicated and in ascending order.
pub fn pdf_date_guesses(dates: &CandidateDateSet) -> Vec<String> {
    let stamps: BTreeSet<String> = dates
        .iter()
        .flat_map(|date| {
            (-DATE_DRIFT_DAYS..=DATE_DRIFT_DAYS)
                .filter_map(move |offset| date.checked_add_signed(TimeDelta::days(offset)))
        })
        .map(|date| date.format("%Y%m%d").to_string())
        .collect();

    stamps.into_iter().collect()
}

/// Tries guessed PDF URLs until one resolves.
pub struct PdfResolver<'a> {
    fetcher: &'a Fetcher,
    source: &'a SourceConfig,
    timeout: Duration,
}

impl<'a> PdfResolver<'a> {
    pub fn new(fetcher: &'a Fetcher, source: &'a SourceConfig, timeout: Duration) -> Self {
        Self {
            fetcher,
            source,
            timeout,
        }
    }

    /// Download the first guess that exists into `dest_dir`.
    ///
    /// Probing is sequential and stops at the first hit, so the earliest
    /// stamp wins. An empty date set makes no requests.
    #[instrument(skip_all, fields(law = %law, candidates = dates.len()))]
    pub async fn resolve(
        &self,
        law: &LawIdentity,
        dates: &CandidateDateSet,
        dest_dir: &Path,
    ) -> PdfResolution {
        if dates.is_empty() {
            warn!("no metadata dates to guess the PDF name from");
            return PdfResolution::NotFound { attempts: 0 };
        }

        let stamps = pdf_date_guesses(dates);

        for (attempt, stamp) in stamps.iter().enumerate() {
            let filename = law.pdf_filename(stamp);
            let url = self.source.pdf_url(law, stamp);
            let path = dest_dir.join(&filename);

            match self.fetcher.download(&url, &path, self.timeout).await {
                Fetched::Body(_) => {
                    info!(%filename, attempt = attempt + 1, "PDF found");
                    return PdfResolution::Found { filename, path };
                }
                Fetched::Absent(reason) => {
                    debug!(%filename, %reason, "PDF guess missed");
                }
            }
        }

        info!(attempts = stamps.len(), "no PDF matched any date guess");
        PdfResolution::NotFound {
            attempts: stamps.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, source_for, temp_root};
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PDF_PREFIX: &str = "/pdf/SK/ZZ/2020/123";

    fn dates(list: &[(i32, u32, u32)]) -> CandidateDateSet {
        list.iter().map(|&(y, m, d)| date(y, m, d)).collect()
    }

    #[test]
    fn guesses_cover_window_in_order() {
        let guesses = pdf_date_guesses(&dates(&[(2020, 5, 14)]));
        assert_eq!(
            guesses,
            vec!["20200512", "20200513", "20200514", "20200515", "20200516"]
        );
    }

    #[test]
    fn guesses_cross_month_boundaries() {
        let guesses = pdf_date_guesses(&dates(&[(2021, 3, 1)]));
        assert_eq!(
            guesses,
            vec!["20210227", "20210228", "20210301", "20210302", "20210303"]
        );
    }

    #[test]
    fn overlapping_windows_are_deduplicated() {
        let guesses = pdf_date_guesses(&dates(&[(2020, 5, 14), (2020, 5, 15)]));
        assert_eq!(guesses.len(), 6);
        assert_eq!(guesses.first().map(String::as_str), Some("20200512"));
        assert_eq!(guesses.last().map(String::as_str), Some("20200517"));
    }

    #[test]
    fn no_dates_no_guesses() {
        assert!(pdf_date_guesses(&CandidateDateSet::new()).is_empty());
    }

    #[tokio::test]
    async fn tries_in_ascending_order_and_stops_at_first_hit() {
        let server = MockServer::start().await;
        Mock::given(path(format!("{PDF_PREFIX}/ZZ_2020_123_20200515.pdf")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let source = source_for(&server);
        let root = temp_root("pdf-order");
        let law = LawIdentity::new(2020, 123);

        let resolution = PdfResolver::new(&fetcher, &source, Duration::from_secs(5))
            .resolve(&law, &dates(&[(2020, 5, 14)]), &root)
            .await;

        assert_eq!(resolution.filename(), Some("ZZ_2020_123_20200515.pdf"));
        assert_eq!(
            std::fs::read(root.join("ZZ_2020_123_20200515.pdf")).unwrap(),
            b"%PDF-1.4"
        );

        let requested: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(
            requested,
            vec![
                format!("{PDF_PREFIX}/ZZ_2020_123_20200512.pdf"),
                format!("{PDF_PREFIX}/ZZ_2020_123_20200513.pdf"),
                format!("{PDF_PREFIX}/ZZ_2020_123_20200514.pdf"),
                format!("{PDF_PREFIX}/ZZ_2020_123_20200515.pdf"),
            ]
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn exhausted_guesses_are_not_found() {
        let server = MockServer::start().await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let source = source_for(&server);
        let root = temp_root("pdf-missing");

        let resolution = PdfResolver::new(&fetcher, &source, Duration::from_secs(5))
            .resolve(
                &LawIdentity::new(2020, 123),
                &dates(&[(2020, 5, 14), (2020, 6, 1)]),
                &root,
            )
            .await;

        assert_eq!(resolution, PdfResolution::NotFound { attempts: 10 });
        assert_eq!(server.received_requests().await.unwrap().len(), 10);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn empty_date_set_skips_probing() {
        let server = MockServer::start().await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let source = source_for(&server);

        let resolution = PdfResolver::new(&fetcher, &source, Duration::from_secs(5))
            .resolve(
                &LawIdentity::new(2020, 123),
                &CandidateDateSet::new(),
                &temp_root("pdf-empty"),
            )
            .await;

        assert_eq!(resolution, PdfResolution::NotFound { attempts: 0 });
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
