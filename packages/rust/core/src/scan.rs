//! `scan_laws_for_keyword`: concurrent title search over a range of law ids.
//!
//! Ids in `1..=limit` are checked on their own tasks. A task is spawned only
//! once a semaphore permit is free, so at most `concurrency` lookups exist at
//! a time, and an optional pause per lookup slows the scan down further.
//! Completions arrive in any order; the report is always sorted by id.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use slovlex_fetch::Fetcher;
use slovlex_metadata::parse_document;
use slovlex_shared::{LawIdentity, ScanConfig, ScanMatch, ScanOutcome, ScanReport, SourceConfig};

/// Progress callback for reporting scan status.
pub trait ScanProgress: Send + Sync {
    /// Called once before probing starts.
    fn started(&self, total: usize);
    /// Called after each lookup completes, in completion order.
    fn checked(&self, id: u32, done: usize, total: usize);
    /// Called when a checked title contains the keyword.
    fn matched(&self, found: &ScanMatch);
    /// Called when the scan completes.
    fn finished(&self, report: &ScanReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn started(&self, _total: usize) {}
    fn checked(&self, _id: u32, _done: usize, _total: usize) {}
    fn matched(&self, _found: &ScanMatch) {}
    fn finished(&self, _report: &ScanReport) {}
}

/// What a single lookup learned about one id.
enum Lookup {
    /// No document (404, timeout, connection failure).
    Missing,
    /// A body arrived but was not a well-formed document.
    Unreadable,
    /// Summary title, `"Unknown"` when the heading is missing.
    Titled(String),
}

/// Running totals, owned by the task driving the scan.
struct Tally<'a> {
    needle: String,
    total: usize,
    progress: &'a dyn ScanProgress,
    matches: Vec<ScanMatch>,
    documents_seen: usize,
    done: usize,
}

impl Tally<'_> {
    fn record(&mut self, joined: Result<(u32, Lookup), JoinError>) {
        self.done += 1;
        let (id, lookup) = match joined {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "lookup task failed");
                return;
            }
        };

        if let Lookup::Titled(title) = lookup {
            self.documents_seen += 1;
            if title.to_lowercase().contains(&self.needle) {
                info!(id, %title, "match");
                let found = ScanMatch { id, title };
                self.progress.matched(&found);
                self.matches.push(found);
            }
        }
        self.progress.checked(id, self.done, self.total);
    }
}

/// Search the titles of laws `1..=limit` of `year` for `keyword`.
///
/// Matching is a case-insensitive substring test on the summary title.
/// Failed or unparseable lookups are skipped without affecting the others.
#[instrument(skip_all, fields(year = year, keyword = %keyword, limit = limit))]
pub async fn scan_titles(
    fetcher: &Fetcher,
    source: &SourceConfig,
    config: &ScanConfig,
    year: u32,
    keyword: &str,
    limit: u32,
    progress: &dyn ScanProgress,
) -> ScanReport {
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut tally = Tally {
        needle: keyword.to_lowercase(),
        total: limit as usize,
        progress,
        matches: Vec::new(),
        documents_seen: 0,
        done: 0,
    };

    info!(
        concurrency = config.concurrency,
        rate_limit_ms = config.rate_limit.as_millis() as u64,
        "starting scan"
    );
    progress.started(tally.total);

    let mut lookups = JoinSet::new();
    for id in 1..=limit {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let fetcher = fetcher.clone();
        let url = source.xml_url(&LawIdentity::new(year, id));
        let timeout = config.timeout;
        let pause = config.rate_limit;

        lookups.spawn(async move {
            let _permit = permit;
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            (id, lookup_title(&fetcher, &url, timeout).await)
        });

        while let Some(joined) = lookups.try_join_next() {
            tally.record(joined);
        }
    }

    while let Some(joined) = lookups.join_next().await {
        tally.record(joined);
    }

    let documents_seen = tally.documents_seen;
    let report = ScanReport {
        year,
        keyword: keyword.to_string(),
        limit,
        documents_seen,
        outcome: ScanOutcome::from_unordered(tally.matches),
    };

    info!(
        documents_seen,
        matches = report.outcome.matches().len(),
        "scan completed"
    );
    progress.finished(&report);

    report
}

async fn lookup_title(fetcher: &Fetcher, url: &str, timeout: Duration) -> Lookup {
    let Some(body) = fetcher.get(url, timeout).await.into_body() else {
        return Lookup::Missing;
    };

    match parse_document(&body) {
        Ok(parsed) => Lookup::Titled(parsed.summary().title),
        Err(e) => {
            debug!(%url, error = %e, "skipping unparseable document");
            Lookup::Unreadable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use slovlex_shared::UNKNOWN_TITLE;

    use crate::test_support::{law_xml, source_for};

    fn scan_config(concurrency: usize, rate_limit_ms: u64) -> ScanConfig {
        ScanConfig {
            limit: 600,
            concurrency,
            timeout: Duration::from_secs(5),
            rate_limit: Duration::from_millis(rate_limit_ms),
        }
    }

    async fn mount_law(server: &MockServer, year: u32, id: u32, body: String, delay_ms: u64) {
        let route = format!("/static/xml/SK/ZZ/{year}/{id}/vyhlasene_znenie.xml");
        let response = ResponseTemplate::new(200)
            .set_body_string(body)
            .set_delay(Duration::from_millis(delay_ms));
        Mock::given(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn ids(report: &ScanReport) -> Vec<u32> {
        report.outcome.matches().iter().map(|m| m.id).collect()
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Mutex<Option<usize>>,
        checked: Mutex<Vec<u32>>,
        matched: Mutex<Vec<u32>>,
        finished: Mutex<bool>,
    }

    impl ScanProgress for RecordingProgress {
        fn started(&self, total: usize) {
            *self.started.lock().unwrap() = Some(total);
        }
        fn checked(&self, id: u32, _done: usize, _total: usize) {
            self.checked.lock().unwrap().push(id);
        }
        fn matched(&self, found: &ScanMatch) {
            self.matched.lock().unwrap().push(found.id);
        }
        fn finished(&self, _report: &ScanReport) {
            *self.finished.lock().unwrap() = true;
        }
    }

    #[tokio::test]
    async fn matches_are_sorted_regardless_of_completion_order() {
        let server = MockServer::start().await;
        // Slowest first so completions arrive as 42, 17, 3.
        let elections = law_xml("o podmienkach volieb do orgánov samosprávy");
        let turnout = law_xml("o podmienkach výkonu VOLIEB");
        let campaign = law_xml("o volebnej kampani a o financovaní volieb");
        mount_law(&server, 2024, 3, elections, 400).await;
        mount_law(&server, 2024, 17, turnout, 200).await;
        mount_law(&server, 2024, 42, campaign, 0).await;
        mount_law(&server, 2024, 5, law_xml("o dani z príjmov"), 0).await;
        mount_law(&server, 2024, 30, law_xml("o ochrane prírody"), 100).await;

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let progress = RecordingProgress::default();
        let report = scan_titles(
            &fetcher,
            &source_for(&server),
            &scan_config(20, 0),
            2024,
            "volieb",
            50,
            &progress,
        )
        .await;

        assert_eq!(ids(&report), vec![3, 17, 42]);
        assert_eq!(
            report.outcome.matches()[1].title,
            "o podmienkach výkonu VOLIEB"
        );
        assert_eq!(report.documents_seen, 5);
        assert_eq!(report.limit, 50);

        assert_eq!(*progress.started.lock().unwrap(), Some(50));
        assert_eq!(progress.checked.lock().unwrap().len(), 50);
        let mut matched = progress.matched.lock().unwrap().clone();
        matched.sort_unstable();
        assert_eq!(matched, vec![3, 17, 42]);
        assert!(*progress.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn no_matches_is_explicit() {
        let server = MockServer::start().await;
        mount_law(&server, 2023, 1, law_xml("o dani z pridanej hodnoty"), 0).await;

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let report = scan_titles(
            &fetcher,
            &source_for(&server),
            &scan_config(4, 0),
            2023,
            "volieb",
            10,
            &SilentProgress,
        )
        .await;

        assert_eq!(report.outcome, ScanOutcome::NoMatches);
        assert_eq!(report.documents_seen, 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn broken_documents_do_not_affect_others() {
        let server = MockServer::start().await;
        mount_law(&server, 2022, 1, "not xml".to_string(), 0).await;
        mount_law(&server, 2022, 2, law_xml("o voľbách"), 0).await;
        // Times out against the 200 ms lookup timeout.
        mount_law(&server, 2022, 3, law_xml("o voľbách prezidenta"), 2_000).await;
        Mock::given(path("/static/xml/SK/ZZ/2022/4/vyhlasene_znenie.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let mut config = scan_config(4, 0);
        config.timeout = Duration::from_millis(200);

        let report = scan_titles(
            &fetcher,
            &source_for(&server),
            &config,
            2022,
            "VOĽBÁCH",
            5,
            &SilentProgress,
        )
        .await;

        assert_eq!(ids(&report), vec![2]);
        assert_eq!(report.documents_seen, 1);
    }

    #[tokio::test]
    async fn untitled_documents_match_as_unknown() {
        let server = MockServer::start().await;
        let untitled = format!(
            r#"<ml:root xmlns:ml="{}"><ml:hcontainer name="clanok"/></ml:root>"#,
            slovlex_metadata::METALEX_NS
        );
        mount_law(&server, 2021, 1, untitled, 0).await;
        mount_law(&server, 2021, 2, "not xml".to_string(), 0).await;
        mount_law(&server, 2021, 3, law_xml("o neznámom pôvode"), 0).await;

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let report = scan_titles(
            &fetcher,
            &source_for(&server),
            &scan_config(2, 0),
            2021,
            "unknown",
            3,
            &SilentProgress,
        )
        .await;

        assert_eq!(ids(&report), vec![1]);
        assert_eq!(report.outcome.matches()[0].title, UNKNOWN_TITLE);
        assert_eq!(report.documents_seen, 2);
    }

    #[tokio::test]
    async fn huge_limit_spawns_lazily() {
        let server = MockServer::start().await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let source = source_for(&server);
        let config = scan_config(2, 0);

        // Tasks exist only for ids holding a permit, so the timer gets a turn.
        let scan = scan_titles(
            &fetcher,
            &source,
            &config,
            2024,
            "volieb",
            u32::MAX,
            &SilentProgress,
        );
        let cut_short = tokio::time::timeout(Duration::from_millis(300), scan).await;

        assert!(cut_short.is_err());
        let requests = server.received_requests().await.unwrap().len();
        assert!(requests > 0);
        assert!(requests < 1_000_000);
    }

    #[tokio::test]
    async fn gentle_mode_still_finds_matches() {
        let server = MockServer::start().await;
        let european = law_xml("o voľbách do Európskeho parlamentu");
        mount_law(&server, 2020, 2, european, 0).await;

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let started = std::time::Instant::now();
        let report = scan_titles(
            &fetcher,
            &source_for(&server),
            &scan_config(1, 50),
            2020,
            "európskeho",
            3,
            &SilentProgress,
        )
        .await;

        assert_eq!(ids(&report), vec![2]);
        // Three sequential lookups, each pausing 50 ms.
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn zero_limit_requests_nothing() {
        let server = MockServer::start().await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let report = scan_titles(
            &fetcher,
            &source_for(&server),
            &scan_config(20, 0),
            2024,
            "volieb",
            0,
            &SilentProgress,
        )
        .await;

        assert_eq!(report.outcome, ScanOutcome::NoMatches);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
