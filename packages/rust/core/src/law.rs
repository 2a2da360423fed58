//! `fetch_specific_law`: XML download, PDF discovery and summary for one law.

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use slovlex_fetch::Fetcher;
use slovlex_shared::{FetchConfig, FetchedLaw, LawFetchOutcome, LawIdentity, SourceConfig};

use crate::pdf::PdfResolver;

/// Download a law's promulgated XML, look for its PDF and summarize it.
///
/// A missing XML document is the only unsuccessful outcome. A PDF that cannot
/// be located is reported inside the successful result. The download
/// directory is created on the first successful write, so a missing law
/// leaves nothing on disk.
#[instrument(skip_all, fields(law = %law))]
pub async fn fetch_law(
    fetcher: &Fetcher,
    source: &SourceConfig,
    config: &FetchConfig,
    law: LawIdentity,
) -> LawFetchOutcome {
    let directory = law.download_dir(&config.root);
    let xml_path = directory.join(law.xml_filename());
    let xml_url = source.xml_url(&law);

    info!(%xml_url, "fetching law");

    let Some(xml) = fetcher
        .download(&xml_url, &xml_path, config.timeout)
        .await
        .into_body()
    else {
        info!("law XML not found");
        return LawFetchOutcome::NotFound { identity: law };
    };

    let dates = slovlex_metadata::extract_candidate_dates(&xml);
    let pdf = PdfResolver::new(fetcher, source, config.timeout)
        .resolve(&law, &dates, &directory)
        .await;
    let summary = slovlex_metadata::summarize(&xml);

    info!(
        title = %summary.title,
        articles = summary.article_count,
        pdf_found = pdf.is_found(),
        "law fetched"
    );

    LawFetchOutcome::Fetched(FetchedLaw {
        identity: law,
        summary,
        pdf,
        candidate_dates: dates.into_iter().collect(),
        directory,
        xml_path,
        xml_sha256: compute_hash(&xml),
    })
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
