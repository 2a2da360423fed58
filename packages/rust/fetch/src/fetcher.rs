//! Single-attempt HTTP retrieval with optional persistence to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use slovlex_shared::{Result, SlovLexError};

/// Browser User-Agent sent with every request. The origin rejects clients
/// that identify as scripts or libraries.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.5481.100 Safari/537.36";

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Fetched
// ---------------------------------------------------------------------------

/// Outcome of one retrieval attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// HTTP 200 with this body.
    Body(Vec<u8>),
    /// Nothing usable was retrieved.
    Absent(Absence),
}

impl Fetched {
    /// The body, discarding the reason for absence.
    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            Self::Body(body) => Some(body),
            Self::Absent(_) => None,
        }
    }
}

/// Why a retrieval produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Absence {
    /// The origin answered with something other than 200.
    #[error("HTTP {0}")]
    Status(u16),

    /// Timeout, DNS, connection or body read failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The body arrived but could not be stored.
    #[error("could not write {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP client for the Slov-Lex static origin.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher whose requests time out after `default_timeout`
    /// unless a call passes its own timeout.
    pub fn new(default_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(default_timeout)
            .build()
            .map_err(|e| SlovLexError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// One GET of `url`. Only status 200 yields a body.
    pub async fn get(&self, url: &str, timeout: Duration) -> Fetched {
        debug!(%url, timeout_ms = timeout.as_millis() as u64, "requesting");

        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "request failed");
                return Fetched::Absent(Absence::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%url, status = status.as_u16(), "non-success status");
            return Fetched::Absent(Absence::Status(status.as_u16()));
        }

        match response.bytes().await {
            Ok(body) => Fetched::Body(body.to_vec()),
            Err(e) => {
                debug!(%url, error = %e, "body read failed");
                Fetched::Absent(Absence::Transport(format!("body read failed: {e}")))
            }
        }
    }

    /// GET `url` and, on success, write the body to `dest`.
    ///
    /// Parent directories are created as needed and an existing file is
    /// overwritten. Nothing is written when the retrieval is absent.
    pub async fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Fetched {
        let body = match self.get(url, timeout).await {
            Fetched::Body(body) => body,
            absent => return absent,
        };

        if let Err(e) = write_body(dest, &body).await {
            warn!(path = %dest.display(), error = %e, "failed to store download");
            return Fetched::Absent(Absence::Write {
                path: dest.to_path_buf(),
                message: e.to_string(),
            });
        }

        debug!(%url, path = %dest.display(), bytes = body.len(), "stored download");
        Fetched::Body(body)
    }
}

async fn write_body(dest: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, body).await
}
