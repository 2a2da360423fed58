//! Application configuration for slovlex.
//!
//! User config lives at `~/.slovlex/slovlex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SlovLexError};
use crate::types::LawIdentity;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "slovlex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".slovlex";

/// File name of the promulgated wording inside each law's XML directory.
const XML_DOCUMENT_NAME: &str = "vyhlasene_znenie.xml";

// ---------------------------------------------------------------------------
// Config structs (matching slovlex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote origin locations.
    #[serde(default)]
    pub source: SourceSection,

    /// Single-law download settings.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Keyword scan settings.
    #[serde(default)]
    pub scan: ScanSection,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Base URL of the XML collection.
    #[serde(default = "default_xml_base_url")]
    pub xml_base_url: String,

    /// Base URL of the PDF collection.
    #[serde(default = "default_pdf_base_url")]
    pub pdf_base_url: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            xml_base_url: default_xml_base_url(),
            pdf_base_url: default_pdf_base_url(),
        }
    }
}

fn default_xml_base_url() -> String {
    "https://static.slov-lex.sk/static/xml/SK/ZZ".into()
}
fn default_pdf_base_url() -> String {
    "https://static.slov-lex.sk/pdf/SK/ZZ".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Directory under which `downloads/` is created.
    #[serde(default = "default_download_root")]
    pub download_root: String,

    /// Per-request timeout for XML and PDF downloads.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            download_root: default_download_root(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_download_root() -> String {
    ".".into()
}
fn default_fetch_timeout() -> u64 {
    10
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    /// Highest law identifier checked when no limit is given.
    #[serde(default = "default_scan_limit")]
    pub limit: u32,

    /// Maximum in-flight lookups.
    #[serde(default = "default_scan_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout.
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,

    /// Pause each lookup takes before its request, in ms.
    #[serde(default)]
    pub rate_limit_ms: u64,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            limit: default_scan_limit(),
            concurrency: default_scan_concurrency(),
            timeout_secs: default_scan_timeout(),
            rate_limit_ms: 0,
        }
    }
}

fn default_scan_limit() -> u32 {
    600
}
fn default_scan_concurrency() -> u32 {
    20
}
fn default_scan_timeout() -> u64 {
    5
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Validated origin locations used to build document URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    xml_base: String,
    pdf_base: String,
}

impl SourceConfig {
    /// Validate both base URLs. Trailing slashes are dropped.
    pub fn new(xml_base: &str, pdf_base: &str) -> Result<Self> {
        Ok(Self {
            xml_base: validate_base_url("xml_base_url", xml_base)?,
            pdf_base: validate_base_url("pdf_base_url", pdf_base)?,
        })
    }

    /// `{xml_base}/{year}/{id}/vyhlasene_znenie.xml`
    pub fn xml_url(&self, law: &LawIdentity) -> String {
        format!(
            "{}/{}/{}/{XML_DOCUMENT_NAME}",
            self.xml_base, law.year, law.id
        )
    }

    /// `{pdf_base}/{year}/{id}/ZZ_{year}_{id}_{date}.pdf`
    pub fn pdf_url(&self, law: &LawIdentity, date_stamp: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.pdf_base,
            law.year,
            law.id,
            law.pdf_filename(date_stamp)
        )
    }
}

impl TryFrom<&AppConfig> for SourceConfig {
    type Error = SlovLexError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Self::new(&config.source.xml_base_url, &config.source.pdf_base_url)
    }
}

fn validate_base_url(key: &str, raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| SlovLexError::config(format!("{key} '{raw}' is not a valid URL: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SlovLexError::config(format!(
            "{key} '{raw}' must use http or https"
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Runtime settings for single-law downloads.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory under which `downloads/` is created.
    pub root: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            root: PathBuf::from(&config.fetch.download_root),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
        }
    }
}

/// Runtime settings for keyword scans.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Default highest identifier checked.
    pub limit: u32,
    /// Maximum in-flight lookups (at least 1).
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pause each lookup takes before its request.
    pub rate_limit: Duration,
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            limit: config.scan.limit,
            concurrency: config.scan.concurrency.max(1) as usize,
            timeout: Duration::from_secs(config.scan.timeout_secs),
            rate_limit: Duration::from_millis(config.scan.rate_limit_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.slovlex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SlovLexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.slovlex/slovlex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SlovLexError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SlovLexError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SlovLexError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SlovLexError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| SlovLexError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
