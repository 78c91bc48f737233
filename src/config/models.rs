use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
}

/// Target site: origin, listing page, and the URL-path prefix that
/// marks a link as an artist subpage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_listing_path")]
    pub listing_path: String,
    #[serde(default = "default_artist_path_prefix")]
    pub artist_path_prefix: String,
}

impl SiteConfig {
    /// Absolute URL of the listing page.
    pub fn listing_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.origin)?.join(&self.listing_path)
    }

    /// Absolute prefix retained artist links must start with.
    pub fn artist_prefix(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.origin)?.join(&self.artist_path_prefix)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            listing_path: default_listing_path(),
            artist_path_prefix: default_artist_path_prefix(),
        }
    }
}

fn default_origin() -> String {
    "https://www.plattformplattform.ch".to_string()
}

fn default_listing_path() -> String {
    "/artists".to_string()
}

fn default_artist_path_prefix() -> String {
    "/artists/".to_string()
}

/// On-disk layout and record locales
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
    /// Locale of per-image records (`<image>.<locale>.txt`)
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Locale of generated artist records (`artist.<locale>.txt`)
    #[serde(default = "default_record_locale")]
    pub record_locale: String,
    #[serde(default = "default_template_path")]
    pub template_path: String,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            manifest_path: default_manifest_path(),
            locale: default_locale(),
            record_locale: default_record_locale(),
            template_path: default_template_path(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_images_dir() -> String {
    "./images".to_string()
}

fn default_manifest_path() -> String {
    "./artists-data.json".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_record_locale() -> String {
    "de".to_string()
}

fn default_template_path() -> String {
    "./artist.en.txt".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    /// Settings for the reqwest-backed fetcher.
    pub fn client_config(&self) -> crate::fetch::HttpConfig {
        crate::fetch::HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    "artfetch/0.1.0".to_string()
}

/// Bounded pool for per-image imports
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkersConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
