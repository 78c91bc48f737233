//! Image download and on-disk import

use crate::fetch::{FetchError, PageFetcher};
use crate::ident;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ImportError>;

static URL_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.([a-z0-9]+)(\?|$)").expect("extension pattern"));

/// Extension from the trailing `.<ext>` segment of a URL, lowercased.
pub fn extension_from_url(url: &str) -> Option<String> {
    URL_EXTENSION
        .captures(url)
        .map(|captures| captures[1].to_ascii_lowercase())
}

/// Map an HTTP content type to a file extension.
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let parsed: mime::Mime = content_type.parse().ok()?;
    if parsed.type_() != mime::IMAGE {
        return None;
    }
    match parsed.subtype().as_str() {
        "jpeg" | "jpg" => Some("jpg".to_string()),
        "png" => Some("png".to_string()),
        "gif" => Some("gif".to_string()),
        "webp" => Some("webp".to_string()),
        "svg" => Some("svg".to_string()),
        _ => None,
    }
}

/// One image to bring into the images tree.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub url: Url,
    pub target_dir: PathBuf,
    /// Overrides the derived `image-<timestamp>.<ext>` name.
    pub filename: Option<String>,
}

/// Outcome of a successful import, ready for a metadata record.
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub uuid: String,
    pub filename: String,
    pub path: PathBuf,
    pub uuid_reference: String,
}

/// Downloads an image and writes it under the target directory.
pub struct ImageImporter {
    fetcher: Arc<dyn PageFetcher>,
}

impl ImageImporter {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Download and persist one image. An existing file of the same
    /// name is overwritten silently.
    ///
    /// The extension comes from the URL when it carries one; only a URL
    /// without a trailing `.<ext>` segment costs an extra metadata
    /// request for its content type.
    pub async fn import(&self, options: ImportOptions, uuid: String) -> Result<ImportResult> {
        let url = options.url.as_str();
        let bytes = self.fetcher.fetch_bytes(url).await?;

        let filename = match options.filename {
            Some(name) => name,
            None => {
                let extension = match extension_from_url(url) {
                    Some(extension) => extension,
                    None => self.probe_extension(url).await,
                };
                let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                format!("image-{stamp}.{extension}")
            }
        };

        fs::create_dir_all(&options.target_dir)
            .await
            .map_err(|source| ImportError::Io {
                path: options.target_dir.clone(),
                source,
            })?;

        let path = options.target_dir.join(&filename);
        fs::write(&path, &bytes)
            .await
            .map_err(|source| ImportError::Io {
                path: path.clone(),
                source,
            })?;

        info!(url, path = %path.display(), size = bytes.len(), "imported image");

        Ok(ImportResult {
            uuid_reference: ident::file_reference(&uuid),
            uuid,
            filename,
            path,
        })
    }

    async fn probe_extension(&self, url: &str) -> String {
        match self.fetcher.content_type(url).await {
            Ok(Some(content_type)) => extension_from_content_type(&content_type)
                .unwrap_or_else(|| "jpg".to_string()),
            Ok(None) => "jpg".to_string(),
            Err(error) => {
                debug!(url, %error, "content-type probe failed, defaulting extension");
                "jpg".to_string()
            }
        }
    }
}
