//! Kirby metadata records
//!
//! Two record shapes share one writer and one identifier scheme: the
//! minimal per-image sidecar (`<image>.<locale>.txt`) and the templated
//! per-artist record (`artist.<locale>.txt`).

mod document;

pub use document::TemplateDocument;

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no Uuid field in {0}")]
    MissingUuid(PathBuf),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

static UUID_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Uuid:\s*(\S+)").expect("uuid line pattern"));

/// Writer for both record shapes, parameterized by locale.
#[derive(Debug, Clone)]
pub struct MetadataWriter {
    locale: String,
}

impl MetadataWriter {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    /// Sidecar record path for an image (`<image>.<locale>.txt`).
    pub fn record_path(&self, image_path: &Path) -> PathBuf {
        let mut name = image_path.as_os_str().to_os_string();
        name.push(format!(".{}.txt", self.locale));
        PathBuf::from(name)
    }

    /// Write the minimal per-image record next to the image.
    pub async fn write_image_record(&self, image_path: &Path, uuid: &str) -> Result<PathBuf> {
        let path = self.record_path(image_path);
        fs::write(&path, image_record(uuid))
            .await
            .map_err(|source| MetadataError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "wrote image record");
        Ok(path)
    }

    /// Read the identifier back out of an existing per-image record.
    pub async fn read_image_uuid(&self, image_path: &Path) -> Result<String> {
        let path = self.record_path(image_path);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| MetadataError::Read {
                path: path.clone(),
                source,
            })?;
        UUID_LINE
            .captures(&content)
            .map(|captures| captures[1].to_string())
            .ok_or(MetadataError::MissingUuid(path))
    }

    /// Write a filled artist record into the artist's directory.
    pub async fn write_artist_record(
        &self,
        dir: &Path,
        document: &TemplateDocument,
    ) -> Result<PathBuf> {
        let path = dir.join(format!("artist.{}.txt", self.locale));
        fs::write(&path, document.render())
            .await
            .map_err(|source| MetadataError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Minimal image record: identifier, separator, template marker.
pub fn image_record(uuid: &str) -> String {
    format!("Uuid: {uuid}\n\n----\n\nTemplate: image\n")
}
