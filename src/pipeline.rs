//! Import pipeline orchestration
//!
//! Discover artist subpages from the listing page, fan the per-image
//! imports out through a bounded worker pool, and persist the artist
//! manifest once every outstanding import has finished.

use crate::config::Config;
use crate::extract::{self, ExtractError, Link};
use crate::fetch::{FetchError, PageFetcher};
use crate::ident::UuidGenerator;
use crate::import::{ImageImporter, ImportOptions};
use crate::metadata::MetadataWriter;
use crate::observability::Metrics;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use url::Url;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("invalid URL in configuration: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to read snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode manifest: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One discovered artist subpage. Immutable after discovery and
/// persisted verbatim to the manifest (CMS field names).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtistEntry {
    pub index: usize,
    pub folder_name: String,
    pub original_name: String,
    pub url: Url,
}

/// Where the listing HTML comes from.
#[derive(Debug, Clone)]
pub enum ListingSource {
    /// Fetch the configured listing page over HTTP.
    Live,
    /// Read a previously saved copy of the listing page.
    Snapshot(PathBuf),
}

/// Counters for one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub artists: u64,
    pub images_imported: u64,
    pub images_failed: u64,
}

/// Accent-stripped, lowercased, hyphenated directory slug.
pub fn slugify(name: &str) -> String {
    name.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn display_name(link: &Link) -> String {
    if !link.text.is_empty() {
        return link.text.clone();
    }
    // Anchor without text: fall back to the last path segment.
    link.href
        .path_segments()
        .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
        .unwrap_or("untitled")
        .to_string()
}

/// Filename for an imported image, taken from the URL path so sibling
/// imports land on distinct paths.
fn image_filename(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
        .map(|segment| segment.to_string())
}

pub struct ImportPipeline {
    config: Config,
    fetcher: Arc<dyn PageFetcher>,
    generator: UuidGenerator,
    metrics: Arc<Metrics>,
}

impl ImportPipeline {
    pub fn new(config: Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            fetcher,
            generator: UuidGenerator::new(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Run the whole pipeline once. Discovery failure aborts; per-image
    /// and per-artist failures are logged and skipped.
    pub async fn run(&mut self, source: ListingSource) -> Result<RunSummary, PipelineError> {
        let artists = self.discover(source).await?;
        info!(count = artists.len(), "discovered artist pages");

        for artist in &artists {
            if let Err(error) = self.import_artist(artist).await {
                warn!(
                    artist = %artist.original_name,
                    url = %artist.url,
                    %error,
                    "skipping artist"
                );
            }
        }

        // All imports have joined by now; the manifest only goes out after.
        self.write_manifest(&artists).await?;

        let snapshot = self.metrics.snapshot();
        info!(
            artists = snapshot.artists_discovered,
            imported = snapshot.images_imported,
            failed = snapshot.images_failed,
            "import run complete"
        );

        Ok(RunSummary {
            artists: snapshot.artists_discovered,
            images_imported: snapshot.images_imported,
            images_failed: snapshot.images_failed,
        })
    }

    async fn discover(&self, source: ListingSource) -> Result<Vec<ArtistEntry>, PipelineError> {
        let listing_url = self.config.site.listing_url()?;
        let html = match source {
            ListingSource::Live => {
                info!(url = %listing_url, "fetching listing page");
                self.fetcher.fetch_text(listing_url.as_str()).await?
            }
            ListingSource::Snapshot(path) => {
                info!(path = %path.display(), "reading listing snapshot");
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| PipelineError::Snapshot { path, source })?
            }
        };

        let prefix = self.config.site.artist_prefix()?;
        let links = extract::extract_links(&html, &listing_url, Some(prefix.as_str()))?;

        let artists = links
            .into_iter()
            .enumerate()
            .map(|(index, link)| {
                let original_name = display_name(&link);
                let folder_name = format!("{index}_{}", slugify(&original_name));
                self.metrics.artist_discovered();
                ArtistEntry {
                    index,
                    folder_name,
                    original_name,
                    url: link.href,
                }
            })
            .collect();

        Ok(artists)
    }

    async fn import_artist(&mut self, artist: &ArtistEntry) -> Result<(), PipelineError> {
        let html = self.fetcher.fetch_text(artist.url.as_str()).await?;
        let images = extract::extract_image_urls(
            &html,
            &artist.url,
            &self.config.import.allowed_extensions,
        )?;
        info!(
            artist = %artist.original_name,
            images = images.len(),
            "importing artist images"
        );

        let target_dir = Path::new(&self.config.import.images_dir).join(&artist.folder_name);
        let importer = Arc::new(ImageImporter::new(self.fetcher.clone()));
        let writer = Arc::new(MetadataWriter::new(&self.config.import.locale));
        let permits = Arc::new(Semaphore::new(self.config.workers.concurrency));

        let mut join_set = JoinSet::new();
        for url in images {
            // Identifiers are drawn before spawning so the generator
            // stays single-threaded.
            let uuid = self.generator.generate();
            let permits = permits.clone();
            let importer = importer.clone();
            let writer = writer.clone();
            let metrics = self.metrics.clone();
            let target_dir = target_dir.clone();

            join_set.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                let options = ImportOptions {
                    filename: image_filename(&url),
                    target_dir,
                    url: url.clone(),
                };
                match importer.import(options, uuid).await {
                    Ok(imported) => {
                        match writer.write_image_record(&imported.path, &imported.uuid).await {
                            Ok(record_path) => {
                                metrics.image_imported();
                                debug!(
                                    record = %record_path.display(),
                                    uuid_reference = imported.uuid_reference,
                                    "image import complete"
                                );
                            }
                            Err(error) => {
                                metrics.image_failed();
                                warn!(url = %url, %error, "metadata record failed");
                            }
                        }
                    }
                    Err(error) => {
                        metrics.image_failed();
                        warn!(url = %url, %error, "image import failed");
                    }
                }
            });
        }

        // Barrier: every import for this artist completes before the
        // caller moves on.
        while let Some(joined) = join_set.join_next().await {
            if let Err(error) = joined {
                self.metrics.image_failed();
                warn!(artist = %artist.original_name, %error, "import task panicked");
            }
        }

        Ok(())
    }

    async fn write_manifest(&self, artists: &[ArtistEntry]) -> Result<(), PipelineError> {
        let path = PathBuf::from(&self.config.import.manifest_path);
        let body = serde_json::to_string_pretty(artists)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| PipelineError::Manifest {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), count = artists.len(), "wrote manifest");
        Ok(())
    }
}
