//! Template-filling: rebuild per-artist records from images already on
//! disk, as a decoupled consumer of the import run's manifest.

use crate::config::Config;
use crate::ident::UuidGenerator;
use crate::metadata::{MetadataError, MetadataWriter, TemplateDocument};
use crate::pipeline::ArtistEntry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read images directory {path}: {source}")]
    ImagesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fill the artist template for every artist directory. Returns the
/// number of records written; per-directory failures are logged and
/// skipped.
pub async fn run(config: &Config) -> Result<usize, GenerateError> {
    let template_path = PathBuf::from(&config.import.template_path);
    let template = fs::read_to_string(&template_path)
        .await
        .map_err(|source| GenerateError::Template {
            path: template_path,
            source,
        })?;
    let template = TemplateDocument::parse(&template);
    if !template.has_gallery() {
        warn!("template has no gallery block, records will carry none");
    }

    let images_dir = PathBuf::from(&config.import.images_dir);
    let dirs = artist_dirs(&images_dir).await?;
    info!(count = dirs.len(), "found artist directories");

    let names = manifest_names(&config.import.manifest_path).await;
    let reader = MetadataWriter::new(&config.import.locale);
    let writer = MetadataWriter::new(&config.import.record_locale);
    let mut generator = UuidGenerator::new();
    let mut written = 0;

    for dir in dirs {
        let artist_name = artist_name_for(&dir, &names);
        match fill_one(
            &dir,
            &artist_name,
            &template,
            &reader,
            &writer,
            &mut generator,
            &config.import.allowed_extensions,
        )
        .await
        {
            Ok(path) => {
                written += 1;
                info!(path = %path.display(), artist = %artist_name, "wrote artist record");
            }
            Err(error) => {
                warn!(dir = %dir.display(), %error, "skipping artist directory");
            }
        }
    }

    Ok(written)
}

/// First-level directories of the images tree, skipping dotted names,
/// sorted for deterministic output.
async fn artist_dirs(images_dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let io_error = |source| GenerateError::ImagesDir {
        path: images_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(images_dir).await.map_err(io_error)?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        if !entry.file_type().await.map_err(io_error)?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        dirs.push(entry.path());
    }
    dirs.sort();
    Ok(dirs)
}

/// Display name for a directory: the manifest's originalName when the
/// folder appears there, otherwise the folder name itself.
fn artist_name_for(dir: &Path, names: &HashMap<String, String>) -> String {
    let folder = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    names.get(&folder).cloned().unwrap_or(folder)
}

/// folderName → originalName from a previous import run's manifest.
/// Absence of the manifest is not an error; folder names stand in.
async fn manifest_names(path: &str) -> HashMap<String, String> {
    let body = match fs::read_to_string(path).await {
        Ok(body) => body,
        Err(_) => return HashMap::new(),
    };
    match serde_json::from_str::<Vec<ArtistEntry>>(&body) {
        Ok(entries) => entries
            .into_iter()
            .map(|entry| (entry.folder_name, entry.original_name))
            .collect(),
        Err(error) => {
            warn!(path, %error, "manifest unreadable, falling back to folder names");
            HashMap::new()
        }
    }
}

async fn fill_one(
    dir: &Path,
    artist_name: &str,
    template: &TemplateDocument,
    reader: &MetadataWriter,
    writer: &MetadataWriter,
    generator: &mut UuidGenerator,
    allowed_extensions: &[String],
) -> Result<PathBuf, MetadataError> {
    let images = image_files(dir, allowed_extensions)
        .await
        .map_err(|source| MetadataError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

    // Images whose record cannot be read are omitted from the gallery.
    let mut uuids = Vec::new();
    for image in &images {
        match reader.read_image_uuid(image).await {
            Ok(uuid) => {
                generator.reserve(&uuid);
                uuids.push(uuid);
            }
            Err(error) => {
                warn!(image = %image.display(), %error, "no identifier for image, omitting from gallery");
            }
        }
    }
    info!(
        dir = %dir.display(),
        images = images.len(),
        identifiers = uuids.len(),
        "collected gallery identifiers"
    );

    let mut document = template.clone();
    document.set_artist_name(artist_name);
    document.set_gallery(&uuids);
    document.set_uuid(&generator.generate());

    writer.write_artist_record(dir, &document).await
}

/// Image files of a directory filtered by allowed extension, sorted.
async fn image_files(dir: &Path, allowed_extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
        if allowed_extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{ext}")))
        {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
