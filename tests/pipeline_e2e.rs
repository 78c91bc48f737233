//! End-to-end import runs against an in-memory site
//!
//! These tests drive the full pipeline (discovery, bounded image
//! imports, metadata records, manifest) with a StaticFetcher and a
//! temporary images tree, no network involved.

use artfetch::config::Config;
use artfetch::fetch::{self, PageFetcher, StaticFetcher};
use artfetch::pipeline::{ArtistEntry, ImportPipeline, ListingSource};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const LISTING_HTML: &str = r#"<html><body>
    <a href="/artists/jane-doe">Jane Doe</a>
    <a href="/contact">Contact</a>
</body></html>"#;

const ARTIST_HTML: &str = r#"<html><body>
    <img src="photo.jpg">
    <img src="/media/second.png">
    <img src="icon.svg">
</body></html>"#;

fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.site.origin = "https://example.test".to_string();
    config.import.images_dir = tmp.path().join("images").to_string_lossy().into_owned();
    config.import.manifest_path = tmp
        .path()
        .join("artists-data.json")
        .to_string_lossy()
        .into_owned();
    config
}

fn fixture_site() -> StaticFetcher {
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/artists", LISTING_HTML);
    fetcher.insert("https://example.test/artists/jane-doe", ARTIST_HTML);
    fetcher.insert("https://example.test/artists/photo.jpg", &b"jpegdata"[..]);
    fetcher.insert("https://example.test/media/second.png", &b"pngdata"[..]);
    fetcher
}

#[tokio::test]
async fn import_run_discovers_downloads_and_writes_manifest() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let mut pipeline = ImportPipeline::new(config, Arc::new(fixture_site()));

    let summary = pipeline.run(ListingSource::Live).await.unwrap();
    assert_eq!(summary.artists, 1);
    assert_eq!(summary.images_imported, 2);
    assert_eq!(summary.images_failed, 0);

    // the contact link was filtered out, only the artist folder exists
    let images_dir = tmp.path().join("images");
    let mut folders: Vec<_> = std::fs::read_dir(&images_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    folders.sort();
    assert_eq!(folders, vec!["0_jane-doe"]);

    let artist_dir = images_dir.join("0_jane-doe");
    let mut entries: Vec<_> = std::fs::read_dir(&artist_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    entries.sort();
    // the svg was excluded by the extension filter
    assert_eq!(
        entries,
        vec![
            "photo.jpg",
            "photo.jpg.en.txt",
            "second.png",
            "second.png.en.txt"
        ]
    );

    assert_eq!(
        std::fs::read(artist_dir.join("photo.jpg")).unwrap(),
        b"jpegdata"
    );
    assert_eq!(
        std::fs::read(artist_dir.join("second.png")).unwrap(),
        b"pngdata"
    );
}

#[tokio::test]
async fn image_records_carry_distinct_identifiers() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let mut pipeline = ImportPipeline::new(config, Arc::new(fixture_site()));
    pipeline.run(ListingSource::Live).await.unwrap();

    let artist_dir = tmp.path().join("images/0_jane-doe");
    let uuid_of = |name: &str| {
        let record = std::fs::read_to_string(artist_dir.join(name)).unwrap();
        assert_eq!(record.lines().filter(|l| *l == "----").count(), 1);
        assert!(record.contains("Template: image"));
        record
            .lines()
            .find_map(|line| line.strip_prefix("Uuid: "))
            .unwrap()
            .to_string()
    };

    let first = uuid_of("photo.jpg.en.txt");
    let second = uuid_of("second.png.en.txt");
    assert_ne!(first, second);
    for uuid in [&first, &second] {
        assert_eq!(uuid.len(), 16);
        assert!(uuid.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

#[tokio::test]
async fn manifest_round_trips_with_cms_field_names() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let mut pipeline = ImportPipeline::new(config, Arc::new(fixture_site()));
    pipeline.run(ListingSource::Live).await.unwrap();

    let body = std::fs::read_to_string(tmp.path().join("artists-data.json")).unwrap();
    assert!(body.contains("\"folderName\""));
    assert!(body.contains("\"originalName\""));

    let manifest: Vec<ArtistEntry> = serde_json::from_str(&body).unwrap();
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0].index, 0);
    assert_eq!(manifest[0].folder_name, "0_jane-doe");
    assert_eq!(manifest[0].original_name, "Jane Doe");
    assert_eq!(
        manifest[0].url.as_str(),
        "https://example.test/artists/jane-doe"
    );
}

#[tokio::test]
async fn listing_snapshot_replaces_live_fetch() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let snapshot = tmp.path().join("listing.html");
    std::fs::write(&snapshot, LISTING_HTML).unwrap();

    // the fixture deliberately lacks the listing page itself
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/artists/jane-doe", ARTIST_HTML);
    fetcher.insert("https://example.test/artists/photo.jpg", &b"jpegdata"[..]);
    fetcher.insert("https://example.test/media/second.png", &b"pngdata"[..]);

    let mut pipeline = ImportPipeline::new(config, Arc::new(fetcher));
    let summary = pipeline
        .run(ListingSource::Snapshot(snapshot))
        .await
        .unwrap();
    assert_eq!(summary.artists, 1);
    assert_eq!(summary.images_imported, 2);
}

#[tokio::test]
async fn per_image_failure_is_skipped_and_counted() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/artists", LISTING_HTML);
    fetcher.insert("https://example.test/artists/jane-doe", ARTIST_HTML);
    // photo.jpg is registered, second.png is not
    fetcher.insert("https://example.test/artists/photo.jpg", &b"jpegdata"[..]);

    let mut pipeline = ImportPipeline::new(config, Arc::new(fetcher));
    let summary = pipeline.run(ListingSource::Live).await.unwrap();
    assert_eq!(summary.images_imported, 1);
    assert_eq!(summary.images_failed, 1);

    // the manifest is still written after partial failure
    assert!(tmp.path().join("artists-data.json").is_file());
    assert!(tmp.path().join("images/0_jane-doe/photo.jpg").is_file());
    assert!(!tmp.path().join("images/0_jane-doe/second.png").exists());
}

#[tokio::test]
async fn discovery_failure_aborts_the_run() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let manifest_path = tmp.path().join("artists-data.json");

    // empty site: the listing page fetch itself fails
    let mut pipeline = ImportPipeline::new(config, Arc::new(StaticFetcher::new()));
    let result = pipeline.run(ListingSource::Live).await;
    assert!(result.is_err());
    assert!(!manifest_path.exists());
}

#[tokio::test]
async fn artist_subpage_failure_skips_artist_but_keeps_run() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    // listing resolves, but the artist subpage does not exist
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/artists", LISTING_HTML);

    let mut pipeline = ImportPipeline::new(config, Arc::new(fetcher));
    let summary = pipeline.run(ListingSource::Live).await.unwrap();
    assert_eq!(summary.artists, 1);
    assert_eq!(summary.images_imported, 0);
    assert!(tmp.path().join("artists-data.json").is_file());
}

/// Wraps a StaticFetcher and gauges how many image downloads are in
/// flight at once. The sleep keeps each download open long enough for
/// siblings to overlap.
struct TrackingFetcher {
    inner: StaticFetcher,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl TrackingFetcher {
    fn new(inner: StaticFetcher) -> Self {
        Self {
            inner,
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
        }
    }

    fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for TrackingFetcher {
    async fn fetch_text(&self, url: &str) -> fetch::Result<String> {
        self.inner.fetch_text(url).await
    }

    async fn fetch_bytes(&self, url: &str) -> fetch::Result<Bytes> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = self.inner.fetch_bytes(url).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn content_type(&self, url: &str) -> fetch::Result<Option<String>> {
        self.inner.content_type(url).await
    }
}

#[tokio::test]
async fn image_imports_never_exceed_worker_pool_bound() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.workers.concurrency = 2;

    let mut site = StaticFetcher::new();
    site.insert("https://example.test/artists", LISTING_HTML);
    let images: Vec<String> = (0..6).map(|i| format!("photo{i}.jpg")).collect();
    let artist_html = images
        .iter()
        .map(|name| format!(r#"<img src="{name}">"#))
        .collect::<String>();
    site.insert("https://example.test/artists/jane-doe", artist_html);
    for name in &images {
        site.insert(
            format!("https://example.test/artists/{name}"),
            &b"jpegdata"[..],
        );
    }

    let fetcher = Arc::new(TrackingFetcher::new(site));
    let mut pipeline = ImportPipeline::new(config, fetcher.clone());
    let summary = pipeline.run(ListingSource::Live).await.unwrap();
    assert_eq!(summary.images_imported, 6);

    // downloads overlap, but never beyond the configured pool size
    assert!(fetcher.max_in_flight() > 1);
    assert!(fetcher.max_in_flight() <= 2);
}

#[tokio::test]
async fn accented_artist_names_slug_to_ascii_folders() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    let mut fetcher = StaticFetcher::new();
    fetcher.insert(
        "https://example.test/artists",
        r#"<a href="/artists/jose">José Müller</a>"#,
    );
    fetcher.insert("https://example.test/artists/jose", "<html></html>");

    let mut pipeline = ImportPipeline::new(config, Arc::new(fetcher));
    pipeline.run(ListingSource::Live).await.unwrap();

    let body = std::fs::read_to_string(tmp.path().join("artists-data.json")).unwrap();
    let manifest: Vec<ArtistEntry> = serde_json::from_str(&body).unwrap();
    assert_eq!(manifest[0].folder_name, "0_jose-muller");
    assert_eq!(manifest[0].original_name, "José Müller");
}
