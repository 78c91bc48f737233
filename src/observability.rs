//! Run counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters recorded over one pipeline run
#[derive(Debug, Default)]
pub struct Metrics {
    artists_discovered: AtomicU64,
    images_imported: AtomicU64,
    images_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artist_discovered(&self) {
        self.artists_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn image_imported(&self) {
        self.images_imported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn image_failed(&self) {
        self.images_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            artists_discovered: self.artists_discovered.load(Ordering::Relaxed),
            images_imported: self.images_imported.load(Ordering::Relaxed),
            images_failed: self.images_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub artists_discovered: u64,
    pub images_imported: u64,
    pub images_failed: u64,
}
