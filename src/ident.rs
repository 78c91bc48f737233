//! Kirby-compatible identifier generation
//!
//! Kirby file and page records are keyed by 16-character alphanumeric
//! identifiers. The generator remembers every identifier it has handed
//! out (or been seeded with) and re-draws on collision, so uniqueness
//! within a run is verified rather than merely probabilistic.

use std::collections::HashSet;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a generated identifier.
pub const UUID_LEN: usize = 16;

#[derive(Debug, Default)]
pub struct UuidGenerator {
    issued: HashSet<String>,
}

impl UuidGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the generator with an identifier that already exists on disk,
    /// so it can never be issued again.
    pub fn reserve(&mut self, uuid: &str) {
        self.issued.insert(uuid.to_string());
    }

    /// Draw a fresh identifier, unused within this generator.
    pub fn generate(&mut self) -> String {
        loop {
            let candidate: String = (0..UUID_LEN)
                .map(|_| ALPHABET[fastrand::usize(..ALPHABET.len())] as char)
                .collect();
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Kirby file reference for an identifier (`file://<uuid>`).
pub fn file_reference(uuid: &str) -> String {
    format!("file://{uuid}")
}
