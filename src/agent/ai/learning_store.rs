// Persistence of learned position values.
//
// The store is a single JSON document, gzip-compressed when the file name
// ends in `.gz`. Writes go to `<path>.tmp` first and are renamed into place,
// so a crash mid-write never leaves a truncated store behind. Loading is
// forgiving: empty files and trailing garbage are tolerated, anything
// unreadable is discarded and the learner cold-starts.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};

/// Closing braces tried from the end of a damaged document before giving up
const MAX_RECOVERY_ATTEMPTS: usize = 64;

const GZIP_LEVEL: u32 = 6;

/// Everything the learner persists between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningSnapshot {
    /// `(zobrist hash, value)` pairs, least recently used first
    #[serde(default, with = "ordered_values")]
    pub position_values: Vec<(u64, f64)>,
    #[serde(default)]
    pub games_played: u64,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub losses: u64,
    #[serde(default)]
    pub draws: u64,
    /// RFC 3339 timestamp of the last save
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// `position_values` is a JSON object keyed by the decimal hash. Object order
/// carries the LRU order, so it is written and read as an ordered sequence.
mod ordered_values {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[(u64, f64)], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(values.len()))?;
        for (hash, value) in values {
            map.serialize_entry(&hash.to_string(), value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<(u64, f64)>, D::Error> {
        deserializer.deserialize_map(OrderedValuesVisitor)
    }

    struct OrderedValuesVisitor;

    impl<'de> Visitor<'de> for OrderedValuesVisitor {
        type Value = Vec<(u64, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map from decimal position hashes to values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
            let mut values = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, f64>()? {
                let hash = key
                    .parse::<u64>()
                    .map_err(|_| <A::Error as serde::de::Error>::custom(format!("invalid position hash {key:?}")))?;
                values.push((hash, value));
            }
            Ok(values)
        }
    }
}

/// File-backed learning store
#[derive(Debug, Clone)]
pub struct LearningStore {
    path: PathBuf,
}

impl LearningStore {
    /// Store at `path`. A plain path whose `.gz` sibling already exists is
    /// switched to the compressed file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !is_gzip(&path) {
            let compressed = with_suffix(&path, ".gz");
            if compressed.exists() {
                return Self { path: compressed };
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_compressed(&self) -> bool {
        is_gzip(&self.path)
    }

    /// The compressed/plain counterpart of the store path
    fn sibling(&self) -> PathBuf {
        if self.is_compressed() {
            self.path.with_extension("")
        } else {
            with_suffix(&self.path, ".gz")
        }
    }

    /// Load the store, trying the configured path first and then its sibling.
    ///
    /// Returns `None` for a cold start. Empty and unreadable files are
    /// removed so they do not fail again on the next run.
    pub fn load(&self) -> Option<LearningSnapshot> {
        for path in [self.path.clone(), self.sibling()] {
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            if metadata.len() == 0 {
                info!("learning store {} is empty, ignoring it", path.display());
                remove_quietly(&path);
                continue;
            }
            match read_snapshot(&path) {
                Ok(snapshot) => {
                    info!(
                        "loaded {} learned positions from {} ({} games, W:{} D:{} L:{})",
                        snapshot.position_values.len(),
                        path.display(),
                        snapshot.games_played,
                        snapshot.wins,
                        snapshot.draws,
                        snapshot.losses
                    );
                    return Some(snapshot);
                }
                Err(err) => {
                    warn!("discarding learning store {}: {}", path.display(), err);
                    remove_quietly(&path);
                }
            }
        }
        info!("no learning data found at {}, starting from scratch", self.path.display());
        None
    }

    /// Write `snapshot` atomically. On failure the temporary file is removed
    /// and the previous store is left untouched.
    pub fn save(&self, snapshot: &LearningSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = with_suffix(&self.path, ".tmp");
        let written = self.write_to(&tmp, snapshot).and_then(|()| {
            fs::rename(&tmp, &self.path)?;
            Ok(())
        });
        if written.is_err() {
            remove_quietly(&tmp);
        }
        written?;

        info!(
            "saved {} learned positions ({} games) to {}",
            snapshot.position_values.len(),
            snapshot.games_played,
            self.path.display()
        );
        Ok(())
    }

    fn write_to(&self, tmp: &Path, snapshot: &LearningSnapshot) -> Result<()> {
        let file = File::create(tmp)?;
        if self.is_compressed() {
            let mut encoder = GzEncoder::new(file, Compression::new(GZIP_LEVEL));
            serde_json::to_writer(&mut encoder, snapshot)?;
            encoder.finish()?.sync_all()?;
        } else {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("could not remove {}: {}", path.display(), err);
        }
    }
}

fn read_snapshot(path: &Path) -> Result<LearningSnapshot> {
    let mut text = String::new();
    let file = File::open(path)?;
    if is_gzip(path) {
        GzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        let mut file = file;
        file.read_to_string(&mut text)?;
    }
    parse_lenient(&text)
}

/// Parse a store document, cutting off trailing garbage after the last
/// complete closing brace. Earlier braces are tried if that still fails.
pub fn parse_lenient(text: &str) -> Result<LearningSnapshot> {
    let text = text.trim();
    let mut first_error = None;
    for (end, _) in text.rmatch_indices('}').take(MAX_RECOVERY_ATTEMPTS) {
        match serde_json::from_str::<LearningSnapshot>(&text[..=end]) {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(EngineError::PersistenceCorruption(match first_error {
        Some(err) => err.to_string(),
        None => "no JSON object found".to_string(),
    }))
}
