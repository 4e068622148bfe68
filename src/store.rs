//! Persistence of extracted records
//!
//! Records are keyed by an opaque feature tag and grouped by an integer iris
//! id. [`MemoryStore`] keeps them in a map; [`JsonDirStore`] writes one
//! `<tag>.json` file per record.

use crate::config::MatchParams;
use crate::error::{IrisError, Result};
use crate::matcher;
use crate::models::{IrisRecord, MatchResult};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A stored record with its keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIris {
    /// Unique capture tag
    pub feature_tag: String,
    /// Identity the capture belongs to
    pub iris_id: i64,
    /// Extracted features
    pub record: IrisRecord,
}

/// Keyed record storage
pub trait IrisStore {
    /// Store a record; fails if `tag` is already present
    fn insert(&mut self, tag: &str, iris_id: i64, record: &IrisRecord) -> Result<()>;

    /// Fetch a record by tag
    fn get(&self, tag: &str) -> Result<Option<StoredIris>>;

    /// Whether `tag` is present
    fn contains(&self, tag: &str) -> Result<bool> {
        Ok(self.get(tag)?.is_some())
    }

    /// Every tag stored for `iris_id`, sorted
    fn tags_for_id(&self, iris_id: i64) -> Result<Vec<String>>;
}

fn duplicate(tag: &str) -> IrisError {
    IrisError::Store(format!("feature tag {tag:?} already stored"))
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, StoredIris>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IrisStore for MemoryStore {
    fn insert(&mut self, tag: &str, iris_id: i64, record: &IrisRecord) -> Result<()> {
        if self.records.contains_key(tag) {
            return Err(duplicate(tag));
        }
        self.records.insert(
            tag.to_string(),
            StoredIris {
                feature_tag: tag.to_string(),
                iris_id,
                record: record.clone(),
            },
        );
        Ok(())
    }

    fn get(&self, tag: &str) -> Result<Option<StoredIris>> {
        Ok(self.records.get(tag).cloned())
    }

    fn contains(&self, tag: &str) -> Result<bool> {
        Ok(self.records.contains_key(tag))
    }

    fn tags_for_id(&self, iris_id: i64) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self
            .records
            .values()
            .filter(|s| s.iris_id == iris_id)
            .map(|s| s.feature_tag.clone())
            .collect();
        tags.sort();
        Ok(tags)
    }
}

/// One JSON file per record under a directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the record files
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, tag: &str) -> Result<PathBuf> {
        let bad = tag.is_empty() || tag == "." || tag == ".." || tag.contains(|c: char| c == '/' || c == '\\');
        if bad {
            return Err(IrisError::Store(format!("invalid feature tag {tag:?}")));
        }
        Ok(self.root.join(format!("{tag}.json")))
    }

    fn read(path: &Path) -> Result<StoredIris> {
        let text = fs::read_to_string(path)?;
        let stored: StoredIris = serde_json::from_str(&text)?;
        stored.record.validate()?;
        Ok(stored)
    }
}

impl IrisStore for JsonDirStore {
    fn insert(&mut self, tag: &str, iris_id: i64, record: &IrisRecord) -> Result<()> {
        let path = self.path_for(tag)?;
        if path.exists() {
            return Err(duplicate(tag));
        }
        let stored = StoredIris {
            feature_tag: tag.to_string(),
            iris_id,
            record: record.clone(),
        };
        fs::write(&path, serde_json::to_vec(&stored)?)?;
        debug!(tag, iris_id, path = %path.display(), "record stored");
        Ok(())
    }

    fn get(&self, tag: &str) -> Result<Option<StoredIris>> {
        let path = self.path_for(tag)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn tags_for_id(&self, iris_id: i64) -> Result<Vec<String>> {
        let mut tags = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stored = Self::read(&path)?;
            if stored.iris_id == iris_id {
                tags.push(stored.feature_tag);
            }
        }
        tags.sort();
        Ok(tags)
    }
}

/// A random stored tag for `iris_id`, `None` if the id has no records
pub fn random_tag_for_id<S: IrisStore + ?Sized, R: Rng + ?Sized>(
    store: &S,
    iris_id: i64,
    rng: &mut R,
) -> Result<Option<String>> {
    let tags = store.tags_for_id(iris_id)?;
    Ok(tags.choose(rng).cloned())
}

/// Load two stored records and compare them
pub fn compare_stored<S: IrisStore + ?Sized>(
    store: &S,
    tag_a: &str,
    tag_b: &str,
    params: &MatchParams,
) -> Result<MatchResult> {
    let load = |tag: &str| {
        store
            .get(tag)?
            .ok_or_else(|| IrisError::Store(format!("feature tag {tag:?} not found")))
    };
    let (a, b) = (load(tag_a)?, load(tag_b)?);
    matcher::compare(&a.record, &b.record, params)
}
