//! Flat append-only vector index with file persistence.
//!
//! The index holds fixed-dimension vectors in insertion order; the id of a
//! vector is its slot position, assigned sequentially at append time and
//! never reused or reassigned. Nearest-neighbor queries do an exhaustive
//! squared-L2 scan, which is exact and fast enough at the corpus sizes this
//! system indexes (tens of thousands of chunks).
//!
//! Persistence is a single JSON file rewritten atomically (write to a
//! sibling temp file, then rename) on every append, so a committed batch
//! survives process restarts.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use paperforge_core::{Error, Result};

#[derive(Serialize, Deserialize)]
struct IndexFile {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Flat L2 vector index persisted to a single file.
#[derive(Debug)]
pub struct FlatVectorIndex {
    path: PathBuf,
    dimension: usize,
    vectors: RwLock<Vec<Vec<f32>>>,
}

impl FlatVectorIndex {
    /// Open the index at `path`, creating an empty one of the given
    /// dimension when no file exists yet. A dimension mismatch against an
    /// existing file is a configuration error: the store is invalid for
    /// this dimension.
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let vectors = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let file: IndexFile = serde_json::from_str(&raw)?;
            if file.dimension != dimension {
                return Err(Error::Config(format!(
                    "vector index at {} has dimension {}, expected {}",
                    path.display(),
                    file.dimension,
                    dimension
                )));
            }
            info!(
                count = file.vectors.len(),
                dimension, "Loaded vector index"
            );
            file.vectors
        } else {
            debug!(path = %path.display(), dimension, "Creating empty vector index");
            Vec::new()
        };

        Ok(Self {
            path,
            dimension,
            vectors: RwLock::new(vectors),
        })
    }

    /// The fixed vector dimension of this index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors currently held.
    pub fn len(&self) -> usize {
        self.vectors.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a batch of vectors, returning the contiguous id range they
    /// were assigned. The file is persisted before returning; on any error
    /// nothing is visible to readers.
    pub fn append(&self, batch: &[Vec<f32>]) -> Result<Range<i64>> {
        for v in batch {
            if v.len() != self.dimension {
                return Err(Error::InvalidInput(format!(
                    "vector has dimension {}, index expects {}",
                    v.len(),
                    self.dimension
                )));
            }
        }

        let mut vectors = self.vectors.write().unwrap();
        let start = vectors.len() as i64;
        vectors.extend(batch.iter().cloned());

        if let Err(e) = self.persist(&vectors) {
            // Roll the in-memory state back so readers never observe an
            // unpersisted batch.
            vectors.truncate(start as usize);
            return Err(e);
        }

        Ok(start..start + batch.len() as i64)
    }

    /// Remove the trailing vectors at or past `from_id` and persist.
    /// Compensation path for a failed metadata write in the same batch.
    pub fn truncate(&self, from_id: i64) -> Result<()> {
        let mut vectors = self.vectors.write().unwrap();
        vectors.truncate(from_id.max(0) as usize);
        self.persist(&vectors)
    }

    /// Return up to `k` nearest neighbors of `query` by squared Euclidean
    /// distance, ascending. Empty when the index is empty.
    pub fn query(&self, query: &[f32], k: usize) -> Vec<(i64, f32)> {
        let vectors = self.vectors.read().unwrap();
        let mut scored: Vec<(i64, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(id, v)| (id as i64, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn persist(&self, vectors: &[Vec<f32>]) -> Result<()> {
        let file = IndexFile {
            dimension: self.dimension,
            vectors: vectors.to_vec(),
        };
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec(&file)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_open_creates_empty_index() {
        let dir = TempDir::new().unwrap();
        let idx = FlatVectorIndex::open(dir.path().join("index.json"), 4).unwrap();
        assert!(idx.is_empty());
        assert_eq!(idx.query(&[0.0; 4], 5), vec![]);
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let idx = FlatVectorIndex::open(dir.path().join("index.json"), 4).unwrap();

        let batch: Vec<Vec<f32>> = (0..5).map(|i| unit(4, i % 4)).collect();
        let range = idx.append(&batch).unwrap();
        assert_eq!(range, 0..5);

        let range = idx.append(&[unit(4, 0)]).unwrap();
        assert_eq!(range, 5..6);
        assert_eq!(idx.len(), 6);
    }

    #[test]
    fn test_query_self_returns_distance_zero_first() {
        let dir = TempDir::new().unwrap();
        let idx = FlatVectorIndex::open(dir.path().join("index.json"), 4).unwrap();
        let batch: Vec<Vec<f32>> = (0..4).map(|i| unit(4, i)).collect();
        idx.append(&batch).unwrap();

        let hits = idx.query(&unit(4, 2), 4);
        assert_eq!(hits[0].0, 2);
        assert_eq!(hits[0].1, 0.0);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_query_returns_fewer_than_k_on_small_store() {
        let dir = TempDir::new().unwrap();
        let idx = FlatVectorIndex::open(dir.path().join("index.json"), 4).unwrap();
        idx.append(&[unit(4, 0), unit(4, 1)]).unwrap();
        assert_eq!(idx.query(&unit(4, 0), 10).len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_on_append() {
        let dir = TempDir::new().unwrap();
        let idx = FlatVectorIndex::open(dir.path().join("index.json"), 4).unwrap();
        let err = idx.append(&[vec![1.0; 3]]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_reopen_preserves_committed_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        {
            let idx = FlatVectorIndex::open(&path, 4).unwrap();
            idx.append(&[unit(4, 1), unit(4, 3)]).unwrap();
        }
        let idx = FlatVectorIndex::open(&path, 4).unwrap();
        assert_eq!(idx.len(), 2);
        let hits = idx.query(&unit(4, 3), 1);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[0].1, 0.0);
    }

    #[test]
    fn test_reopen_with_wrong_dimension_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        {
            let idx = FlatVectorIndex::open(&path, 4).unwrap();
            idx.append(&[unit(4, 0)]).unwrap();
        }
        let err = FlatVectorIndex::open(&path, 8).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_truncate_drops_trailing_ids() {
        let dir = TempDir::new().unwrap();
        let idx = FlatVectorIndex::open(dir.path().join("index.json"), 4).unwrap();
        idx.append(&[unit(4, 0), unit(4, 1), unit(4, 2)]).unwrap();
        idx.truncate(1).unwrap();
        assert_eq!(idx.len(), 1);
    }
}
