//! Vector collection.
//!
//! A collection is a named container for records with a fixed vector
//! dimensionality and a distance metric. Search is an exact scan, which is
//! plenty for a folder of local documents.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::{Record, SearchResult};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Statistics about a collection.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Number of stored records.
    pub count: usize,
    /// Vector dimensions.
    pub dimensions: usize,
    /// Distance metric.
    pub metric: DistanceMetric,
}

#[derive(Debug, Default)]
struct Records {
    /// Records in insertion order.
    entries: Vec<Record>,
    /// id -> position in `entries`.
    positions: HashMap<String, usize>,
}

/// A named collection of records.
#[derive(Debug)]
pub struct Collection {
    name: String,
    dimensions: usize,
    metric: DistanceMetric,
    records: RwLock<Records>,
}

impl Collection {
    /// Create a new, empty collection.
    pub fn new(name: String, dimensions: usize, metric: DistanceMetric) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidVector(
                "collection dimensions must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            name,
            dimensions,
            metric,
            records: RwLock::new(Records::default()),
        })
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the vector dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Get the number of records in the collection.
    pub fn len(&self) -> usize {
        self.records.read().entries.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a record id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.records.read().positions.contains_key(id)
    }

    /// Insert a batch of records.
    ///
    /// The whole batch is validated before anything is written, so a bad
    /// record leaves the collection unchanged.
    pub fn insert_batch(&self, batch: Vec<Record>) -> Result<usize> {
        let mut records = self.records.write();

        let mut batch_ids = std::collections::HashSet::with_capacity(batch.len());
        for record in &batch {
            self.validate(&record.vector)?;
            if records.positions.contains_key(&record.id) || !batch_ids.insert(record.id.as_str())
            {
                return Err(Error::DuplicateId(record.id.clone()));
            }
        }

        let count = batch.len();
        for record in batch {
            let position = records.entries.len();
            records.positions.insert(record.id.clone(), position);
            records.entries.push(record);
        }

        Ok(count)
    }

    /// Return the `limit` most similar records, best first.
    ///
    /// Ties keep insertion order.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.validate(query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let records = self.records.read();
        let mut scored: Vec<(usize, f32)> = records
            .entries
            .iter()
            .enumerate()
            .map(|(i, r)| (i, self.metric.similarity(query, &r.vector)))
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let record = &records.entries[i];
                SearchResult {
                    id: record.id.clone(),
                    score,
                    document: record.document.clone(),
                    metadata: record.metadata.clone(),
                }
            })
            .collect())
    }

    /// Snapshot of all records in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.records.read().entries.clone()
    }

    /// Get collection statistics.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            name: self.name.clone(),
            count: self.len(),
            dimensions: self.dimensions,
            metric: self.metric,
        }
    }

    fn validate(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "vector contains NaN or infinite values".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> Collection {
        Collection::new("test".to_string(), 3, DistanceMetric::Cosine).unwrap()
    }

    #[test]
    fn test_insert_and_search_ranking() {
        let col = collection();
        col.insert_batch(vec![
            Record::new("a", vec![1.0, 0.0, 0.0]),
            Record::new("b", vec![0.0, 1.0, 0.0]),
            Record::new("c", vec![0.7, 0.7, 0.0]),
        ])
        .unwrap();

        let results = col.search(&[1.0, 0.1, 0.0], 2).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_limit_larger_than_collection() {
        let col = collection();
        col.insert_batch(vec![Record::new("a", vec![1.0, 0.0, 0.0])])
            .unwrap();

        assert_eq!(col.search(&[1.0, 0.0, 0.0], 10).unwrap().len(), 1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let col = collection();
        col.insert_batch(vec![
            Record::new("first", vec![0.0, 0.0, 1.0]),
            Record::new("second", vec![0.0, 0.0, 1.0]),
        ])
        .unwrap();

        let results = col.search(&[0.0, 0.0, 1.0], 2).unwrap();
        assert_eq!(results[0].id, "first");
        assert_eq!(results[1].id, "second");
    }

    #[test]
    fn test_duplicate_id_rejects_whole_batch() {
        let col = collection();
        col.insert_batch(vec![Record::new("a", vec![1.0, 0.0, 0.0])])
            .unwrap();

        let err = col
            .insert_batch(vec![
                Record::new("b", vec![0.0, 1.0, 0.0]),
                Record::new("a", vec![0.0, 0.0, 1.0]),
            ])
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateId(id) if id == "a"));
        assert_eq!(col.len(), 1);
        assert!(!col.contains("b"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let col = collection();
        let err = col
            .insert_batch(vec![Record::new("a", vec![1.0, 0.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_rejects_nan() {
        let col = collection();
        assert!(col
            .insert_batch(vec![Record::new("a", vec![f32::NAN, 0.0, 0.0])])
            .is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(Collection::new("bad".to_string(), 0, DistanceMetric::Cosine).is_err());
    }
}
