//! Similarity metric for vector search.

use std::fmt;

/// Distance metric for vector similarity calculations.
///
/// Scores are similarities where higher means more similar, so search
/// results can always be sorted descending. Only cosine is supported; the
/// name is persisted with each collection so stored data stays readable if
/// more metrics are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceMetric {
    /// Cosine similarity. Range [-1, 1]; ignores magnitude.
    #[default]
    Cosine,
}

impl DistanceMetric {
    /// Compute the similarity score between two vectors of equal length.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
        }
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = (dot_product(a, a) * dot_product(b, b)).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot_product(a, b) / denom
    }
}
