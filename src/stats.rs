//! Aggregate statistics over extraction results.
//!
//! Confidence scores are heuristic, not calibrated probabilities; the
//! bucket boundaries here (excellent ≥ 0.8, good ≥ 0.6, fair ≥ 0.4,
//! poor below) give downstream consumers a coarse quality signal.

use std::collections::HashMap;

use serde::Serialize;

/// Quality bucket for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    /// Confidence ≥ 0.8
    Excellent,
    /// Confidence ≥ 0.6
    Good,
    /// Confidence ≥ 0.4
    Fair,
    /// Confidence < 0.4
    Poor,
}

impl ConfidenceBucket {
    /// Bucket for a confidence score.
    ///
    /// # Examples
    ///
    /// ```
    /// use docstruct::stats::ConfidenceBucket;
    ///
    /// assert_eq!(ConfidenceBucket::for_score(0.85), ConfidenceBucket::Excellent);
    /// assert_eq!(ConfidenceBucket::for_score(0.3), ConfidenceBucket::Poor);
    /// ```
    pub fn for_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceBucket::Excellent
        } else if score >= 0.6 {
            ConfidenceBucket::Good
        } else if score >= 0.4 {
            ConfidenceBucket::Fair
        } else {
            ConfidenceBucket::Poor
        }
    }
}

/// Distribution of confidence scores across quality buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfidenceDistribution {
    /// Count of scores ≥ 0.8
    pub excellent: usize,
    /// Count of scores in [0.6, 0.8)
    pub good: usize,
    /// Count of scores in [0.4, 0.6)
    pub fair: usize,
    /// Count of scores < 0.4
    pub poor: usize,
}

impl ConfidenceDistribution {
    /// Build a distribution from raw scores.
    pub fn from_scores<I: IntoIterator<Item = f64>>(scores: I) -> Self {
        let mut dist = Self::default();
        for score in scores {
            match ConfidenceBucket::for_score(score) {
                ConfidenceBucket::Excellent => dist.excellent += 1,
                ConfidenceBucket::Good => dist.good += 1,
                ConfidenceBucket::Fair => dist.fair += 1,
                ConfidenceBucket::Poor => dist.poor += 1,
            }
        }
        dist
    }

    /// Total number of scores counted.
    pub fn total(&self) -> usize {
        self.excellent + self.good + self.fair + self.poor
    }
}

/// Statistics over extracted citations.
#[derive(Debug, Clone, Serialize)]
pub struct CitationStatistics {
    /// Total citations
    pub total: usize,
    /// Count per citation type name
    pub by_type: HashMap<String, usize>,
    /// Citations carrying a year
    pub with_year: usize,
    /// Citations carrying a DOI
    pub with_doi: usize,
    /// Mean confidence, 0.0 when empty
    pub average_confidence: f64,
    /// Bucketed confidence distribution
    pub confidence: ConfidenceDistribution,
}

/// Statistics over extracted tables.
#[derive(Debug, Clone, Serialize)]
pub struct TableStatistics {
    /// Total tables
    pub total: usize,
    /// Tables with promoted headers
    pub with_headers: usize,
    /// Count per structure type name
    pub by_structure: HashMap<String, usize>,
    /// Mean row count, 0.0 when empty
    pub average_rows: f64,
    /// Mean column count, 0.0 when empty
    pub average_columns: f64,
    /// Mean confidence, 0.0 when empty
    pub average_confidence: f64,
    /// Bucketed confidence distribution
    pub confidence: ConfidenceDistribution,
}

/// Statistics over extracted figures.
#[derive(Debug, Clone, Serialize)]
pub struct FigureStatistics {
    /// Total figures
    pub total: usize,
    /// Figures with a linked caption
    pub with_captions: usize,
    /// Count per image format
    pub by_format: HashMap<String, usize>,
    /// Mean confidence, 0.0 when empty
    pub average_confidence: f64,
    /// Bucketed confidence distribution
    pub confidence: ConfidenceDistribution,
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(ConfidenceBucket::for_score(1.0), ConfidenceBucket::Excellent);
        assert_eq!(ConfidenceBucket::for_score(0.8), ConfidenceBucket::Excellent);
        assert_eq!(ConfidenceBucket::for_score(0.79), ConfidenceBucket::Good);
        assert_eq!(ConfidenceBucket::for_score(0.6), ConfidenceBucket::Good);
        assert_eq!(ConfidenceBucket::for_score(0.4), ConfidenceBucket::Fair);
        assert_eq!(ConfidenceBucket::for_score(0.39), ConfidenceBucket::Poor);
        assert_eq!(ConfidenceBucket::for_score(0.0), ConfidenceBucket::Poor);
    }

    #[test]
    fn test_distribution_from_scores() {
        let dist = ConfidenceDistribution::from_scores([0.9, 0.7, 0.5, 0.1, 0.85]);
        assert_eq!(dist.excellent, 2);
        assert_eq!(dist.good, 1);
        assert_eq!(dist.fair, 1);
        assert_eq!(dist.poor, 1);
        assert_eq!(dist.total(), 5);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }
}
