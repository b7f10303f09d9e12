//! Spatial matching between page entities.
//!
//! Caption linking for tables and figures works on center-to-center
//! distances between bounding boxes. [`SpatialMatcher`] owns the distance
//! cap and the nearest-candidate selection used by both extractors.

use crate::geometry::{euclidean_distance, BoundingBox};

/// Default distance cap for caption matching, in layout units.
pub const DEFAULT_MAX_DISTANCE: f64 = 200.0;

/// Matches entities by bounding-box center distance.
#[derive(Debug, Clone)]
pub struct SpatialMatcher {
    max_distance: f64,
}

impl Default for SpatialMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE)
    }
}

impl SpatialMatcher {
    /// Create a matcher with the given distance cap.
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    /// Euclidean distance between the centers of two bounding boxes.
    ///
    /// Symmetric, and zero for identical boxes.
    ///
    /// # Examples
    ///
    /// ```
    /// use docstruct::geometry::BoundingBox;
    /// use docstruct::spatial::SpatialMatcher;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    /// let b = BoundingBox::new(30.0, 40.0, 40.0, 50.0);
    /// assert_eq!(SpatialMatcher::center_distance(&a, &b), 50.0);
    /// ```
    pub fn center_distance(a: &BoundingBox, b: &BoundingBox) -> f64 {
        euclidean_distance(&a.center(), &b.center())
    }

    /// Index of the candidate box nearest to `target`, or `None` when the
    /// nearest candidate is farther than the distance cap.
    ///
    /// Candidates are expected to come from the same page as the target;
    /// callers filter by page before matching. Ties go to the earliest
    /// candidate, which keeps matching deterministic.
    pub fn match_nearest(&self, target: &BoundingBox, candidates: &[BoundingBox]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (i, candidate) in candidates.iter().enumerate() {
            let d = Self::center_distance(target, candidate);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }

        best.filter(|&(_, d)| d <= self.max_distance).map(|(i, _)| i)
    }

    /// The configured distance cap.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_distance_symmetric() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(100.0, 50.0, 120.0, 70.0);
        assert_eq!(
            SpatialMatcher::center_distance(&a, &b),
            SpatialMatcher::center_distance(&b, &a)
        );
    }

    #[test]
    fn test_center_distance_identity() {
        let a = BoundingBox::new(5.0, 5.0, 25.0, 35.0);
        assert_eq!(SpatialMatcher::center_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_match_nearest_picks_closest() {
        let matcher = SpatialMatcher::default();
        let target = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let candidates = vec![
            BoundingBox::new(100.0, 0.0, 110.0, 10.0),
            BoundingBox::new(20.0, 0.0, 30.0, 10.0),
            BoundingBox::new(50.0, 0.0, 60.0, 10.0),
        ];

        assert_eq!(matcher.match_nearest(&target, &candidates), Some(1));
    }

    #[test]
    fn test_match_nearest_respects_cap() {
        let matcher = SpatialMatcher::new(50.0);
        let target = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let candidates = vec![BoundingBox::new(200.0, 200.0, 210.0, 210.0)];

        assert_eq!(matcher.match_nearest(&target, &candidates), None);
    }

    #[test]
    fn test_match_nearest_empty_candidates() {
        let matcher = SpatialMatcher::default();
        let target = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(matcher.match_nearest(&target, &[]), None);
    }

    #[test]
    fn test_match_nearest_tie_goes_to_first() {
        let matcher = SpatialMatcher::default();
        let target = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        // Equidistant candidates left and right of the target center
        let candidates = vec![
            BoundingBox::new(-30.0, 0.0, -20.0, 10.0),
            BoundingBox::new(20.0, 0.0, 30.0, 10.0),
        ];
        assert_eq!(matcher.match_nearest(&target, &candidates), Some(0));
    }

    proptest::proptest! {
        #[test]
        fn prop_distance_symmetry(
            x0 in -1000.0..1000.0f64, y0 in -1000.0..1000.0f64,
            x1 in -1000.0..1000.0f64, y1 in -1000.0..1000.0f64,
            a0 in -1000.0..1000.0f64, b0 in -1000.0..1000.0f64,
            a1 in -1000.0..1000.0f64, b1 in -1000.0..1000.0f64,
        ) {
            let r1 = BoundingBox::new(x0, y0, x1, y1);
            let r2 = BoundingBox::new(a0, b0, a1, b1);
            let d12 = SpatialMatcher::center_distance(&r1, &r2);
            let d21 = SpatialMatcher::center_distance(&r2, &r1);
            proptest::prop_assert!((d12 - d21).abs() < 1e-9);
            proptest::prop_assert!(SpatialMatcher::center_distance(&r1, &r1) == 0.0);
            proptest::prop_assert!(d12 >= 0.0);
        }
    }
}
