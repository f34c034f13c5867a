//! Best-match face identification with margin-based ambiguity rejection.
//!
//! Scores a probe descriptor against every enrolled identity's stored
//! descriptors and accepts the closest identity only when confidence,
//! distance, and best/runner-up margin all clear policy thresholds.

use thiserror::Error;

use crate::policy::Policy;
use crate::types::{EnrolledIdentity, FaceDescriptor, FaceMatch};

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("probe descriptor has {actual} components, expected {expected}")]
    InvalidDescriptor { expected: usize, actual: usize },
    #[error("probe descriptor contains non-finite values")]
    NonFiniteProbe,
}

/// One identity's best score against the probe.
#[derive(Debug, Clone)]
struct Candidate<'a> {
    identity: &'a EnrolledIdentity,
    best_distance: f32,
}

/// Best-match face matcher over a read-only directory snapshot.
#[derive(Debug, Clone)]
pub struct FaceMatcher {
    descriptor_len: usize,
    confidence_threshold: f32,
    distance_ceiling: f32,
    margin_threshold: f32,
}

impl FaceMatcher {
    pub fn new(policy: &Policy) -> Self {
        Self {
            descriptor_len: policy.descriptor_len,
            confidence_threshold: policy.confidence_threshold,
            distance_ceiling: policy.distance_ceiling,
            margin_threshold: policy.margin_threshold,
        }
    }

    /// Match a probe against the enrolled directory.
    ///
    /// Returns `Ok(None)` when nothing matches — an expected result, covering
    /// the empty directory, directories with no usable descriptors, and
    /// probes that fail the acceptance thresholds. A malformed probe is a
    /// caller contract violation and fails fast.
    pub fn match_probe(
        &self,
        probe: &FaceDescriptor,
        directory: &[EnrolledIdentity],
    ) -> Result<Option<FaceMatch>, MatchError> {
        if probe.values.len() != self.descriptor_len {
            return Err(MatchError::InvalidDescriptor {
                expected: self.descriptor_len,
                actual: probe.values.len(),
            });
        }
        if !probe.values.iter().all(|v| v.is_finite()) {
            return Err(MatchError::NonFiniteProbe);
        }

        // Best distance per identity. Unusable stored descriptors are
        // silently excluded, never scored as distance 0.
        let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(directory.len());
        for identity in directory {
            let best = identity
                .descriptors
                .iter()
                .filter(|d| d.is_usable(self.descriptor_len))
                .map(|d| probe.euclidean_distance(d))
                .fold(f32::INFINITY, f32::min);
            if best.is_finite() {
                candidates.push(Candidate {
                    identity,
                    best_distance: best,
                });
            }
        }

        if candidates.is_empty() {
            tracing::debug!(enrolled = directory.len(), "no scorable identities");
            return Ok(None);
        }

        candidates.sort_by(|a, b| a.best_distance.total_cmp(&b.best_distance));

        let best = &candidates[0];
        let second = candidates.get(1);

        // Linear confidence over the unit-normalized distance scale:
        // distance 0 → 1.0, distance ≥ 1 → 0.0.
        let confidence = (1.0 - best.best_distance).max(0.0);
        let margin = second.map_or(0.0, |s| s.best_distance - best.best_distance);

        let confident = confidence > self.confidence_threshold;
        let reasonable = best.best_distance < self.distance_ceiling;
        // A single enrollee has no runner-up to discriminate against, so the
        // margin test is waived for it.
        let discriminated = margin > self.margin_threshold || candidates.len() == 1;

        tracing::debug!(
            identity = %best.identity.id,
            distance = best.best_distance,
            confidence,
            margin,
            candidates = candidates.len(),
            accepted = confident && reasonable && discriminated,
            "scored probe"
        );

        if confident && reasonable && discriminated {
            Ok(Some(FaceMatch {
                identity_id: best.identity.id.clone(),
                identity_name: best.identity.name.clone(),
                distance: best.best_distance,
                confidence,
                margin,
            }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIM: usize = 4;

    fn test_policy() -> Policy {
        Policy {
            descriptor_len: DIM,
            ..Policy::default()
        }
    }

    /// A descriptor at the given Euclidean distance from the origin probe.
    fn at_distance(d: f32) -> FaceDescriptor {
        FaceDescriptor::new(vec![d, 0.0, 0.0, 0.0])
    }

    fn identity(id: &str, descriptors: Vec<FaceDescriptor>) -> EnrolledIdentity {
        EnrolledIdentity {
            id: id.into(),
            name: id.to_uppercase(),
            descriptors,
        }
    }

    fn probe() -> FaceDescriptor {
        FaceDescriptor::new(vec![0.0; DIM])
    }

    #[test]
    fn test_empty_directory_is_no_match() {
        let m = FaceMatcher::new(&test_policy());
        assert!(m.match_probe(&probe(), &[]).unwrap().is_none());
    }

    #[test]
    fn test_invalid_probe_rejected_at_entry() {
        let m = FaceMatcher::new(&test_policy());
        let short = FaceDescriptor::new(vec![0.0; DIM - 1]);
        assert!(matches!(
            m.match_probe(&short, &[identity("a", vec![at_distance(0.1)])]),
            Err(MatchError::InvalidDescriptor {
                expected: DIM,
                actual: 3
            })
        ));

        let nan = FaceDescriptor::new(vec![0.0, f32::NAN, 0.0, 0.0]);
        assert!(matches!(
            m.match_probe(&nan, &[identity("a", vec![at_distance(0.1)])]),
            Err(MatchError::NonFiniteProbe)
        ));
    }

    #[test]
    fn test_single_candidate_exemption() {
        // One enrollee at distance 0.3: confidence 0.7, no runner-up, so the
        // margin test cannot apply — accepted.
        let m = FaceMatcher::new(&test_policy());
        let dir = [identity("alice", vec![at_distance(0.3)])];
        let found = m.match_probe(&probe(), &dir).unwrap().unwrap();
        assert_eq!(found.identity_id, "alice");
        assert!((found.distance - 0.3).abs() < 1e-6);
        assert!((found.confidence - 0.7).abs() < 1e-6);
        assert_eq!(found.margin, 0.0);
    }

    #[test]
    fn test_margin_rejection_with_close_runner_up() {
        // Best 0.3 vs second 0.32: margin 0.02 < 0.05, rejected even though
        // confidence (0.7) and distance (< 0.8) both pass.
        let m = FaceMatcher::new(&test_policy());
        let dir = [
            identity("alice", vec![at_distance(0.3)]),
            identity("bob", vec![at_distance(0.32)]),
        ];
        assert!(m.match_probe(&probe(), &dir).unwrap().is_none());
    }

    #[test]
    fn test_wide_margin_accepted() {
        let m = FaceMatcher::new(&test_policy());
        let dir = [
            identity("alice", vec![at_distance(0.3)]),
            identity("bob", vec![at_distance(0.6)]),
        ];
        let found = m.match_probe(&probe(), &dir).unwrap().unwrap();
        assert_eq!(found.identity_id, "alice");
        assert!((found.margin - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_distance_ceiling_rejects_far_probe() {
        // Best distance 0.85 exceeds the 0.8 ceiling — rejected regardless
        // of the other criteria.
        let m = FaceMatcher::new(&test_policy());
        let dir = [identity("alice", vec![at_distance(0.85)])];
        assert!(m.match_probe(&probe(), &dir).unwrap().is_none());
    }

    #[test]
    fn test_best_of_multiple_descriptors_per_identity() {
        let m = FaceMatcher::new(&test_policy());
        let dir = [identity(
            "alice",
            vec![at_distance(0.7), at_distance(0.2), at_distance(0.5)],
        )];
        let found = m.match_probe(&probe(), &dir).unwrap().unwrap();
        assert!((found.distance - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unusable_stored_descriptors_excluded() {
        let m = FaceMatcher::new(&test_policy());
        // Malformed stored data is skipped, not treated as a perfect match.
        let broken = FaceDescriptor::new(vec![f32::NAN; DIM]);
        let short = FaceDescriptor::new(vec![0.0; DIM - 1]);
        let dir = [
            identity("ghost", vec![broken, short]),
            identity("alice", vec![at_distance(0.3)]),
        ];
        // "ghost" contributes no candidate, so "alice" is effectively the
        // single enrollee and the margin exemption applies.
        let found = m.match_probe(&probe(), &dir).unwrap().unwrap();
        assert_eq!(found.identity_id, "alice");
    }

    #[test]
    fn test_directory_with_only_unusable_descriptors() {
        let m = FaceMatcher::new(&test_policy());
        let dir = [identity("ghost", vec![FaceDescriptor::new(vec![])])];
        assert!(m.match_probe(&probe(), &dir).unwrap().is_none());
    }
}
