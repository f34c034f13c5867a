use serde::{Deserialize, Serialize};

/// Face embedding vector (128-dimensional for the face-api.js recognition model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDescriptor {
    pub values: Vec<f32>,
}

impl FaceDescriptor {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Compute Euclidean distance between two descriptors.
    ///
    /// Smaller = more similar. Only meaningful for descriptors of equal length.
    pub fn euclidean_distance(&self, other: &FaceDescriptor) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Whether this descriptor can participate in matching: the expected
    /// length and every component finite.
    pub fn is_usable(&self, expected_len: usize) -> bool {
        self.values.len() == expected_len && self.values.iter().all(|v| v.is_finite())
    }
}

/// An enrolled identity with its stored reference descriptors.
///
/// Read-only snapshot row from the external identity directory; the core
/// never mutates it. Enrollment captures at least 3 descriptors in practice,
/// but one is enough to score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolledIdentity {
    pub id: String,
    pub name: String,
    pub descriptors: Vec<FaceDescriptor>,
}

/// A latitude/longitude fix in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported GPS accuracy in meters, when the fix carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    /// Whether the coordinates lie in the valid WGS-84 ranges.
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A class anchor point plus the attendance radius around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassLocation {
    pub id: String,
    pub name: String,
    pub anchor: GeoPoint,
    /// Attendance radius in meters (typical policy value 30–50 m).
    pub radius_m: f64,
}

/// Result of matching a probe descriptor against the enrolled directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceMatch {
    pub identity_id: String,
    pub identity_name: String,
    /// Best Euclidean distance to any of the identity's descriptors.
    pub distance: f32,
    /// Linear confidence over the unit-normalized distance scale [0, 1].
    pub confidence: f32,
    /// Gap to the runner-up identity's best distance (0 when none exists).
    pub margin: f32,
}

/// Result of a geofence check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoVerdict {
    pub verified: bool,
    pub distance_m: f64,
    pub radius_m: f64,
}

/// Outcome of one attendance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Accepted,
    RejectedFace,
    RejectedLocation,
    RejectedCooldown,
}

/// The full result of one attendance evaluation.
///
/// Ephemeral: returned to the caller, who persists the resulting event.
/// Rejections are ordinary data, not errors — they occur on the majority of
/// evaluation ticks during normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDecision {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_secs: Option<u64>,
    /// Human-readable reason suitable for user-facing messaging.
    pub reason: String,
}

impl AttendanceDecision {
    pub fn accepted(&self) -> bool {
        self.outcome == Outcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_identical() {
        let a = FaceDescriptor::new(vec![0.5, -0.25, 0.1]);
        assert_eq!(a.euclidean_distance(&a), 0.0);
    }

    #[test]
    fn test_euclidean_distance_known() {
        let a = FaceDescriptor::new(vec![0.0, 0.0]);
        let b = FaceDescriptor::new(vec![3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_usable_rejects_wrong_length() {
        let d = FaceDescriptor::new(vec![0.1; 127]);
        assert!(!d.is_usable(128));
        let d = FaceDescriptor::new(vec![0.1; 128]);
        assert!(d.is_usable(128));
    }

    #[test]
    fn test_usable_rejects_non_finite() {
        let d = FaceDescriptor::new(vec![0.1, f32::NAN, 0.3]);
        assert!(!d.is_usable(3));
        let d = FaceDescriptor::new(vec![0.1, f32::INFINITY, 0.3]);
        assert!(!d.is_usable(3));
    }

    #[test]
    fn test_geo_point_range() {
        assert!(GeoPoint::new(90.0, 180.0).in_range());
        assert!(GeoPoint::new(-90.0, -180.0).in_range());
        assert!(!GeoPoint::new(90.01, 0.0).in_range());
        assert!(!GeoPoint::new(0.0, -180.5).in_range());
    }

    #[test]
    fn test_outcome_serde_kebab_case() {
        let json = serde_json::to_string(&Outcome::RejectedLocation).unwrap();
        assert_eq!(json, "\"rejected-location\"");
        let back: Outcome = serde_json::from_str("\"rejected-cooldown\"").unwrap();
        assert_eq!(back, Outcome::RejectedCooldown);
    }
}
