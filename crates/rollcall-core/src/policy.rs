use serde::Deserialize;

// --- Default policy values (calibrated against the face-api.js 128-d model) ---
const DEFAULT_DESCRIPTOR_LEN: usize = 128;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_DISTANCE_CEILING: f32 = 0.8;
const DEFAULT_MARGIN_THRESHOLD: f32 = 0.05;
const DEFAULT_COOLDOWN_WINDOW_SECS: u64 = 30;
const DEFAULT_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Tunable thresholds for attendance evaluation.
///
/// Every field has a default so a policy file may override only what it
/// needs. The matcher thresholds are empirical calibrations against one
/// embedding model's distance distribution — heuristics, not probabilities.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Expected descriptor dimensionality (fixed by the upstream model).
    pub descriptor_len: usize,
    /// Minimum linear confidence for a face match.
    pub confidence_threshold: f32,
    /// Maximum acceptable best-match distance.
    pub distance_ceiling: f32,
    /// Minimum gap to the runner-up identity (waived for a single enrollee).
    pub margin_threshold: f32,
    /// Minimum seconds between two accepted events for one identity.
    pub cooldown_window_secs: u64,
    /// Mean Earth radius used by the haversine distance.
    pub earth_radius_m: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            descriptor_len: DEFAULT_DESCRIPTOR_LEN,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            distance_ceiling: DEFAULT_DISTANCE_CEILING,
            margin_threshold: DEFAULT_MARGIN_THRESHOLD,
            cooldown_window_secs: DEFAULT_COOLDOWN_WINDOW_SECS,
            earth_radius_m: DEFAULT_EARTH_RADIUS_M,
        }
    }
}
