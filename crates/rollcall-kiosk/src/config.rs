use std::path::PathBuf;

use rollcall_core::Policy;

/// Kiosk configuration, loaded from environment variables.
pub struct Config {
    /// JSON file holding the enrolled identity directory snapshot.
    pub directory_file: PathBuf,
    /// JSON file holding the class location.
    pub class_file: PathBuf,
    /// Evaluation policy with `ROLLCALL_*` overrides applied.
    pub policy: Policy,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Policy::default();
        let policy = Policy {
            descriptor_len: env_usize("ROLLCALL_DESCRIPTOR_LEN", defaults.descriptor_len),
            confidence_threshold: env_f32(
                "ROLLCALL_CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            ),
            distance_ceiling: env_f32("ROLLCALL_DISTANCE_CEILING", defaults.distance_ceiling),
            margin_threshold: env_f32("ROLLCALL_MARGIN_THRESHOLD", defaults.margin_threshold),
            cooldown_window_secs: env_u64(
                "ROLLCALL_COOLDOWN_WINDOW_SECS",
                defaults.cooldown_window_secs,
            ),
            earth_radius_m: env_f64("ROLLCALL_EARTH_RADIUS_M", defaults.earth_radius_m),
        };

        Self {
            directory_file: std::env::var("ROLLCALL_DIRECTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("directory.json")),
            class_file: std::env::var("ROLLCALL_CLASS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("class.json")),
            policy,
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
