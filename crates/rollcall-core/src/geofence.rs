//! Great-circle geofence validation.
//!
//! Haversine distance over a spherical Earth model, plus the inclusive
//! within-radius check used to verify a live GPS fix against a class anchor.

use thiserror::Error;

use crate::types::{ClassLocation, GeoPoint, GeoVerdict};

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("coordinate out of range: lat={latitude}, lon={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Haversine distance calculator over a sphere of configurable radius.
#[derive(Debug, Clone, Copy)]
pub struct Geofence {
    earth_radius_m: f64,
}

impl Geofence {
    pub fn new(earth_radius_m: f64) -> Self {
        Self { earth_radius_m }
    }

    /// Great-circle distance in meters between two points.
    ///
    /// Pure and deterministic: identical inputs yield bit-identical output.
    /// The atan2 form is numerically stable for all valid pairs, including
    /// antipodal points and the poles.
    pub fn distance_meters(&self, a: &GeoPoint, b: &GeoPoint) -> Result<f64, GeoError> {
        for p in [a, b] {
            if !p.in_range() {
                return Err(GeoError::InvalidCoordinate {
                    latitude: p.latitude,
                    longitude: p.longitude,
                });
            }
        }

        let phi1 = a.latitude.to_radians();
        let phi2 = b.latitude.to_radians();
        let d_phi = (b.latitude - a.latitude).to_radians();
        let d_lambda = (b.longitude - a.longitude).to_radians();

        let h = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        // Rounding can push h fractionally above 1 near the antipode, which
        // would put a negative under the square root. Clamp first.
        let h = h.min(1.0);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        Ok(self.earth_radius_m * c)
    }

    /// Check a live fix against a class anchor. The boundary is inclusive:
    /// a distance exactly equal to the radius verifies.
    pub fn check(&self, current: &GeoPoint, class: &ClassLocation) -> Result<GeoVerdict, GeoError> {
        let distance_m = self.distance_meters(current, &class.anchor)?;
        Ok(GeoVerdict {
            verified: distance_m <= class.radius_m,
            distance_m,
            radius_m: class.radius_m,
        })
    }
}

impl Default for Geofence {
    fn default() -> Self {
        Self::new(crate::Policy::default().earth_radius_m)
    }
}
