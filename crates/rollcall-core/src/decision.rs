//! Attendance decision orchestrator.
//!
//! Composes the face matcher, geofence validator, and cooldown tracker into
//! a single deterministic decision per recognition tick. Checks run in cost
//! order: face first (the cheapest and most common rejection), then
//! location, then cooldown — cooldown last so remaining-time messaging only
//! appears for an otherwise-valid event.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cooldown::CooldownTracker;
use crate::geofence::{GeoError, Geofence};
use crate::matcher::{FaceMatcher, MatchError};
use crate::policy::Policy;
use crate::types::{
    AttendanceDecision, ClassLocation, EnrolledIdentity, FaceDescriptor, GeoPoint, Outcome,
};

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Stateless-per-call evaluator; the cooldown map is its only mutable state,
/// so a shared `&Evaluator` is safe across concurrent kiosk loops.
#[derive(Debug)]
pub struct Evaluator {
    matcher: FaceMatcher,
    geofence: Geofence,
    cooldown: CooldownTracker,
}

impl Evaluator {
    pub fn new(policy: &Policy) -> Self {
        Self {
            matcher: FaceMatcher::new(policy),
            geofence: Geofence::new(policy.earth_radius_m),
            cooldown: CooldownTracker::new(Duration::from_secs(policy.cooldown_window_secs)),
        }
    }

    /// Evaluate one recognition tick.
    ///
    /// The directory and class are read-only snapshots owned by the caller;
    /// the only side effect is the cooldown mark, applied on acceptance.
    /// Rejections come back as ordinary decisions, never as errors.
    pub fn decide(
        &self,
        probe: &FaceDescriptor,
        current: &GeoPoint,
        class: &ClassLocation,
        directory: &[EnrolledIdentity],
        now: DateTime<Utc>,
    ) -> Result<AttendanceDecision, DecisionError> {
        let Some(face) = self.matcher.match_probe(probe, directory)? else {
            return Ok(AttendanceDecision {
                outcome: Outcome::RejectedFace,
                face: None,
                geo: None,
                cooldown_remaining_secs: None,
                reason: "face not recognized against the enrolled directory".to_string(),
            });
        };

        let geo = self.geofence.check(current, class)?;
        if !geo.verified {
            let decision = AttendanceDecision {
                outcome: Outcome::RejectedLocation,
                reason: format!(
                    "you must be within {:.0} m of {} to mark attendance; current distance: {:.0} m",
                    geo.radius_m,
                    class.name,
                    geo.distance_m.round()
                ),
                face: Some(face),
                geo: Some(geo),
                cooldown_remaining_secs: None,
            };
            tracing::info!(
                class = %class.id,
                distance_m = geo.distance_m,
                radius_m = geo.radius_m,
                "attendance rejected: outside geofence"
            );
            return Ok(decision);
        }

        if let Err(remaining) = self.cooldown.check_and_mark(&face.identity_id, now) {
            let remaining_secs = remaining.as_secs_f64().ceil() as u64;
            return Ok(AttendanceDecision {
                outcome: Outcome::RejectedCooldown,
                reason: format!(
                    "{} was accepted recently; wait {remaining_secs} s before marking again",
                    face.identity_name
                ),
                face: Some(face),
                geo: Some(geo),
                cooldown_remaining_secs: Some(remaining_secs),
            });
        }

        tracing::info!(
            identity = %face.identity_id,
            class = %class.id,
            confidence = face.confidence,
            distance_m = geo.distance_m,
            "attendance accepted"
        );

        Ok(AttendanceDecision {
            outcome: Outcome::Accepted,
            reason: format!("attendance accepted for {}", face.identity_name),
            face: Some(face),
            geo: Some(geo),
            cooldown_remaining_secs: None,
        })
    }
}
