//! rollcall-core — geofenced face-recognition attendance decisions.
//!
//! Two decision leaves — a best-match face matcher with margin-based
//! ambiguity rejection, and a haversine geofence validator — composed by an
//! orchestrator that also enforces a per-identity cooldown. The library owns
//! no storage or transport: callers pass read-only snapshots of the enrolled
//! directory and class location and persist the returned decision themselves.

pub mod cooldown;
pub mod decision;
pub mod geofence;
pub mod ledger;
pub mod matcher;
pub mod policy;
pub mod types;

pub use cooldown::CooldownTracker;
pub use decision::{DecisionError, Evaluator};
pub use geofence::{GeoError, Geofence};
pub use ledger::{DayEntry, DayLedger, LedgerRecord, LedgerStatus};
pub use matcher::{FaceMatcher, MatchError};
pub use policy::Policy;
pub use types::{
    AttendanceDecision, ClassLocation, EnrolledIdentity, FaceDescriptor, FaceMatch, GeoPoint,
    GeoVerdict, Outcome,
};
