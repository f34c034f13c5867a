use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use rollcall_core::{
    AttendanceDecision, ClassLocation, EnrolledIdentity, Evaluator, FaceDescriptor, GeoPoint,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("decision error: {0}")]
    Decision(#[from] rollcall_core::DecisionError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// One recognition tick from a capture loop: a probe descriptor plus the
/// live GPS fix taken alongside it.
#[derive(Debug, Clone, Deserialize)]
pub struct Tick {
    pub probe: Vec<f32>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

/// Messages sent from kiosk loops to the engine thread.
enum EngineRequest {
    Decide {
        tick: Tick,
        reply: oneshot::Sender<Result<AttendanceDecision, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread. Several kiosk loops may share
/// one handle; requests are serialized through the engine's queue and the
/// cooldown map keeps per-identity admissions monotonic.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Evaluate one tick: match the probe, verify the geofence, check the
    /// cooldown.
    pub async fn decide(&self, tick: Tick) -> Result<AttendanceDecision, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Decide {
                tick,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The engine owns the evaluator and the directory/class snapshots loaded at
/// startup, then enters a request loop until every handle is dropped.
pub fn spawn_engine(
    evaluator: Evaluator,
    directory: Vec<EnrolledIdentity>,
    class: ClassLocation,
) -> EngineHandle {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("rollcall-engine".into())
        .spawn(move || {
            tracing::info!(
                enrolled = directory.len(),
                class = %class.id,
                "engine thread started"
            );
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Decide { tick, reply } => {
                        let result = run_decide(&evaluator, &directory, &class, tick);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    EngineHandle { tx }
}

fn run_decide(
    evaluator: &Evaluator,
    directory: &[EnrolledIdentity],
    class: &ClassLocation,
    tick: Tick,
) -> Result<AttendanceDecision, EngineError> {
    let probe = FaceDescriptor::new(tick.probe);
    let current = GeoPoint {
        latitude: tick.latitude,
        longitude: tick.longitude,
        accuracy_m: tick.accuracy_m,
    };
    let decision = evaluator.decide(&probe, &current, class, directory, Utc::now())?;
    tracing::debug!(outcome = ?decision.outcome, "tick evaluated");
    Ok(decision)
}
