use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use rollcall_core::{
    ClassLocation, DayLedger, EnrolledIdentity, Evaluator, FaceDescriptor, FaceMatcher, Geofence,
    GeoPoint, LedgerRecord, Policy,
};

#[derive(Parser)]
#[command(name = "rollcall", about = "Geofenced face-recognition attendance CLI")]
struct Cli {
    /// Optional policy JSON file overriding default thresholds
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one attendance attempt: face, geofence, cooldown
    Decide {
        /// Probe descriptor file (JSON array of floats)
        #[arg(long)]
        probe: PathBuf,
        /// Enrolled identity directory file (JSON array)
        #[arg(long)]
        directory: PathBuf,
        /// Class location file (JSON object)
        #[arg(long)]
        class: PathBuf,
        /// Live fix latitude in decimal degrees
        #[arg(long)]
        lat: f64,
        /// Live fix longitude in decimal degrees
        #[arg(long)]
        lon: f64,
        /// Reported GPS accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,
        /// Day-ledger file to post an accepted event into (time-in/time-out)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Match a probe descriptor against the directory, no location check
    Match {
        /// Probe descriptor file (JSON array of floats)
        #[arg(long)]
        probe: PathBuf,
        /// Enrolled identity directory file (JSON array)
        #[arg(long)]
        directory: PathBuf,
    },
    /// Great-circle distance in meters between two points
    Distance {
        #[arg(long)]
        from_lat: f64,
        #[arg(long)]
        from_lon: f64,
        #[arg(long)]
        to_lat: f64,
        #[arg(long)]
        to_lon: f64,
    },
    /// Print a day-ledger file, optionally filtered
    Ledger {
        /// Ledger file (JSON array of records)
        #[arg(long)]
        file: PathBuf,
        /// Only records for this identity
        #[arg(long)]
        identity: Option<String>,
        /// Only records for this class
        #[arg(long)]
        class: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let policy = load_policy(cli.policy.as_deref())?;

    match cli.command {
        Commands::Decide {
            probe,
            directory,
            class,
            lat,
            lon,
            accuracy,
            ledger,
        } => {
            let probe = load_probe(&probe)?;
            let directory: Vec<EnrolledIdentity> = read_json(&directory)?;
            let class: ClassLocation = read_json(&class)?;
            let current = GeoPoint {
                latitude: lat,
                longitude: lon,
                accuracy_m: accuracy,
            };

            let now = Utc::now();
            let evaluator = Evaluator::new(&policy);
            let decision = evaluator
                .decide(&probe, &current, &class, &directory, now)
                .context("evaluation failed")?;

            if decision.accepted() {
                if let (Some(path), Some(face)) = (ledger.as_deref(), decision.face.as_ref()) {
                    let status = post_to_ledger(path, &face.identity_id, &class.id, now)?;
                    tracing::info!(?status, path = %path.display(), "ledger updated");
                }
            }

            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Match { probe, directory } => {
            let probe = load_probe(&probe)?;
            let directory: Vec<EnrolledIdentity> = read_json(&directory)?;
            let matcher = FaceMatcher::new(&policy);
            let result = matcher
                .match_probe(&probe, &directory)
                .context("matching failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Distance {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
        } => {
            let geofence = Geofence::new(policy.earth_radius_m);
            let meters = geofence
                .distance_meters(
                    &GeoPoint::new(from_lat, from_lon),
                    &GeoPoint::new(to_lat, to_lon),
                )
                .context("distance computation failed")?;
            println!("{meters:.1}");
        }
        Commands::Ledger {
            file,
            identity,
            class,
        } => {
            let records: Vec<LedgerRecord> = read_json(&file)?;
            let filtered: Vec<&LedgerRecord> = records
                .iter()
                .filter(|r| identity.as_deref().map_or(true, |id| r.identity_id == id))
                .filter(|r| class.as_deref().map_or(true, |c| r.class_id == c))
                .collect();
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
    }

    Ok(())
}

fn load_policy(path: Option<&Path>) -> Result<Policy> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Policy::default()),
    }
}

/// Probe files hold a bare JSON array of floats, matching what the upstream
/// embedding model emits.
fn load_probe(path: &Path) -> Result<FaceDescriptor> {
    let values: Vec<f32> = read_json(path)?;
    Ok(FaceDescriptor::new(values))
}

/// Replay the ledger file, post the accepted event, write it back.
fn post_to_ledger(
    path: &Path,
    identity_id: &str,
    class_id: &str,
    now: chrono::DateTime<Utc>,
) -> Result<rollcall_core::LedgerStatus> {
    let records: Vec<LedgerRecord> = if path.exists() {
        read_json(path)?
    } else {
        Vec::new()
    };
    let ledger = DayLedger::from_records(records);
    let status = ledger.post(identity_id, class_id, now);
    let raw = serde_json::to_string_pretty(&ledger.to_records())?;
    std::fs::write(path, raw).with_context(|| format!("writing ledger {}", path.display()))?;
    Ok(status)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
