//! Exam Proctor - Preflight Entry Point
//!
//! Scores a recorded environment snapshot (JSON) against the admission gate.
//! Exit code: 0 allowed, 2 blocked, 1 on error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use exam_proctor_core::constants::{APP_NAME, APP_VERSION};
use exam_proctor_core::logic::config::ProctorThresholds;
use exam_proctor_core::logic::environment::{EnvironmentAssessor, EnvironmentSnapshot, Recommendation};

#[derive(Debug, Error)]
enum PreflightError {
    #[error("usage: exam-proctor-preflight <snapshot.json>")]
    Usage,
    #[error("cannot read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("invalid snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

async fn run() -> Result<Recommendation, PreflightError> {
    let path = std::env::args_os().nth(1).map(PathBuf::from).ok_or(PreflightError::Usage)?;
    let raw = std::fs::read_to_string(&path).map_err(|e| PreflightError::Read(path.clone(), e))?;
    let snapshot: EnvironmentSnapshot = serde_json::from_str(&raw)?;

    let thresholds = ProctorThresholds::from_env();
    let assessor = EnvironmentAssessor::new(Arc::new(snapshot), thresholds.network_timeout());
    let assessment = assessor.assess().await;

    log::info!(
        "Assessment: overall={} recommendation={}",
        assessment.overall,
        assessment.recommendation.as_str()
    );
    for issue in &assessment.issues {
        log::warn!("  - {}", issue);
    }
    println!("{}", serde_json::to_string_pretty(&assessment)?);

    Ok(assessment.recommendation)
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} preflight v{}", APP_NAME, APP_VERSION);

    match run().await {
        Ok(Recommendation::Blocked) => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(1)
        }
    }
}
