//! Load-failure taxonomy. Per-record and per-event problems are warnings,
//! not errors; only a total bundle-load failure is fatal to starting a
//! replay session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch simulation bundle: {0}")]
    Transport(#[from] std::io::Error),

    #[error("simulation bundle is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("simulation bundle has no {0}")]
    MissingSection(&'static str),
}
