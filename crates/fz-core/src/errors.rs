//! ---
//! fz_section: "04-engine-orchestration"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Dashboard engine lifecycle, scheduling and preferences."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use fz_fleet::FleetError;
use fz_sim::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("simulation ticker needs a running tokio runtime")]
    NoRuntime,
    #[error("simulation ticker period must be greater than zero")]
    ZeroPeriod,
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("user directory is empty")]
    EmptyDirectory,
    #[error(transparent)]
    Fleet(#[from] FleetError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
