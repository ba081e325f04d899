//! ---
//! fz_section: "11-simulation"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Simulation runtime helpers and synthetic telemetry."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown sensor metric: {0}")]
    UnknownMetric(String),
}
