//! ---
//! fz_section: "02-fleet-model"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Fleet catalog, users and visibility rules."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

/// Errors raised at the string and construction boundaries of the fleet model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("unknown plant: {0}")]
    UnknownPlant(String),
    #[error("unknown machine type: {0}")]
    UnknownMachineType(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("user {user} must be assigned at least one {what}")]
    EmptyAssignment { user: String, what: &'static str },
}
