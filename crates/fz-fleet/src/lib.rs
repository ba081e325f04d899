//! ---
//! fz_section: "02-fleet-model"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Fleet catalog, users and visibility rules."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Fleet model for FaultZero: the fixed machine catalog, the user and
//! selection types supplied by the session collaborator, and the access
//! filter that decides which machines a user may see.

pub mod access;
pub mod errors;
pub mod model;
pub mod registry;
pub mod session;

pub use access::{filter_accessible, filter_for_selection, visible_accessible, visible_for_selection};
pub use errors::{FleetError, Result};
pub use model::{
    Machine, MachineId, MachineSeed, MachineStatus, MachineType, Plant, Role, Selection,
    TypeFilter, User, CRITICAL_THRESHOLD, HEALTHY_THRESHOLD,
};
pub use registry::{FleetRegistry, FLEET_SIZE};
pub use session::UserDirectory;
