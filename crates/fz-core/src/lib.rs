//! ---
//! fz_section: "04-engine-orchestration"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Dashboard engine lifecycle, scheduling and preferences."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
pub mod engine;
pub mod errors;
pub mod preferences;
pub mod scheduler;

pub use engine::{
    derive_fleet_views, derive_focus_views, recompute, DashboardEngine, DerivedViews,
    EngineOptions, EngineSnapshot, FleetViews, FocusTarget, FocusViews, RecomputeInput,
};
pub use errors::{EngineError, Result};
pub use preferences::{
    InMemoryPreferenceStore, JsonFilePreferenceStore, PreferenceStore, Preferences,
};
pub use scheduler::{SimulationTicker, TickOutcome, TickStats};
