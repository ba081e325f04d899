//! ---
//! fz_section: "11-simulation"
//! fz_subsection: "01-bootstrap"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Simulation runtime module exports and shared types."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Random-walk fleet simulation and synthetic sensor history for FaultZero.

pub mod errors;
pub mod random;
pub mod sensor;
pub mod walk;

pub use errors::SimError;
pub use random::{RandomSource, ScriptedRandom, SeededRandom, MAX_UNIT};
pub use sensor::{
    generate_sensor_data, Metric, MetricProfile, SensorPoint, DEFAULT_WINDOW_DAYS,
    MAX_WINDOW_DAYS, SPIKE_PROBABILITY,
};
pub use walk::{advance_machine, simulate_tick, WalkBounds, RUL_DECAY_PER_TICK};
