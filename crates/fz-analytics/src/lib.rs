//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Derived dashboard views for FaultZero. Every entry point is a total
//! function of its inputs, the clock reading and the injected random source.

pub mod alerts;
pub mod anomalies;
pub mod energy;
pub mod insights;
pub mod overview;
pub mod rul;
pub mod stats;
pub mod summary;

pub use alerts::{generate_alerts, Alert, AlertKind, AlertPriority, IDLE_ALERT_THRESHOLD};
pub use anomalies::{generate_anomalies, Anomaly, AnomalyProfile};
pub use energy::{
    analyze_energy, DailyEnergy, EnergyData, EnergyEfficiency, IdleTimeWaste,
    MachineEnergySeries, RoiData,
};
pub use insights::{
    production_insights, recommend, MachineDefects, MachineEfficiency, ProductEfficiency,
    ProductEnergy, ProductionInsights,
};
pub use overview::{plant_overview, PlantStats};
pub use rul::{predict_rul, RulPrediction};
pub use stats::FleetStats;
pub use summary::{
    aggregate, AggregationContext, DashboardSummary, HealthDistribution,
    INITIAL_RECENT_ANOMALIES,
};
