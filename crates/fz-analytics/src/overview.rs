//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use fz_fleet::{visible_accessible, Machine, Plant, User};
use serde::{Deserialize, Serialize};

use crate::stats::FleetStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantStats {
    pub plant: Plant,
    #[serde(flatten)]
    pub stats: FleetStats,
}

/// One entry per plant assigned to `user`, in assignment order. Plants with
/// no visible machines are listed with zeroed stats.
pub fn plant_overview(machines: &[Machine], user: &User) -> Vec<PlantStats> {
    user.assigned_plants
        .iter()
        .map(|&plant| PlantStats {
            plant,
            stats: FleetStats::from_machines(
                machines
                    .iter()
                    .filter(|m| m.plant == plant && visible_accessible(m, user)),
            ),
        })
        .collect()
}
