//! ---
//! fz_section: "02-fleet-model"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Fleet catalog, users and visibility rules."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---

use crate::model::{Machine, MachineId, MachineSeed, MachineType, Plant};

/// Number of machines in the catalog for the lifetime of the process.
pub const FLEET_SIZE: usize = 14;

/// Known degradation multipliers; machines not listed run at 1.0.
const HEALTH_FACTORS: [(MachineId, f64); 6] = [
    (3, 1.2),
    (5, 1.5),
    (7, 1.1),
    (9, 1.3),
    (11, 1.2),
    (13, 1.4),
];

type SeedRow = (
    MachineId,
    Plant,
    MachineType,
    f64, // health
    f64, // temperature
    f64, // vibration
    f64, // load
    f64, // rpm
    f64, // current
    f64, // energy_kw
    f64, // idle_time_pct
    f64, // rul_days
);

#[rustfmt::skip]
const CATALOG: [SeedRow; FLEET_SIZE] = [
    (1,  Plant::PlantA, MachineType::Slitter,    90.0, 65.0, 0.30, 75.0, 2200.0, 32.0, 10.2, 12.0, 180.0),
    (2,  Plant::PlantA, MachineType::Slitter,    85.0, 68.0, 0.40, 80.0, 2150.0, 35.0, 11.5, 15.0, 165.0),
    (3,  Plant::PlantA, MachineType::Inspection, 71.0, 72.0, 0.60, 85.0, 2050.0, 38.0, 13.8, 18.0,  95.0),
    (4,  Plant::PlantA, MachineType::Inspection, 88.0, 63.0, 0.35, 70.0, 2300.0, 30.0,  9.8, 14.0, 200.0),
    (5,  Plant::PlantB, MachineType::Slitter,    45.0, 78.0, 1.20, 90.0, 1900.0, 42.0, 16.5, 25.0,  25.0),
    (6,  Plant::PlantB, MachineType::Slitter,    92.0, 64.0, 0.28, 73.0, 2250.0, 31.0, 10.1, 11.0, 210.0),
    (7,  Plant::PlantB, MachineType::Inspection, 76.0, 70.0, 0.55, 82.0, 2100.0, 36.0, 12.8, 17.0, 120.0),
    (8,  Plant::PlantC, MachineType::Slitter,    89.0, 66.0, 0.32, 76.0, 2180.0, 33.0, 10.5, 13.0, 175.0),
    (9,  Plant::PlantC, MachineType::Slitter,    58.0, 75.0, 0.95, 88.0, 1950.0, 40.0, 15.2, 22.0,  45.0),
    (10, Plant::PlantC, MachineType::Slitter,    94.0, 62.0, 0.25, 68.0, 2320.0, 29.0,  9.5, 10.0, 220.0),
    (11, Plant::PlantC, MachineType::Inspection, 73.0, 71.0, 0.58, 84.0, 2080.0, 37.0, 13.2, 16.0, 110.0),
    (12, Plant::PlantC, MachineType::Inspection, 87.0, 67.0, 0.38, 77.0, 2160.0, 34.0, 11.1, 14.0, 185.0),
    (13, Plant::PlantD, MachineType::Slitter,    52.0, 76.0, 1.10, 89.0, 1920.0, 41.0, 15.8, 24.0,  35.0),
    (14, Plant::PlantD, MachineType::Inspection, 91.0, 65.0, 0.30, 74.0, 2200.0, 32.0, 10.3, 12.0, 195.0),
];

/// The fixed, ordered catalog of every machine that exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetRegistry;

impl FleetRegistry {
    /// Build the seed catalog. Deterministic: every call returns the same fleet.
    pub fn catalog() -> Vec<Machine> {
        CATALOG
            .iter()
            .map(
                |&(
                    machine_id,
                    plant,
                    machine_type,
                    health_score,
                    temperature,
                    vibration,
                    load,
                    rpm,
                    current,
                    energy_kw,
                    idle_time_pct,
                    rul_days,
                )| {
                    Machine::from(MachineSeed {
                        machine_id,
                        plant,
                        machine_type,
                        health_score,
                        temperature,
                        vibration,
                        load,
                        rpm,
                        current,
                        energy_kw,
                        idle_time_pct,
                        rul_days,
                    })
                },
            )
            .collect()
    }

    pub fn contains(machine_id: MachineId) -> bool {
        CATALOG.iter().any(|row| row.0 == machine_id)
    }

    /// Degradation multiplier applied to synthesised sensor values.
    pub fn health_factor(machine_id: MachineId) -> f64 {
        HEALTH_FACTORS
            .iter()
            .find(|(id, _)| *id == machine_id)
            .map(|(_, factor)| *factor)
            .unwrap_or(1.0)
    }
}
