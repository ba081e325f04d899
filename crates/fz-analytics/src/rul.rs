//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use fz_fleet::{Machine, MachineId};
use fz_sim::RandomSource;
use serde::{Deserialize, Serialize};

const RUL_JITTER_DAYS: f64 = 10.0;
const HEALTH_JITTER: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulPrediction {
    pub machine_id: MachineId,
    pub rul_days: f64,
    pub health_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl RulPrediction {
    /// Zeroed prediction for a machine that is not in the set.
    pub fn unknown(machine_id: MachineId, now: DateTime<Utc>) -> Self {
        Self {
            machine_id,
            rul_days: 0.0,
            health_score: 0.0,
            last_updated: now,
        }
    }
}

/// Remaining useful life of one machine, jittered by up to five days and the
/// health score by up to 1.5 points.
pub fn predict_rul(
    machine_id: MachineId,
    machines: &[Machine],
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> RulPrediction {
    let Some(machine) = machines.iter().find(|m| m.machine_id == machine_id) else {
        return RulPrediction::unknown(machine_id, now);
    };
    RulPrediction {
        machine_id,
        rul_days: (machine.rul_days + rng.centered(RUL_JITTER_DAYS)).max(0.0),
        health_score: (machine.health_score() + rng.centered(HEALTH_JITTER)).clamp(0.0, 100.0),
        last_updated: now,
    }
}
