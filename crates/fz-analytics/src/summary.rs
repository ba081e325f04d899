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
use fz_fleet::Machine;
use fz_sim::RandomSource;
use serde::{Deserialize, Serialize};

use crate::stats::FleetStats;

pub const HOURS_PER_WEEK: f64 = 24.0 * 7.0;
pub const POTENTIAL_SAVINGS_SHARE: f64 = 0.15;
pub const ESTIMATED_ROI_DAYS: u32 = 145;
/// Anomaly counter shown before the first aggregation.
pub const INITIAL_RECENT_ANOMALIES: u32 = 2;

const BATCHES_BASELINE: i64 = 45;
const BATCHES_JITTER: i64 = 5;
const DEFECTS_BASELINE: i64 = 12;
const DEFECTS_JITTER: i64 = 3;

/// Machines per health band: excellent >= 90, good >= 75, fair >= 60,
/// poor >= 50, critical below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
    pub critical: usize,
}

impl HealthDistribution {
    pub fn from_machines(machines: &[Machine]) -> Self {
        let mut distribution = HealthDistribution::default();
        for machine in machines {
            let score = machine.health_score();
            let bucket = if score >= 90.0 {
                &mut distribution.excellent
            } else if score >= 75.0 {
                &mut distribution.good
            } else if score >= 60.0 {
                &mut distribution.fair
            } else if score >= 50.0 {
                &mut distribution.poor
            } else {
                &mut distribution.critical
            };
            *bucket += 1;
        }
        distribution
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.fair + self.poor + self.critical
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_machines: usize,
    pub healthy_machines: usize,
    pub warning_machines: usize,
    pub critical_machines: usize,
    pub avg_health_score: f64,
    pub recent_anomalies: u32,
    pub total_batches: u32,
    pub avg_efficiency: f64,
    pub total_defects: u32,
    /// Weekly estimate in kWh.
    pub total_energy_consumption: f64,
    pub potential_energy_savings: f64,
    pub estimated_roi_days: u32,
    pub machine_health_distribution: HealthDistribution,
    pub last_updated: DateTime<Utc>,
}

/// Carry-over inputs of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationContext {
    pub previous_anomalies: u32,
    pub simulated: bool,
    pub now: DateTime<Utc>,
}

/// Summarise the selection-filtered machine set.
///
/// `recent_anomalies` moves by one of {-1, 0, +1} (floored at 0) only while
/// simulating; under static mode the previous value is carried unchanged.
pub fn aggregate(
    machines: &[Machine],
    context: &AggregationContext,
    rng: &mut dyn RandomSource,
) -> DashboardSummary {
    let stats = FleetStats::from_machines(machines);
    let weekly_energy = stats.total_energy_kw * HOURS_PER_WEEK;

    let recent_anomalies = if context.simulated {
        // Symmetric step: down, steady or up with equal odds, so the counter
        // can grow as well as decay.
        let delta = (rng.next_unit() * 3.0).floor() as i64 - 1;
        (i64::from(context.previous_anomalies) + delta).max(0) as u32
    } else {
        context.previous_anomalies
    };

    DashboardSummary {
        total_machines: stats.total,
        healthy_machines: stats.healthy,
        warning_machines: stats.warning,
        critical_machines: stats.critical,
        avg_health_score: stats.avg_health,
        recent_anomalies,
        total_batches: jitter(BATCHES_BASELINE, BATCHES_JITTER, rng),
        avg_efficiency: stats.avg_efficiency,
        total_defects: jitter(DEFECTS_BASELINE, DEFECTS_JITTER, rng),
        total_energy_consumption: weekly_energy,
        potential_energy_savings: weekly_energy * POTENTIAL_SAVINGS_SHARE,
        estimated_roi_days: ESTIMATED_ROI_DAYS,
        machine_health_distribution: HealthDistribution::from_machines(machines),
        last_updated: context.now,
    }
}

/// `baseline + floor(U * 2j - j)`, an integer in `[baseline - j, baseline + j)`.
fn jitter(baseline: i64, spread: i64, rng: &mut dyn RandomSource) -> u32 {
    let offset = (rng.next_unit() * (2 * spread) as f64 - spread as f64).floor() as i64;
    (baseline + offset).max(0) as u32
}
