//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use fz_fleet::{Machine, MachineStatus};
use serde::{Deserialize, Serialize};

/// Status counts and averages over a machine set. Averages are 0 for an
/// empty set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetStats {
    pub total: usize,
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub avg_health: f64,
    pub total_energy_kw: f64,
    pub avg_efficiency: f64,
}

impl FleetStats {
    pub fn from_machines<'a>(machines: impl IntoIterator<Item = &'a Machine>) -> Self {
        let mut stats = FleetStats::default();
        let mut health_sum = 0.0;
        let mut efficiency_sum = 0.0;
        for machine in machines {
            stats.total += 1;
            match machine.status() {
                MachineStatus::Healthy => stats.healthy += 1,
                MachineStatus::Warning => stats.warning += 1,
                MachineStatus::Critical => stats.critical += 1,
            }
            health_sum += machine.health_score();
            efficiency_sum += machine_efficiency(machine);
            stats.total_energy_kw += machine.energy_kw;
        }
        if stats.total > 0 {
            stats.avg_health = health_sum / stats.total as f64;
            stats.avg_efficiency = efficiency_sum / stats.total as f64;
        }
        stats
    }
}

/// Share of time a machine is productive, `100 - idle_time_pct`.
pub fn machine_efficiency(machine: &Machine) -> f64 {
    100.0 - machine.idle_time_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use fz_fleet::FleetRegistry;

    #[test]
    fn empty_set_has_zeroed_averages() {
        let stats = FleetStats::from_machines(&Vec::<Machine>::new());
        assert_eq!(stats, FleetStats::default());
        assert!(!stats.avg_health.is_nan());
    }

    #[test]
    fn counts_sum_to_total() {
        let fleet = FleetRegistry::catalog();
        let stats = FleetStats::from_machines(&fleet);
        assert_eq!(stats.total, 14);
        assert_eq!(stats.healthy + stats.warning + stats.critical, stats.total);
        assert_eq!(stats.critical, 1);
    }
}
