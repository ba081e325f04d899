//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use fz_fleet::{Machine, MachineId, MachineStatus};
use fz_sim::RandomSource;
use serde::{Deserialize, Serialize};

use crate::energy::EnergyData;
use crate::stats::machine_efficiency;

/// Product lines with their nominal efficiency and energy per batch.
const PRODUCT_LINES: [(&str, f64, f64); 5] = [
    ("Product A", 90.0, 120.0),
    ("Product B", 85.0, 135.0),
    ("Product C", 78.0, 110.0),
    ("Product D", 82.0, 125.0),
    ("Product E", 75.0, 150.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEfficiency {
    pub machine_id: MachineId,
    pub avg_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEfficiency {
    pub product_type: String,
    pub avg_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEnergy {
    pub product_type: String,
    pub avg_energy_consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDefects {
    pub machine_id: MachineId,
    pub avg_defect_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductionInsights {
    pub efficiency_by_machine: Vec<MachineEfficiency>,
    pub efficiency_by_product: Vec<ProductEfficiency>,
    pub energy_by_product: Vec<ProductEnergy>,
    pub defects_by_machine: Vec<MachineDefects>,
    pub most_efficient_product: Option<String>,
    pub highest_energy_product: Option<String>,
    pub recommendations: Vec<String>,
}

/// Production view of the selection-filtered set plus its ordered
/// recommendations.
pub fn production_insights(
    machines: &[Machine],
    energy: &EnergyData,
    rng: &mut dyn RandomSource,
) -> ProductionInsights {
    let efficiency_by_machine: Vec<MachineEfficiency> = machines
        .iter()
        .map(|machine| MachineEfficiency {
            machine_id: machine.machine_id,
            avg_efficiency: machine_efficiency(machine) + rng.centered(4.0),
        })
        .collect();

    let efficiency_by_product: Vec<ProductEfficiency> = PRODUCT_LINES
        .iter()
        .map(|&(name, efficiency, _)| ProductEfficiency {
            product_type: name.to_owned(),
            avg_efficiency: efficiency + rng.centered(4.0),
        })
        .collect();

    let energy_by_product: Vec<ProductEnergy> = PRODUCT_LINES
        .iter()
        .map(|&(name, _, energy)| ProductEnergy {
            product_type: name.to_owned(),
            avg_energy_consumption: energy + rng.centered(10.0),
        })
        .collect();

    let defects_by_machine = machines
        .iter()
        .map(|machine| {
            let (base, span) = match machine.status() {
                MachineStatus::Critical => (3.5, 0.8),
                MachineStatus::Warning => (2.1, 0.6),
                MachineStatus::Healthy => (0.8, 0.4),
            };
            MachineDefects {
                machine_id: machine.machine_id,
                avg_defect_rate: base + rng.centered(span),
            }
        })
        .collect();

    let most_efficient_product = first_max(&efficiency_by_product, |p| p.avg_efficiency)
        .map(|p| p.product_type.clone());
    let highest_energy_product = first_max(&energy_by_product, |p| p.avg_energy_consumption)
        .map(|p| p.product_type.clone());
    let recommendations = recommend(machines, &efficiency_by_machine, energy);

    ProductionInsights {
        efficiency_by_machine,
        efficiency_by_product,
        energy_by_product,
        defects_by_machine,
        most_efficient_product,
        highest_energy_product,
        recommendations,
    }
}

/// Ordered recommendations: the first critical machine, the best performer,
/// then the machine whose idle share exceeds every other one.
pub fn recommend(
    machines: &[Machine],
    efficiency_by_machine: &[MachineEfficiency],
    energy: &EnergyData,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if machines.is_empty() {
        return recommendations;
    }

    if let Some(critical) = machines.iter().find(|m| m.status() == MachineStatus::Critical) {
        recommendations.push(format!(
            "Machine {} is critical and needs immediate attention.",
            critical.machine_id
        ));
    }

    if let Some(best) = first_max(efficiency_by_machine, |m| m.avg_efficiency) {
        recommendations.push(format!(
            "Machine {} is performing best with {:.1}% efficiency.",
            best.machine_id, best.avg_efficiency
        ));
    }

    if let Some(idle) = first_max(&energy.idle_time_waste, |w| w.idle_time_pct) {
        let unique = energy
            .idle_time_waste
            .iter()
            .filter(|w| w.machine_id != idle.machine_id)
            .all(|w| w.idle_time_pct < idle.idle_time_pct);
        if unique {
            recommendations.push(format!(
                "Machine {} has high idle time ({:.1}%). Consider workflow optimization.",
                idle.machine_id, idle.idle_time_pct
            ));
        }
    }

    recommendations
}

/// Largest element by `key`; ties keep the earliest.
fn first_max<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().fold(None, |best: Option<&T>, item| match best {
        Some(current) if key(item) <= key(current) => Some(current),
        _ => Some(item),
    })
}
