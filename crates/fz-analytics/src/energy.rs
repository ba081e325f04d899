//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Energy consumption, idle waste and return-on-investment estimates.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};
use fz_fleet::{Machine, MachineId};
use fz_sim::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::summary::HOURS_PER_WEEK;

pub const HISTORY_DAYS: u64 = 7;
pub const WEEKEND_ENERGY_FACTOR: f64 = 0.7;
/// Idle draw as a share of nominal consumption.
pub const IDLE_DRAW_SHARE: f64 = 0.3;
pub const ELECTRICITY_PRICE_PER_KWH: f64 = 0.12;
pub const INITIAL_INVESTMENT: f64 = 50_000.0;
pub const MAINTENANCE_SAVINGS_PER_YEAR: f64 = 15_000.0;
const WEEKS_PER_YEAR: f64 = 52.0;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergy {
    pub date: NaiveDate,
    pub energy_kwh: f64,
    pub machine_id: MachineId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEnergySeries {
    pub machine_id: MachineId,
    pub daily_energy: Vec<DailyEnergy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleTimeWaste {
    pub machine_id: MachineId,
    pub idle_hours: f64,
    pub idle_time_pct: f64,
    pub energy_waste_kwh: f64,
    pub potential_savings_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEfficiency {
    pub machine_id: MachineId,
    /// kWh per production unit, lower is better.
    pub energy_per_unit: f64,
    pub efficiency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiData {
    pub initial_investment: f64,
    pub energy_savings_per_year: f64,
    pub maintenance_savings_per_year: f64,
    pub total_savings_per_year: f64,
    pub roi_years: f64,
    pub roi_months: f64,
    pub payback_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyData {
    pub daily_energy_by_machine: Vec<MachineEnergySeries>,
    pub idle_time_waste: Vec<IdleTimeWaste>,
    pub energy_efficiency: Vec<EnergyEfficiency>,
    pub roi_data: RoiData,
}

pub fn analyze_energy(
    machines: &[Machine],
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> EnergyData {
    let today = now.date_naive();
    let daily_energy_by_machine = machines
        .iter()
        .map(|machine| daily_series(machine, today, rng))
        .collect();
    let idle_time_waste: Vec<IdleTimeWaste> = machines.iter().map(idle_waste).collect();
    let energy_efficiency = machines.iter().map(efficiency).collect();

    let weekly_savings: f64 = idle_time_waste
        .iter()
        .map(|waste| waste.potential_savings_usd)
        .sum();
    let roi_data = roi(weekly_savings * WEEKS_PER_YEAR, now);
    debug!(
        machines = machines.len(),
        roi_months = roi_data.roi_months,
        "energy analysis complete"
    );

    EnergyData {
        daily_energy_by_machine,
        idle_time_waste,
        energy_efficiency,
        roi_data,
    }
}

/// Seven days ending today, oldest first.
fn daily_series(
    machine: &Machine,
    today: NaiveDate,
    rng: &mut dyn RandomSource,
) -> MachineEnergySeries {
    let daily_energy = (0..HISTORY_DAYS)
        .rev()
        .map(|days_back| {
            let date = today.checked_sub_days(Days::new(days_back)).unwrap_or(today);
            let weekend = match date.weekday() {
                Weekday::Sat | Weekday::Sun => WEEKEND_ENERGY_FACTOR,
                _ => 1.0,
            };
            let random_factor = 0.9 + rng.next_unit() * 0.2;
            DailyEnergy {
                date,
                energy_kwh: machine.energy_kw * 24.0 * weekend * random_factor,
                machine_id: machine.machine_id,
            }
        })
        .collect();
    MachineEnergySeries {
        machine_id: machine.machine_id,
        daily_energy,
    }
}

pub fn idle_waste(machine: &Machine) -> IdleTimeWaste {
    let idle_hours = HOURS_PER_WEEK * machine.idle_time_pct / 100.0;
    let energy_waste_kwh = machine.energy_kw * IDLE_DRAW_SHARE * idle_hours;
    IdleTimeWaste {
        machine_id: machine.machine_id,
        idle_hours,
        idle_time_pct: machine.idle_time_pct,
        energy_waste_kwh,
        potential_savings_usd: energy_waste_kwh * ELECTRICITY_PRICE_PER_KWH,
    }
}

/// A machine with no load reports zero energy per unit.
pub fn efficiency(machine: &Machine) -> EnergyEfficiency {
    let energy_per_unit = if machine.load > 0.0 {
        machine.energy_kw / (machine.load / 100.0) * (1.0 + machine.idle_time_pct / 100.0)
    } else {
        0.0
    };
    EnergyEfficiency {
        machine_id: machine.machine_id,
        energy_per_unit,
        efficiency_score: 100.0 - energy_per_unit * 10.0,
    }
}

fn roi(energy_savings_per_year: f64, now: DateTime<Utc>) -> RoiData {
    let total_savings_per_year = energy_savings_per_year + MAINTENANCE_SAVINGS_PER_YEAR;
    let roi_years = INITIAL_INVESTMENT / total_savings_per_year;
    let roi_months = roi_years * 12.0;
    let payback_ms = (roi_months * DAYS_PER_MONTH * 86_400_000.0) as i64;
    RoiData {
        initial_investment: INITIAL_INVESTMENT,
        energy_savings_per_year,
        maintenance_savings_per_year: MAINTENANCE_SAVINGS_PER_YEAR,
        total_savings_per_year,
        roi_years,
        roi_months,
        payback_date: (now + Duration::milliseconds(payback_ms)).date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fz_fleet::FleetRegistry;
    use fz_sim::{ScriptedRandom, SeededRandom};

    fn now() -> DateTime<Utc> {
        // Wednesday; the window covers Thu 9th through Wed 15th.
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).single().unwrap()
    }

    fn machine(id: MachineId) -> Machine {
        FleetRegistry::catalog()
            .into_iter()
            .find(|m| m.machine_id == id)
            .unwrap()
    }

    #[test]
    fn daily_series_ends_today_with_weekend_dip() {
        let data = analyze_energy(&[machine(1)], now(), &mut ScriptedRandom::constant(0.5));
        let series = &data.daily_energy_by_machine[0].daily_energy;
        assert_eq!(series.len(), 7);
        assert_eq!(series[6].date, now().date_naive());
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 5, 9).unwrap());
        let weekday = 10.2 * 24.0;
        for day in series {
            let expected = match day.date.weekday() {
                Weekday::Sat | Weekday::Sun => weekday * 0.7,
                _ => weekday,
            };
            assert!((day.energy_kwh - expected).abs() < 1e-9, "{}", day.date);
        }
    }

    #[test]
    fn random_factor_stays_within_ten_percent() {
        let data = analyze_energy(&FleetRegistry::catalog(), now(), &mut SeededRandom::new(3));
        for (series, machine) in data.daily_energy_by_machine.iter().zip(FleetRegistry::catalog()) {
            for day in &series.daily_energy {
                let nominal = machine.energy_kw * 24.0;
                assert!(day.energy_kwh <= nominal * 1.1 + 1e-9);
                assert!(day.energy_kwh >= nominal * 0.7 * 0.9 - 1e-9);
            }
        }
    }

    #[test]
    fn idle_waste_formula() {
        // Machine 5: 16.5 kW, 25% idle.
        let waste = idle_waste(&machine(5));
        assert!((waste.idle_hours - 42.0).abs() < 1e-9);
        assert!((waste.energy_waste_kwh - 16.5 * 0.3 * 42.0).abs() < 1e-9);
        assert!((waste.potential_savings_usd - 207.9 * 0.12).abs() < 1e-9);
    }

    #[test]
    fn efficiency_formula_and_zero_load_guard() {
        let score = efficiency(&machine(1));
        let expected = 10.2 / 0.75 * 1.12;
        assert!((score.energy_per_unit - expected).abs() < 1e-9);
        assert!((score.efficiency_score - (100.0 - expected * 10.0)).abs() < 1e-9);

        let mut stalled = machine(1);
        stalled.load = 0.0;
        let score = efficiency(&stalled);
        assert_eq!(score.energy_per_unit, 0.0);
        assert_eq!(score.efficiency_score, 100.0);
        assert!(score.efficiency_score.is_finite());
    }

    #[test]
    fn roi_of_empty_fleet_is_maintenance_only() {
        let data = analyze_energy(&[], now(), &mut SeededRandom::new(1));
        let roi = &data.roi_data;
        assert_eq!(roi.energy_savings_per_year, 0.0);
        assert_eq!(roi.total_savings_per_year, 15_000.0);
        assert!((roi.roi_years - 50_000.0 / 15_000.0).abs() < 1e-9);
        assert!((roi.roi_months - 40.0).abs() < 1e-9);
        // 40 months of 30 days.
        assert_eq!(
            roi.payback_date,
            (now() + Duration::days(1200)).date_naive()
        );
    }

    #[test]
    fn roi_sums_weekly_savings_over_a_year() {
        let fleet = FleetRegistry::catalog();
        let data = analyze_energy(&fleet, now(), &mut SeededRandom::new(1));
        let weekly: f64 = fleet.iter().map(|m| idle_waste(m).potential_savings_usd).sum();
        assert!((data.roi_data.energy_savings_per_year - weekly * 52.0).abs() < 1e-6);
        assert!(data.roi_data.roi_years < 50_000.0 / 15_000.0);
    }
}
