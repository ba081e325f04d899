//! ---
//! fz_section: "11-simulation"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Simulation runtime helpers and synthetic telemetry."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use fz_fleet::Machine;
use serde::Serialize;

use crate::random::RandomSource;

/// Valid range and per-tick step of one perturbed field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WalkBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl WalkBounds {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// `clamp(value + (U - 0.5) * step, min, max)`.
    pub fn walk(&self, value: f64, rng: &mut dyn RandomSource) -> f64 {
        (value + rng.centered(self.step)).clamp(self.min, self.max)
    }
}

pub const HEALTH_WALK: WalkBounds = WalkBounds::new(40.0, 95.0, 2.0);
pub const TEMPERATURE_WALK: WalkBounds = WalkBounds::new(60.0, 80.0, 1.0);
pub const ENERGY_WALK: WalkBounds = WalkBounds::new(8.0, 16.0, 0.5);
pub const IDLE_WALK: WalkBounds = WalkBounds::new(10.0, 30.0, 1.0);
pub const VIBRATION_WALK: WalkBounds = WalkBounds::new(0.1, 2.0, 0.1);
pub const LOAD_WALK: WalkBounds = WalkBounds::new(40.0, 95.0, 2.0);
pub const RPM_WALK: WalkBounds = WalkBounds::new(1000.0, 3500.0, 50.0);
pub const CURRENT_WALK: WalkBounds = WalkBounds::new(20.0, 60.0, 1.0);

/// Upper bound of the per-tick remaining-useful-life decrement.
pub const RUL_DECAY_PER_TICK: f64 = 0.1;

/// Advance one machine by a tick. Health goes through
/// [`Machine::set_health_score`] so the status follows it.
pub fn advance_machine(machine: &Machine, rng: &mut dyn RandomSource) -> Machine {
    let mut next = machine.clone();
    let health = HEALTH_WALK.walk(machine.health_score(), rng);
    next.temperature = TEMPERATURE_WALK.walk(machine.temperature, rng);
    next.energy_kw = ENERGY_WALK.walk(machine.energy_kw, rng);
    next.idle_time_pct = IDLE_WALK.walk(machine.idle_time_pct, rng);
    next.rul_days = (machine.rul_days - rng.next_unit() * RUL_DECAY_PER_TICK).max(0.0);
    next.vibration = VIBRATION_WALK.walk(machine.vibration, rng);
    next.load = LOAD_WALK.walk(machine.load, rng);
    next.rpm = RPM_WALK.walk(machine.rpm, rng);
    next.current = CURRENT_WALK.walk(machine.current, rng);
    next.set_health_score(health);
    next
}

/// Produce the next machine set. The input is untouched; callers swap the
/// returned vector in whole.
pub fn simulate_tick(machines: &[Machine], rng: &mut dyn RandomSource) -> Vec<Machine> {
    machines
        .iter()
        .map(|machine| advance_machine(machine, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom, MAX_UNIT};
    use fz_fleet::{FleetRegistry, MachineStatus};

    fn assert_within_bounds(machine: &Machine) {
        let checks = [
            (HEALTH_WALK, machine.health_score(), "health"),
            (TEMPERATURE_WALK, machine.temperature, "temperature"),
            (ENERGY_WALK, machine.energy_kw, "energy"),
            (IDLE_WALK, machine.idle_time_pct, "idle"),
            (VIBRATION_WALK, machine.vibration, "vibration"),
            (LOAD_WALK, machine.load, "load"),
            (RPM_WALK, machine.rpm, "rpm"),
            (CURRENT_WALK, machine.current, "current"),
        ];
        for (bounds, value, field) in checks {
            assert!(
                bounds.contains(value),
                "machine {} {} = {} escaped {:?}",
                machine.machine_id,
                field,
                value,
                bounds
            );
        }
    }

    #[test]
    fn long_runs_stay_in_bounds_and_consistent() {
        let mut rng = SeededRandom::new(0xFA017);
        let mut fleet = FleetRegistry::catalog();
        for _ in 0..2_000 {
            let next = simulate_tick(&fleet, &mut rng);
            for (before, after) in fleet.iter().zip(&next) {
                assert_eq!(before.machine_id, after.machine_id);
                assert!(after.rul_days <= before.rul_days);
                assert!(after.rul_days >= 0.0);
                assert_eq!(
                    after.status(),
                    MachineStatus::from_health(after.health_score())
                );
                assert_within_bounds(after);
            }
            fleet = next;
        }
    }

    #[test]
    fn midpoint_sample_leaves_in_range_values_unchanged() {
        let mut rng = ScriptedRandom::constant(0.5);
        let machine = &FleetRegistry::catalog()[0];
        let next = advance_machine(machine, &mut rng);
        assert_eq!(next.health_score(), machine.health_score());
        assert_eq!(next.temperature, machine.temperature);
        assert_eq!(next.rpm, machine.rpm);
        assert!((next.rul_days - (machine.rul_days - 0.05)).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_seed_is_clamped_on_first_tick() {
        // Machine 5 seeds 16.5 kW against an energy ceiling of 16.
        let machine = &FleetRegistry::catalog()[4];
        assert_eq!(machine.energy_kw, 16.5);
        let next = advance_machine(machine, &mut ScriptedRandom::constant(0.5));
        assert_eq!(next.energy_kw, ENERGY_WALK.max);
    }

    #[test]
    fn status_crosses_threshold_with_health() {
        // Machine 13 sits at 52; draws of 0.0 walk health down by one per tick.
        let mut machine = FleetRegistry::catalog()[12].clone();
        let mut rng = ScriptedRandom::constant(0.0);
        assert_eq!(machine.status(), MachineStatus::Warning);
        for _ in 0..3 {
            machine = advance_machine(&machine, &mut rng);
        }
        assert_eq!(machine.health_score(), 49.0);
        assert_eq!(machine.status(), MachineStatus::Critical);
    }

    #[test]
    fn rul_never_goes_negative() {
        let mut machine = FleetRegistry::catalog()[0].clone();
        machine.rul_days = 0.05;
        let next = advance_machine(&machine, &mut ScriptedRandom::constant(MAX_UNIT));
        assert_eq!(next.rul_days, 0.0);
    }

    #[test]
    fn tick_draws_nine_samples_per_machine() {
        let mut rng = ScriptedRandom::constant(0.5);
        let fleet = FleetRegistry::catalog();
        let next = simulate_tick(&fleet, &mut rng);
        assert_eq!(next.len(), fleet.len());
        assert_eq!(rng.draws(), fleet.len() * 9);
    }
}
