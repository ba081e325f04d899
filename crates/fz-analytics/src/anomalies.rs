//! ---
//! fz_section: "08-fleet-analytics"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Derived fleet views and report calculations."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use chrono::{DateTime, Duration, Utc};
use fz_fleet::{Machine, MachineId, MachineStatus};
use fz_sim::RandomSource;
use serde::{Deserialize, Serialize};

/// `base + U * spread` for one field. A negative spread draws below `base`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub base: f64,
    pub spread: f64,
}

impl Band {
    const fn new(base: f64, spread: f64) -> Self {
        Self { base, spread }
    }

    fn sample(self, rng: &mut dyn RandomSource) -> f64 {
        rng.spread(self.base, self.spread)
    }
}

/// Per-status reading bands of synthetic anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyProfile {
    pub count: usize,
    pub temperature: Band,
    pub vibration: Band,
    pub load: Band,
    pub rpm: Band,
    pub current: Band,
    pub energy_kw: Band,
    pub score: Band,
}

static CRITICAL_PROFILE: AnomalyProfile = AnomalyProfile {
    count: 3,
    temperature: Band::new(78.0, 8.0),
    vibration: Band::new(1.2, 0.8),
    load: Band::new(90.0, 5.0),
    rpm: Band::new(1900.0, -200.0),
    current: Band::new(42.0, 8.0),
    energy_kw: Band::new(16.5, 3.0),
    score: Band::new(0.8, 0.2),
};

static WARNING_PROFILE: AnomalyProfile = AnomalyProfile {
    count: 2,
    temperature: Band::new(72.0, 6.0),
    vibration: Band::new(0.6, 0.4),
    load: Band::new(85.0, 5.0),
    rpm: Band::new(2050.0, -150.0),
    current: Band::new(38.0, 5.0),
    energy_kw: Band::new(13.8, 2.0),
    score: Band::new(0.6, 0.2),
};

static HEALTHY_PROFILE: AnomalyProfile = AnomalyProfile {
    count: 1,
    temperature: Band::new(65.0, 5.0),
    vibration: Band::new(0.3, 0.3),
    load: Band::new(75.0, 5.0),
    rpm: Band::new(2200.0, -100.0),
    current: Band::new(32.0, 3.0),
    energy_kw: Band::new(10.2, 1.5),
    score: Band::new(0.4, 0.2),
};

impl AnomalyProfile {
    pub fn for_status(status: MachineStatus) -> &'static AnomalyProfile {
        match status {
            MachineStatus::Critical => &CRITICAL_PROFILE,
            MachineStatus::Warning => &WARNING_PROFILE,
            MachineStatus::Healthy => &HEALTHY_PROFILE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub machine_id: MachineId,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub vibration: f64,
    pub load: f64,
    pub rpm: f64,
    pub current: f64,
    pub energy_kw: f64,
    pub anomaly_score: f64,
    pub health_score: f64,
}

/// Synthetic anomalies for one machine of `machines`, newest first. An id
/// that is not in the set yields nothing.
pub fn generate_anomalies(
    machine_id: MachineId,
    machines: &[Machine],
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Vec<Anomaly> {
    let Some(machine) = machines.iter().find(|m| m.machine_id == machine_id) else {
        return Vec::new();
    };
    let profile = AnomalyProfile::for_status(machine.status());

    let mut anomalies: Vec<Anomaly> = (0..profile.count)
        .map(|_| {
            let hours_ago = (rng.next_unit() * 24.0).floor() as i64;
            Anomaly {
                machine_id,
                timestamp: now - Duration::hours(hours_ago),
                temperature: profile.temperature.sample(rng),
                vibration: profile.vibration.sample(rng),
                load: profile.load.sample(rng),
                rpm: profile.rpm.sample(rng),
                current: profile.current.sample(rng),
                energy_kw: profile.energy_kw.sample(rng),
                anomaly_score: profile.score.sample(rng),
                health_score: machine.health_score(),
            }
        })
        .collect();
    anomalies.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    anomalies
}
