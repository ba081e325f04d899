//! ---
//! fz_section: "11-simulation"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Simulation runtime helpers and synthetic telemetry."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Hourly synthetic sensor history. Series are recomputed on demand; nothing
//! here holds state between calls.

use std::f64::consts::TAU;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use fz_fleet::{FleetRegistry, MachineId};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{trace, warn};

use crate::errors::SimError;
use crate::random::RandomSource;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Longer windows are cut to this many days.
pub const MAX_WINDOW_DAYS: u32 = 90;
pub const SPIKE_PROBABILITY: f64 = 0.005;

const WORKING_HOURS: std::ops::RangeInclusive<u32> = 8..=18;
const OFF_HOURS_FACTOR: f64 = 0.7;
const WEEKEND_FACTOR: f64 = 0.8;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Metric {
    #[default]
    Temperature,
    Vibration,
    Load,
    Rpm,
    Current,
    Energy,
}

/// Shape constants of one metric's synthetic signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricProfile {
    pub base: f64,
    pub amplitude: f64,
    pub noise: f64,
    pub trend: f64,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub const fn profile(self) -> MetricProfile {
        match self {
            Metric::Temperature => MetricProfile {
                base: 65.0,
                amplitude: 5.0,
                noise: 2.0,
                trend: 0.05,
                min: 50.0,
                max: 100.0,
                unit: "°C",
            },
            Metric::Vibration => MetricProfile {
                base: 0.5,
                amplitude: 0.2,
                noise: 0.1,
                trend: 0.01,
                min: 0.1,
                max: 3.0,
                unit: "mm/s",
            },
            Metric::Load => MetricProfile {
                base: 75.0,
                amplitude: 10.0,
                noise: 5.0,
                trend: 0.1,
                min: 40.0,
                max: 95.0,
                unit: "%",
            },
            Metric::Rpm => MetricProfile {
                base: 2200.0,
                amplitude: 200.0,
                noise: 50.0,
                trend: 0.5,
                min: 1000.0,
                max: 3500.0,
                unit: "RPM",
            },
            Metric::Current => MetricProfile {
                base: 35.0,
                amplitude: 5.0,
                noise: 2.0,
                trend: 0.02,
                min: 20.0,
                max: 60.0,
                unit: "A",
            },
            Metric::Energy => MetricProfile {
                base: 12.0,
                amplitude: 4.0,
                noise: 1.0,
                trend: 0.03,
                min: 5.0,
                max: 25.0,
                unit: "kW",
            },
        }
    }
}

impl FromStr for Metric {
    type Err = SimError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(Metric::Temperature),
            "vibration" => Ok(Metric::Vibration),
            "load" => Ok(Metric::Load),
            "rpm" => Ok(Metric::Rpm),
            "current" => Ok(Metric::Current),
            "energy" => Ok(Metric::Energy),
            _ => Err(SimError::UnknownMetric(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Build `days * 24` hourly points ending one hour before `now`, oldest first.
/// `days` is capped at [`MAX_WINDOW_DAYS`].
pub fn generate_sensor_data(
    machine_id: MachineId,
    metric: Metric,
    days: u32,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Vec<SensorPoint> {
    let profile = metric.profile();
    let health_factor = FleetRegistry::health_factor(machine_id);
    if days > MAX_WINDOW_DAYS {
        warn!(days, max = MAX_WINDOW_DAYS, "sensor window capped");
    }
    let total = days.min(MAX_WINDOW_DAYS) as usize * 24;
    let mut points = Vec::with_capacity(total);

    for i in 0..total {
        let timestamp = now - Duration::hours((total - i) as i64);
        let hour = timestamp.hour();
        let working = if WORKING_HOURS.contains(&hour) {
            1.0
        } else {
            OFF_HOURS_FACTOR
        };
        let weekend = match timestamp.weekday() {
            Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
            _ => 1.0,
        };
        let daily_cycle = (f64::from(hour) / 24.0 * TAU).sin();
        let trend = (i as f64 / total as f64) * profile.trend * health_factor;
        let noise = rng.centered(profile.noise);
        let spike = if rng.next_unit() < SPIKE_PROBABILITY {
            rng.next_unit() * profile.amplitude
        } else {
            0.0
        };

        let value = profile.base * health_factor
            + daily_cycle * profile.amplitude * working * weekend
            + trend
            + noise
            + spike;
        points.push(SensorPoint {
            timestamp,
            value: value.clamp(profile.min, profile.max),
        });
    }

    trace!(machine_id, metric = %metric, points = points.len(), "synthesised sensor history");
    points
}
