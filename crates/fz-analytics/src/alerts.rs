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
use strum::Display;

/// Idle share above which an energy alert is raised.
pub const IDLE_ALERT_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertKind {
    Critical,
    Maintenance,
    Warning,
    Energy,
}

impl AlertKind {
    /// How far back an alert of this kind may be dated.
    pub fn window(self) -> Duration {
        match self {
            AlertKind::Critical => Duration::hours(1),
            AlertKind::Maintenance => Duration::hours(2),
            AlertKind::Warning => Duration::hours(3),
            AlertKind::Energy => Duration::minutes(90),
        }
    }

    pub fn priority(self) -> AlertPriority {
        match self {
            AlertKind::Critical | AlertKind::Maintenance => AlertPriority::High,
            AlertKind::Warning | AlertKind::Energy => AlertPriority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub machine_id: MachineId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub priority: AlertPriority,
}

impl Alert {
    fn new(
        kind: AlertKind,
        machine_id: MachineId,
        message: String,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let window_ms = kind.window().num_milliseconds() as f64;
        let back = Duration::milliseconds((rng.next_unit() * window_ms) as i64);
        Self {
            kind,
            machine_id,
            message,
            timestamp: now - back,
            priority: kind.priority(),
        }
    }
}

/// Alerts for the selection-filtered set, oldest first.
///
/// Critical machines raise a health and a maintenance alert, warning machines
/// one health alert, and any machine idling above
/// [`IDLE_ALERT_THRESHOLD`] an energy alert on top.
pub fn generate_alerts(
    machines: &[Machine],
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for machine in machines {
        let id = machine.machine_id;
        match machine.status() {
            MachineStatus::Critical => {
                alerts.push(Alert::new(
                    AlertKind::Critical,
                    id,
                    format!(
                        "Machine {id} health is critical ({:.1}%)",
                        machine.health_score()
                    ),
                    now,
                    rng,
                ));
                alerts.push(Alert::new(
                    AlertKind::Maintenance,
                    id,
                    format!(
                        "Machine {id} needs maintenance soon (RUL: {:.0} days)",
                        machine.rul_days
                    ),
                    now,
                    rng,
                ));
            }
            MachineStatus::Warning => {
                alerts.push(Alert::new(
                    AlertKind::Warning,
                    id,
                    format!(
                        "Machine {id} health needs attention ({:.1}%)",
                        machine.health_score()
                    ),
                    now,
                    rng,
                ));
            }
            MachineStatus::Healthy => {}
        }
        if machine.idle_time_pct > IDLE_ALERT_THRESHOLD {
            alerts.push(Alert::new(
                AlertKind::Energy,
                id,
                format!(
                    "High idle time on Machine {id} ({:.1}%). Energy waste detected.",
                    machine.idle_time_pct
                ),
                now,
                rng,
            ));
        }
    }
    alerts.sort_by_key(|alert| alert.timestamp);
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fz_fleet::FleetRegistry;
    use fz_sim::{ScriptedRandom, SeededRandom};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).single().unwrap()
    }

    fn machine(id: MachineId) -> Machine {
        FleetRegistry::catalog()
            .into_iter()
            .find(|m| m.machine_id == id)
            .unwrap()
    }

    #[test]
    fn critical_idle_machine_raises_three_alerts() {
        // Machine 5: health 45, idle 25.
        let alerts = generate_alerts(&[machine(5)], now(), &mut SeededRandom::new(1));
        let mut kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        kinds.sort_by_key(|k| k.to_string());
        assert_eq!(
            kinds,
            vec![AlertKind::Critical, AlertKind::Energy, AlertKind::Maintenance]
        );
        for alert in &alerts {
            match alert.kind {
                AlertKind::Critical | AlertKind::Maintenance => {
                    assert_eq!(alert.priority, AlertPriority::High)
                }
                _ => assert_eq!(alert.priority, AlertPriority::Medium),
            }
        }
    }

    #[test]
    fn warning_and_healthy_machines() {
        // Machine 3 is Warning with idle 18; machine 1 is Healthy with idle 12.
        let alerts = generate_alerts(&[machine(3), machine(1)], now(), &mut SeededRandom::new(2));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Warning);
        assert_eq!(alerts[0].machine_id, 3);
        assert_eq!(alerts[0].message, "Machine 3 health needs attention (71.0%)");
    }

    #[test]
    fn healthy_idle_machine_gets_energy_alert_only() {
        let mut idle = machine(1);
        idle.idle_time_pct = 20.5;
        let alerts = generate_alerts(&[idle], now(), &mut ScriptedRandom::constant(0.5));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Energy);
        assert_eq!(alerts[0].timestamp, now() - Duration::minutes(45));
        assert_eq!(
            alerts[0].message,
            "High idle time on Machine 1 (20.5%). Energy waste detected."
        );
    }

    #[test]
    fn timestamps_ascend_and_stay_in_window() {
        let fleet = FleetRegistry::catalog();
        let alerts = generate_alerts(&fleet, now(), &mut SeededRandom::new(77));
        assert!(!alerts.is_empty());
        for pair in alerts.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        for alert in &alerts {
            assert!(alert.timestamp <= now());
            assert!(alert.timestamp >= now() - alert.kind.window());
        }
    }

    #[test]
    fn serialises_kind_as_type() {
        let alerts = generate_alerts(&[machine(5)], now(), &mut ScriptedRandom::constant(0.0));
        let json = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(json["priority"], "high");
        assert!(json["type"].is_string());
    }
}
