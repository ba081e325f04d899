//! ---
//! fz_section: "02-fleet-model"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Fleet catalog, users and visibility rules."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::errors::{FleetError, Result};

/// Stable identity of a machine in the catalog.
pub type MachineId = u32;

/// Health score at or above which a machine is healthy.
pub const HEALTHY_THRESHOLD: f64 = 75.0;
/// Health score below which a machine is critical.
pub const CRITICAL_THRESHOLD: f64 = 50.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum Plant {
    #[serde(rename = "Plant A")]
    #[strum(serialize = "Plant A")]
    PlantA,
    #[serde(rename = "Plant B")]
    #[strum(serialize = "Plant B")]
    PlantB,
    #[serde(rename = "Plant C")]
    #[strum(serialize = "Plant C")]
    PlantC,
    #[serde(rename = "Plant D")]
    #[strum(serialize = "Plant D")]
    PlantD,
}

impl Plant {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl FromStr for Plant {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Plant::iter()
            .find(|plant| plant.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| FleetError::UnknownPlant(s.to_owned()))
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum MachineType {
    Slitter,
    Inspection,
}

impl MachineType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl FromStr for MachineType {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        MachineType::iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| FleetError::UnknownMachineType(s.to_owned()))
    }
}

/// Machine-type part of a selection: every type, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeFilter {
    #[default]
    All,
    Only(MachineType),
}

impl TypeFilter {
    pub const ALL: &'static str = "All";

    pub fn matches(&self, machine_type: MachineType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(kind) => *kind == machine_type,
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.write_str(Self::ALL),
            TypeFilter::Only(kind) => f.write_str(kind.as_str()),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case(Self::ALL) {
            return Ok(TypeFilter::All);
        }
        s.parse().map(TypeFilter::Only)
    }
}

impl TryFrom<String> for TypeFilter {
    type Error = FleetError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeFilter> for String {
    fn from(value: TypeFilter) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum MachineStatus {
    Healthy,
    Warning,
    Critical,
}

impl MachineStatus {
    /// Classify a health score. This is the only way a status comes into being.
    pub fn from_health(score: f64) -> Self {
        if score < CRITICAL_THRESHOLD {
            MachineStatus::Critical
        } else if score < HEALTHY_THRESHOLD {
            MachineStatus::Warning
        } else {
            MachineStatus::Healthy
        }
    }
}

/// Initial attribute values for a machine, also the accepted wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSeed {
    pub machine_id: MachineId,
    pub plant: Plant,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
    pub health_score: f64,
    pub temperature: f64,
    pub vibration: f64,
    pub load: f64,
    pub rpm: f64,
    pub current: f64,
    pub energy_kw: f64,
    pub idle_time_pct: f64,
    pub rul_days: f64,
}

/// One physical unit of the fleet.
///
/// `status` always equals [`MachineStatus::from_health`] of `health_score`:
/// both are private and only [`Machine::set_health_score`] writes them.
/// Deserialisation ignores any incoming status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MachineSeed")]
pub struct Machine {
    pub machine_id: MachineId,
    pub plant: Plant,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
    health_score: f64,
    status: MachineStatus,
    pub temperature: f64,
    pub vibration: f64,
    pub load: f64,
    pub rpm: f64,
    pub current: f64,
    pub energy_kw: f64,
    pub idle_time_pct: f64,
    pub rul_days: f64,
}

impl Machine {
    pub fn health_score(&self) -> f64 {
        self.health_score
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    /// Set the health score (clamped to `[0, 100]`) and re-derive the status.
    pub fn set_health_score(&mut self, score: f64) {
        let score = if score.is_nan() { 0.0 } else { score };
        self.health_score = score.clamp(0.0, 100.0);
        self.status = MachineStatus::from_health(self.health_score);
    }

    pub fn is_critical(&self) -> bool {
        self.status == MachineStatus::Critical
    }
}

impl From<MachineSeed> for Machine {
    fn from(seed: MachineSeed) -> Self {
        let mut machine = Machine {
            machine_id: seed.machine_id,
            plant: seed.plant,
            machine_type: seed.machine_type,
            health_score: 0.0,
            status: MachineStatus::Critical,
            temperature: seed.temperature,
            vibration: seed.vibration,
            load: seed.load,
            rpm: seed.rpm,
            current: seed.current,
            energy_kw: seed.energy_kw,
            idle_time_pct: seed.idle_time_pct,
            rul_days: seed.rul_days.max(0.0),
        };
        machine.set_health_score(seed.health_score);
        machine
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, IntoStaticStr,
)]
pub enum Role {
    Operator,
    Supervisor,
    Manager,
    Admin,
}

impl FromStr for Role {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Role::iter()
            .find(|role| <&'static str>::from(*role).eq_ignore_ascii_case(needle))
            .ok_or_else(|| FleetError::UnknownRole(s.to_owned()))
    }
}

/// Identity supplied by the session collaborator. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub assigned_plants: IndexSet<Plant>,
    pub allowed_types: IndexSet<MachineType>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        assigned_plants: impl IntoIterator<Item = Plant>,
        allowed_types: impl IntoIterator<Item = MachineType>,
    ) -> Result<Self> {
        let user = Self {
            id: id.into(),
            name: name.into(),
            role,
            assigned_plants: assigned_plants.into_iter().collect(),
            allowed_types: allowed_types.into_iter().collect(),
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<()> {
        if self.assigned_plants.is_empty() {
            return Err(FleetError::EmptyAssignment {
                user: self.id.clone(),
                what: "plant",
            });
        }
        if self.allowed_types.is_empty() {
            return Err(FleetError::EmptyAssignment {
                user: self.id.clone(),
                what: "machine type",
            });
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_access(&self, plant: Plant, machine_type: MachineType) -> bool {
        self.assigned_plants.contains(&plant) && self.allowed_types.contains(&machine_type)
    }

    /// First assigned plant, the default plant selection.
    pub fn primary_plant(&self) -> Option<Plant> {
        self.assigned_plants.first().copied()
    }
}

/// View parameters chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Only consulted for non-admin roles.
    pub selected_plant: Plant,
    pub selected_machine_type: TypeFilter,
    pub simulated_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(health_score: f64) -> MachineSeed {
        MachineSeed {
            machine_id: 99,
            plant: Plant::PlantB,
            machine_type: MachineType::Slitter,
            health_score,
            temperature: 70.0,
            vibration: 0.5,
            load: 80.0,
            rpm: 2000.0,
            current: 35.0,
            energy_kw: 12.0,
            idle_time_pct: 15.0,
            rul_days: 90.0,
        }
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(MachineStatus::from_health(0.0), MachineStatus::Critical);
        assert_eq!(MachineStatus::from_health(49.99), MachineStatus::Critical);
        assert_eq!(MachineStatus::from_health(50.0), MachineStatus::Warning);
        assert_eq!(MachineStatus::from_health(74.99), MachineStatus::Warning);
        assert_eq!(MachineStatus::from_health(75.0), MachineStatus::Healthy);
        assert_eq!(MachineStatus::from_health(100.0), MachineStatus::Healthy);
    }

    #[test]
    fn raising_health_flips_status() {
        let mut machine = Machine::from(seed(45.0));
        assert_eq!(machine.status(), MachineStatus::Critical);
        machine.set_health_score(90.0);
        assert_eq!(machine.status(), MachineStatus::Healthy);
        machine.set_health_score(60.0);
        assert_eq!(machine.status(), MachineStatus::Warning);
    }

    #[test]
    fn health_is_clamped() {
        let mut machine = Machine::from(seed(140.0));
        assert_eq!(machine.health_score(), 100.0);
        machine.set_health_score(-3.0);
        assert_eq!(machine.health_score(), 0.0);
        machine.set_health_score(f64::NAN);
        assert_eq!(machine.health_score(), 0.0);
        assert!(machine.is_critical());
    }

    #[test]
    fn deserialisation_rederives_status() {
        let json = serde_json::json!({
            "machine_id": 3,
            "plant": "Plant A",
            "type": "Inspection",
            "health_score": 45.0,
            "status": "Healthy",
            "temperature": 72.0,
            "vibration": 0.6,
            "load": 85.0,
            "rpm": 2050.0,
            "current": 38.0,
            "energy_kw": 13.8,
            "idle_time_pct": 18.0,
            "rul_days": 95.0
        });
        let machine: Machine = serde_json::from_value(json).unwrap();
        assert_eq!(machine.status(), MachineStatus::Critical);
        assert_eq!(machine.plant, Plant::PlantA);

        let back = serde_json::to_value(&machine).unwrap();
        assert_eq!(back["status"], "Critical");
        assert_eq!(back["type"], "Inspection");
    }

    #[test]
    fn parses_vocabulary() {
        assert_eq!("Plant C".parse::<Plant>().unwrap(), Plant::PlantC);
        assert_eq!("plant d".parse::<Plant>().unwrap(), Plant::PlantD);
        assert_eq!(
            "Plant Z".parse::<Plant>().unwrap_err(),
            FleetError::UnknownPlant("Plant Z".into())
        );
        assert_eq!("All".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!(
            "slitter".parse::<TypeFilter>().unwrap(),
            TypeFilter::Only(MachineType::Slitter)
        );
        assert!("Lathe".parse::<TypeFilter>().is_err());
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Plant::PlantB.to_string(), "Plant B");
    }

    #[test]
    fn type_filter_serialises_as_string() {
        let value = serde_json::to_value(TypeFilter::Only(MachineType::Inspection)).unwrap();
        assert_eq!(value, "Inspection");
        let all: TypeFilter = serde_json::from_value(serde_json::json!("All")).unwrap();
        assert_eq!(all, TypeFilter::All);
    }

    #[test]
    fn user_requires_assignments() {
        let err = User::new("u-x", "Nobody", Role::Operator, [], [MachineType::Slitter])
            .unwrap_err();
        assert!(matches!(err, FleetError::EmptyAssignment { what: "plant", .. }));
        let err = User::new("u-x", "Nobody", Role::Operator, [Plant::PlantA], []).unwrap_err();
        assert!(matches!(
            err,
            FleetError::EmptyAssignment {
                what: "machine type",
                ..
            }
        ));
    }
}
