//! ---
//! fz_section: "02-fleet-model"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Fleet catalog, users and visibility rules."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{FleetError, Result};
use crate::model::{MachineType, Plant, Role, Selection, TypeFilter, User};

/// Reference users available to the session collaborator.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: IndexMap<String, User>,
}

impl UserDirectory {
    /// The four built-in accounts, one per role.
    pub fn builtin() -> Self {
        let both = [MachineType::Slitter, MachineType::Inspection];
        let users = [
            User {
                id: "u-op".into(),
                name: "John Operator".into(),
                role: Role::Operator,
                assigned_plants: [Plant::PlantA].into_iter().collect(),
                allowed_types: [MachineType::Slitter].into_iter().collect(),
            },
            User {
                id: "u-sup".into(),
                name: "Sarah Supervisor".into(),
                role: Role::Supervisor,
                assigned_plants: [Plant::PlantA, Plant::PlantB].into_iter().collect(),
                allowed_types: both.into_iter().collect(),
            },
            User {
                id: "u-mgr".into(),
                name: "Mike Manager".into(),
                role: Role::Manager,
                assigned_plants: [Plant::PlantA, Plant::PlantB, Plant::PlantC]
                    .into_iter()
                    .collect(),
                allowed_types: both.into_iter().collect(),
            },
            User {
                id: "u-admin".into(),
                name: "Admin User".into(),
                role: Role::Admin,
                assigned_plants: [Plant::PlantA, Plant::PlantB, Plant::PlantC, Plant::PlantD]
                    .into_iter()
                    .collect(),
                allowed_types: both.into_iter().collect(),
            },
        ];
        Self {
            users: users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
        }
    }

    /// Build a directory from arbitrary users, rejecting invalid assignments.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Result<Self> {
        let mut map = IndexMap::new();
        for user in users {
            user.validate()?;
            map.insert(user.id.clone(), user);
        }
        Ok(Self { users: map })
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&User> {
        self.get(id)
            .ok_or_else(|| FleetError::UnknownUser(id.to_owned()))
    }

    /// First registered user, the fallback when nothing was stored.
    pub fn default_user(&self) -> Option<&User> {
        self.users.values().next()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Selection {
    /// Default view for a user: first assigned plant, the single allowed type
    /// (or `All`), simulation off.
    pub fn for_user(user: &User) -> Self {
        Self {
            selected_plant: user.primary_plant().unwrap_or(Plant::PlantA),
            selected_machine_type: default_type_filter(user),
            simulated_mode: false,
        }
    }

    /// Bring a selection back inside what `user` may see. Returns true when
    /// anything changed.
    pub fn reconcile(&mut self, user: &User) -> bool {
        let mut changed = false;
        if !user.assigned_plants.contains(&self.selected_plant) {
            if let Some(plant) = user.primary_plant() {
                debug!(user = %user.id, from = %self.selected_plant, to = %plant, "resetting plant selection");
                self.selected_plant = plant;
                changed = true;
            }
        }
        if let TypeFilter::Only(kind) = self.selected_machine_type {
            if !user.allowed_types.contains(&kind) {
                let fallback = default_type_filter(user);
                debug!(user = %user.id, from = %kind, to = %fallback, "resetting machine type selection");
                self.selected_machine_type = fallback;
                changed = true;
            }
        }
        changed
    }
}

fn default_type_filter(user: &User) -> TypeFilter {
    match user.allowed_types.len() {
        1 => user
            .allowed_types
            .first()
            .copied()
            .map(TypeFilter::Only)
            .unwrap_or_default(),
        _ => TypeFilter::All,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_directory_has_one_user_per_role() {
        let directory = UserDirectory::builtin();
        assert_eq!(directory.len(), 4);
        let roles: Vec<Role> = directory.users().map(|u| u.role).collect();
        assert_eq!(
            roles,
            vec![Role::Operator, Role::Supervisor, Role::Manager, Role::Admin]
        );
        assert_eq!(directory.default_user().unwrap().id, "u-op");
        assert_eq!(directory.get("u-admin").unwrap().assigned_plants.len(), 4);
    }

    #[test]
    fn builtin_users_pass_validation() {
        let builtin = UserDirectory::builtin();
        for user in builtin.users() {
            user.validate().unwrap();
        }
        let rebuilt = UserDirectory::from_users(builtin.users().cloned()).unwrap();
        assert_eq!(rebuilt.len(), builtin.len());
    }

    #[test]
    fn unknown_user_is_an_error() {
        let directory = UserDirectory::builtin();
        assert_eq!(directory.require("u-mgr").unwrap().id, "u-mgr");
        assert_eq!(
            directory.require("u-ghost").unwrap_err(),
            FleetError::UnknownUser("u-ghost".into())
        );
    }

    #[test]
    fn default_selection_per_user() {
        let directory = UserDirectory::builtin();
        let operator = Selection::for_user(directory.get("u-op").unwrap());
        assert_eq!(operator.selected_plant, Plant::PlantA);
        assert_eq!(
            operator.selected_machine_type,
            TypeFilter::Only(MachineType::Slitter)
        );
        assert!(!operator.simulated_mode);

        let manager = Selection::for_user(directory.get("u-mgr").unwrap());
        assert_eq!(manager.selected_machine_type, TypeFilter::All);
    }

    #[test]
    fn reconcile_resets_disallowed_choices() {
        let directory = UserDirectory::builtin();
        let mut selection = Selection {
            selected_plant: Plant::PlantC,
            selected_machine_type: TypeFilter::Only(MachineType::Inspection),
            simulated_mode: true,
        };
        assert!(selection.reconcile(directory.get("u-op").unwrap()));
        assert_eq!(selection.selected_plant, Plant::PlantA);
        assert_eq!(
            selection.selected_machine_type,
            TypeFilter::Only(MachineType::Slitter)
        );
        assert!(selection.simulated_mode);

        // Already valid for the admin: untouched.
        assert!(!selection.reconcile(directory.get("u-admin").unwrap()));
        assert_eq!(selection.selected_plant, Plant::PlantA);
    }

    #[test]
    fn from_users_rejects_empty_assignment() {
        let broken = User {
            id: "u-empty".into(),
            name: "Empty".into(),
            role: Role::Manager,
            assigned_plants: Default::default(),
            allowed_types: [MachineType::Slitter].into_iter().collect(),
        };
        assert!(UserDirectory::from_users([broken]).is_err());
    }
}
