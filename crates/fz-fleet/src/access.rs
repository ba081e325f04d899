//! ---
//! fz_section: "06-security-access-control"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Role, plant and machine-type visibility rules."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Both predicates are pure and total. Admins bypass only the plant-selection
//! clause; their plant and type assignments still apply.

use crate::model::{Machine, Selection, User};

/// Machine is permitted for the user, ignoring the current selection.
pub fn visible_accessible(machine: &Machine, user: &User) -> bool {
    user.can_access(machine.plant, machine.machine_type)
}

/// Machine is permitted for the user and matches the current selection.
pub fn visible_for_selection(machine: &Machine, user: &User, selection: &Selection) -> bool {
    visible_accessible(machine, user)
        && (user.is_admin() || machine.plant == selection.selected_plant)
        && selection.selected_machine_type.matches(machine.machine_type)
}

/// Selection-filtered copy of `machines`, order preserved.
pub fn filter_for_selection(machines: &[Machine], user: &User, selection: &Selection) -> Vec<Machine> {
    machines
        .iter()
        .filter(|machine| visible_for_selection(machine, user, selection))
        .cloned()
        .collect()
}

/// Accessible copy of `machines` for cross-plant views, order preserved.
pub fn filter_accessible(machines: &[Machine], user: &User) -> Vec<Machine> {
    machines
        .iter()
        .filter(|machine| visible_accessible(machine, user))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineId, MachineType, Plant, Role, TypeFilter};
    use crate::registry::FleetRegistry;
    use crate::session::UserDirectory;
    use strum::IntoEnumIterator;

    fn ids(machines: &[Machine]) -> Vec<MachineId> {
        machines.iter().map(|m| m.machine_id).collect()
    }

    fn selection(plant: Plant, filter: TypeFilter) -> Selection {
        Selection {
            selected_plant: plant,
            selected_machine_type: filter,
            simulated_mode: false,
        }
    }

    #[test]
    fn operator_sees_plant_a_slitters_only() {
        let directory = UserDirectory::builtin();
        let operator = directory.get("u-op").unwrap();
        let fleet = FleetRegistry::catalog();
        for filter in [
            TypeFilter::All,
            TypeFilter::Only(MachineType::Slitter),
        ] {
            let visible = filter_for_selection(&fleet, operator, &selection(Plant::PlantA, filter));
            assert_eq!(ids(&visible), vec![1, 2]);
        }
        let inspection = filter_for_selection(
            &fleet,
            operator,
            &selection(Plant::PlantA, TypeFilter::Only(MachineType::Inspection)),
        );
        assert!(inspection.is_empty());
    }

    #[test]
    fn non_admin_is_bound_to_selected_plant() {
        let directory = UserDirectory::builtin();
        let supervisor = directory.get("u-sup").unwrap();
        let fleet = FleetRegistry::catalog();
        let visible =
            filter_for_selection(&fleet, supervisor, &selection(Plant::PlantB, TypeFilter::All));
        assert_eq!(ids(&visible), vec![5, 6, 7]);

        // Selecting an unassigned plant shows nothing rather than failing.
        let visible =
            filter_for_selection(&fleet, supervisor, &selection(Plant::PlantD, TypeFilter::All));
        assert!(visible.is_empty());
    }

    #[test]
    fn admin_ignores_plant_selection() {
        let directory = UserDirectory::builtin();
        let admin = directory.get("u-admin").unwrap();
        let fleet = FleetRegistry::catalog();
        let all = filter_for_selection(&fleet, admin, &selection(Plant::PlantC, TypeFilter::All));
        assert_eq!(all.len(), 14);
        let inspections = filter_for_selection(
            &fleet,
            admin,
            &selection(Plant::PlantA, TypeFilter::Only(MachineType::Inspection)),
        );
        assert_eq!(ids(&inspections), vec![3, 4, 7, 11, 12, 14]);
    }

    #[test]
    fn admin_still_respects_assignments() {
        let admin = User::new(
            "u-limited",
            "Limited Admin",
            Role::Admin,
            [Plant::PlantD],
            [MachineType::Slitter],
        )
        .unwrap();
        let fleet = FleetRegistry::catalog();
        let visible = filter_for_selection(&fleet, &admin, &selection(Plant::PlantA, TypeFilter::All));
        assert_eq!(ids(&visible), vec![13]);
    }

    #[test]
    fn selection_view_is_subset_of_accessible_view() {
        let directory = UserDirectory::builtin();
        let fleet = FleetRegistry::catalog();
        for user in directory.users() {
            let accessible = filter_accessible(&fleet, user);
            for plant in Plant::iter() {
                for filter in [
                    TypeFilter::All,
                    TypeFilter::Only(MachineType::Slitter),
                    TypeFilter::Only(MachineType::Inspection),
                ] {
                    let visible = filter_for_selection(&fleet, user, &selection(plant, filter));
                    assert!(visible.iter().all(|m| accessible.contains(m)));
                    assert!(accessible.iter().all(|m| fleet.contains(m)));
                }
            }
        }
    }

    #[test]
    fn accessible_view_ignores_selection() {
        let directory = UserDirectory::builtin();
        let manager = directory.get("u-mgr").unwrap();
        let fleet = FleetRegistry::catalog();
        let accessible = filter_accessible(&fleet, manager);
        assert_eq!(ids(&accessible), (1..=12).collect::<Vec<_>>());
    }
}
