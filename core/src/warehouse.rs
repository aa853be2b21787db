//! SQL warehouse auto-discovery for space creation.
//!
//! Only PRO (serverless-capable) warehouses are considered. Running
//! warehouses win over stopped ones to avoid cold starts, then the cluster
//! size closest to the purpose wins.

use crate::model::Warehouse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Development,
    Production,
}

/// PRO warehouses only; classic ones cannot back a Genie space.
pub fn pro_warehouses(warehouses: &[Warehouse]) -> Vec<&Warehouse> {
    warehouses
        .iter()
        .filter(|w| w.warehouse_type.eq_ignore_ascii_case("PRO"))
        .collect()
}

/// Pick a warehouse for the given purpose, or `None` when no PRO warehouse
/// exists. Development prefers the smallest sizes, production the largest;
/// size matching is a case-insensitive substring test on `cluster_size`.
pub fn recommend<'a>(warehouses: &'a [Warehouse], purpose: Purpose) -> Option<&'a Warehouse> {
    let pro = pro_warehouses(warehouses);
    if pro.is_empty() {
        return None;
    }

    let running: Vec<&Warehouse> = pro
        .iter()
        .copied()
        .filter(|w| w.state.eq_ignore_ascii_case("RUNNING"))
        .collect();
    let candidates = if running.is_empty() { pro } else { running };

    let preferred: &[&str] = match purpose {
        Purpose::Development => &["2X-Small", "X-Small", "Small"],
        Purpose::Production => &["Large", "Medium"],
    };
    for size in preferred {
        let needle = size.to_lowercase();
        if let Some(found) = candidates
            .iter()
            .find(|w| w.cluster_size.to_lowercase().contains(&needle))
        {
            return Some(found);
        }
    }

    candidates.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warehouse(id: &str, state: &str, size: &str, warehouse_type: &str) -> Warehouse {
        Warehouse {
            id: id.to_string(),
            name: format!("wh-{id}"),
            state: state.to_string(),
            cluster_size: size.to_string(),
            warehouse_type: warehouse_type.to_string(),
        }
    }

    #[test]
    fn running_beats_stopped() {
        let warehouses = vec![
            warehouse("stopped-small", "STOPPED", "Small", "PRO"),
            warehouse("running-large", "RUNNING", "Large", "PRO"),
        ];
        let picked = recommend(&warehouses, Purpose::Development).unwrap();
        assert_eq!(picked.id, "running-large");
    }

    #[test]
    fn development_prefers_smallest_size() {
        let warehouses = vec![
            warehouse("large", "RUNNING", "Large", "PRO"),
            warehouse("small", "RUNNING", "Small", "PRO"),
            warehouse("xsmall", "RUNNING", "X-Small", "PRO"),
        ];
        let picked = recommend(&warehouses, Purpose::Development).unwrap();
        assert_eq!(picked.id, "xsmall");
    }

    #[test]
    fn two_x_small_wins_over_x_small_for_development() {
        let warehouses = vec![
            warehouse("xs", "RUNNING", "X-Small", "PRO"),
            warehouse("xxs", "RUNNING", "2X-Small", "PRO"),
        ];
        let picked = recommend(&warehouses, Purpose::Development).unwrap();
        assert_eq!(picked.id, "xxs");
    }

    #[test]
    fn production_prefers_large() {
        let warehouses = vec![
            warehouse("small", "RUNNING", "Small", "PRO"),
            warehouse("medium", "RUNNING", "Medium", "PRO"),
            warehouse("large", "RUNNING", "Large", "PRO"),
        ];
        let picked = recommend(&warehouses, Purpose::Production).unwrap();
        assert_eq!(picked.id, "large");
    }

    #[test]
    fn classic_warehouses_are_ignored() {
        let warehouses = vec![warehouse("classic", "RUNNING", "Small", "CLASSIC")];
        assert!(recommend(&warehouses, Purpose::Development).is_none());
    }

    #[test]
    fn falls_back_to_first_candidate() {
        let warehouses = vec![
            warehouse("odd-a", "STOPPED", "Custom", "PRO"),
            warehouse("odd-b", "STOPPED", "Custom", "PRO"),
        ];
        let picked = recommend(&warehouses, Purpose::Production).unwrap();
        assert_eq!(picked.id, "odd-a");
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(recommend(&[], Purpose::Development).is_none());
    }
}
