use std::collections::{HashMap, HashSet};

use crate::types::db::{unit, user};
use crate::types::dto::org_chart::{ChartUser, UnitNode};
use crate::types::dto::user::UnitSummary;

/// All units below `root_id`, breadth first, excluding the root itself
///
/// A cycle stops the walk at the first revisited unit.
pub fn descendant_ids(units: &[unit::Model], root_id: i32) -> Vec<i32> {
    let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
    for unit in units {
        if let Some(parent_id) = unit.parent_unit_id {
            children.entry(parent_id).or_default().push(unit.id);
        }
    }

    let mut visited = HashSet::from([root_id]);
    let mut result = Vec::new();
    let mut queue = vec![root_id];

    while let Some(current) = queue.pop() {
        for &child in children.get(&current).map(Vec::as_slice).unwrap_or_default() {
            if !visited.insert(child) {
                tracing::warn!("Unit hierarchy cycle detected at unit {} below {}", child, root_id);
                continue;
            }
            result.push(child);
            queue.push(child);
        }
    }

    result
}

/// Parent chain of `unit_id`, nearest first
pub fn ancestor_ids(units: &[unit::Model], unit_id: i32) -> Vec<i32> {
    let parents: HashMap<i32, Option<i32>> =
        units.iter().map(|u| (u.id, u.parent_unit_id)).collect();

    let mut visited = HashSet::from([unit_id]);
    let mut result = Vec::new();
    let mut current = parents.get(&unit_id).copied().flatten();

    while let Some(parent_id) = current {
        if !visited.insert(parent_id) {
            tracing::warn!("Unit hierarchy cycle detected at unit {} above {}", parent_id, unit_id);
            break;
        }
        result.push(parent_id);
        current = parents.get(&parent_id).copied().flatten();
    }

    result
}

/// Assemble the chart forest from active units and their members
///
/// `units` must already be filtered to active units and ordered for display;
/// sibling order follows that input order. Units whose parent is absent from
/// `units` become roots. Units only reachable through a cycle are promoted
/// to roots so they still appear on the chart.
pub fn build_chart(
    units: &[unit::Model],
    members: &[user::Model],
    public_base: &str,
) -> Vec<UnitNode> {
    let by_id: HashMap<i32, &unit::Model> = units.iter().map(|u| (u.id, u)).collect();

    let mut children: HashMap<i32, Vec<&unit::Model>> = HashMap::new();
    let mut roots: Vec<&unit::Model> = Vec::new();
    for unit in units {
        match unit.parent_unit_id.filter(|parent_id| by_id.contains_key(parent_id)) {
            Some(parent_id) => children.entry(parent_id).or_default().push(unit),
            None => roots.push(unit),
        }
    }

    let mut users_by_unit: HashMap<i32, Vec<ChartUser>> = HashMap::new();
    for member in members {
        if let Some(unit_id) = member.unit_id {
            users_by_unit
                .entry(unit_id)
                .or_default()
                .push(ChartUser::from_model(member, public_base));
        }
    }

    let mut reachable: HashSet<i32> = roots
        .iter()
        .flat_map(|root| std::iter::once(root.id).chain(descendant_ids(units, root.id)))
        .collect();
    for unit in units {
        if reachable.contains(&unit.id) {
            continue;
        }
        tracing::warn!("Unit {} is only reachable through a cycle; showing it as a root", unit.id);
        roots.push(unit);
        reachable.insert(unit.id);
        reachable.extend(descendant_ids(units, unit.id));
    }

    let assembler = ChartAssembler {
        by_id: &by_id,
        children: &children,
        users_by_unit: &users_by_unit,
    };
    let mut visited = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| assembler.node(root, &mut visited))
        .collect()
}

struct ChartAssembler<'a> {
    by_id: &'a HashMap<i32, &'a unit::Model>,
    children: &'a HashMap<i32, Vec<&'a unit::Model>>,
    users_by_unit: &'a HashMap<i32, Vec<ChartUser>>,
}

impl ChartAssembler<'_> {
    fn node(&self, unit: &unit::Model, visited: &mut HashSet<i32>) -> Option<UnitNode> {
        if !visited.insert(unit.id) {
            return None;
        }

        let mut node = UnitNode::bare(unit);
        node.parent = unit
            .parent_unit_id
            .and_then(|parent_id| self.by_id.get(&parent_id))
            .map(|parent| UnitSummary::from(*parent));
        node.users = self.users_by_unit.get(&unit.id).cloned().unwrap_or_default();
        node.children = self
            .children
            .get(&unit.id)
            .map(|kids| {
                kids.iter()
                    .filter_map(|child| self.node(child, visited))
                    .collect()
            })
            .unwrap_or_default();
        Some(node)
    }
}
