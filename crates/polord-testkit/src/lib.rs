//! Shared fixtures for cross-crate scenario tests.
//!
//! A *layout* is `[(section, [rules])]` in policy order. It describes both
//! a seeded paper backend and a desired order, so a scenario reads as
//! "start here, want that".

use anyhow::{Context, Result};
use polord_model::{ContainerSpec, ItemSpec};
use polord_paper::{BackendState, PaperBackend, RecordedCall};
use polord_reconcile::ResultSnapshot;
use polord_sequencer::{AnchorSpec, EntityKind};
use std::collections::BTreeMap;
use std::fs;

/// Owned layout, as observed on a backend.
pub type Layout = Vec<(String, Vec<String>)>;

/// Desired order matching `layout` exactly: list position becomes the
/// 1-based index, for sections and for rules within each section.
pub fn desired_from_layout(layout: &[(&str, &[&str])]) -> (Vec<ContainerSpec>, Vec<ItemSpec>) {
    let mut containers = Vec::new();
    let mut items = Vec::new();
    for (ci, (section, rules)) in layout.iter().enumerate() {
        containers.push(ContainerSpec::new(*section, ci as u32 + 1));
        for (ri, rule) in rules.iter().enumerate() {
            items.push(ItemSpec::new(*rule, *section, ri as u32 + 1));
        }
    }
    (containers, items)
}

/// Current layout of a paper backend by name.
pub fn observed_layout(pb: &PaperBackend) -> Layout {
    layout_of(&pb.state())
}

pub fn layout_of(state: &BackendState) -> Layout {
    state
        .sections
        .iter()
        .map(|s| (s.name.clone(), s.rules.iter().map(|r| r.name.clone()).collect()))
        .collect()
}

pub fn owned(layout: &[(&str, &[&str])]) -> Layout {
    layout
        .iter()
        .map(|(s, rules)| (s.to_string(), rules.iter().map(|r| r.to_string()).collect()))
        .collect()
}

/// Every permutation of `0..n`, in a fixed order (Heap's algorithm).
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn heap(k: usize, cur: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if k <= 1 {
            out.push(cur.clone());
            return;
        }
        for i in 0..k - 1 {
            heap(k - 1, cur, out);
            if k % 2 == 0 {
                cur.swap(i, k - 1);
            } else {
                cur.swap(0, k - 1);
            }
        }
        heap(k - 1, cur, out);
    }

    let mut cur: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    heap(n, &mut cur, &mut out);
    out
}

/// `items` reordered by `order` (indices into `items`).
pub fn reorder<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| items[i].clone()).collect()
}

/// Check that every item move is preceded by the move of the container the
/// snapshot places it in (when that container was moved at all).
///
/// Returns the offending item id on violation.
pub fn container_moves_precede_items(
    calls: &[RecordedCall],
    snapshot: &ResultSnapshot,
) -> std::result::Result<(), String> {
    let mut container_of: BTreeMap<&str, &str> = BTreeMap::new();
    for (container, _, placed) in snapshot.iter_items() {
        if let Some(c) = snapshot.container(container) {
            container_of.insert(placed.id.as_str(), c.id.as_str());
        }
    }
    let container_moves: Vec<(usize, &str)> = calls
        .iter()
        .enumerate()
        .filter_map(|(pos, c)| match c {
            RecordedCall::MoveContainer { id, .. } => Some((pos, id.as_str())),
            _ => None,
        })
        .collect();

    for (pos, call) in calls.iter().enumerate() {
        let RecordedCall::MoveItem { id, .. } = call else {
            continue;
        };
        let Some(cid) = container_of.get(id.as_str()) else {
            continue;
        };
        let later = container_moves
            .iter()
            .any(|(cpos, moved)| moved == cid && *cpos > pos);
        if later {
            return Err(id.clone());
        }
    }
    Ok(())
}

/// Kind and anchor of every recorded move, in order.
pub fn move_trace(calls: &[RecordedCall]) -> Vec<(EntityKind, String, AnchorSpec)> {
    calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::MoveContainer { id, anchor, .. } => {
                Some((EntityKind::Container, id.clone(), anchor.clone()))
            }
            RecordedCall::MoveItem { id, anchor, .. } => {
                Some((EntityKind::Item, id.clone(), anchor.clone()))
            }
            _ => None,
        })
        .collect()
}

pub fn load_state_json(path: &str) -> Result<BackendState> {
    let s = fs::read_to_string(path).with_context(|| format!("read state: {path}"))?;
    let state: BackendState = serde_json::from_str(&s).context("parse state json")?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutations_are_complete_and_distinct() {
        let mut p = permutations(4);
        assert_eq!(p.len(), 24);
        assert_eq!(p[0], vec![0, 1, 2, 3]);
        p.sort();
        p.dedup();
        assert_eq!(p.len(), 24);
        assert_eq!(permutations(0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn desired_indices_follow_layout_position() {
        let (cs, is) = desired_from_layout(&[("b", &["x"]), ("a", &["y", "z"])]);
        assert_eq!(cs[0], ContainerSpec::new("b", 1));
        assert_eq!(cs[1], ContainerSpec::new("a", 2));
        assert_eq!(is[2], ItemSpec::new("z", "a", 2));
    }
}
