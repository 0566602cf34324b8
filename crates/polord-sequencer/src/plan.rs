use std::collections::BTreeMap;

use thiserror::Error;

use crate::{AnchorSpec, EntityKind, MoveCommand};

/// name -> stable backend id, scoped to one planning call.
pub type NameToId = BTreeMap<String, String>;

/// A named entity and its desired 1-based position within the planned scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRef {
    pub name: String,
    pub target_index: u32,
}

impl EntityRef {
    pub fn new(name: impl Into<String>, target_index: u32) -> Self {
        Self {
            name: name.into(),
            target_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    /// An entity name has no id in the supplied map. The reconciler resolves
    /// every name before planning, so this only surfaces for direct callers.
    #[error("{kind} '{name}' has no resolved id")]
    UnresolvedName { kind: EntityKind, name: String },
}

fn resolve<'a>(
    kind: EntityKind,
    entities: &'a [EntityRef],
    name_to_id: &'a NameToId,
) -> Result<Vec<&'a str>, PlanError> {
    let mut sorted: Vec<&EntityRef> = entities.iter().collect();
    // Ties are rejected by model validation; a stable sort keeps input order
    // for direct callers that skip it.
    sorted.sort_by_key(|e| e.target_index);

    sorted
        .into_iter()
        .map(|e| {
            name_to_id
                .get(&e.name)
                .map(|id| id.as_str())
                .ok_or_else(|| PlanError::UnresolvedName {
                    kind,
                    name: e.name.clone(),
                })
        })
        .collect()
}

/// Full resequence of one scope.
///
/// The first entity (by target index) is moved to `start_anchor`; every
/// following entity is moved directly after the one placed before it. Ids
/// are stable across moves, so chaining on the previous id stays valid no
/// matter where that entity sat before the plan ran.
///
/// Caller context picks the start anchor: `FirstInPolicy`, `LastInPolicy` or
/// `AfterContainer(start_after)` for containers, `FirstInContainer(id)` for
/// the items of one container.
pub fn plan(
    kind: EntityKind,
    entities: &[EntityRef],
    name_to_id: &NameToId,
    start_anchor: AnchorSpec,
) -> Result<Vec<MoveCommand>, PlanError> {
    let ids = resolve(kind, entities, name_to_id)?;
    Ok(chain(kind, &ids, start_anchor))
}

fn chain(kind: EntityKind, ids: &[&str], start_anchor: AnchorSpec) -> Vec<MoveCommand> {
    let mut out = Vec::with_capacity(ids.len());
    let mut previous_id: Option<&str> = None;

    for &id in ids {
        let anchor = match previous_id {
            None => start_anchor.clone(),
            Some(prev) => AnchorSpec::after(kind, prev),
        };
        out.push(MoveCommand {
            target_id: id.to_string(),
            anchor,
            kind,
        });
        previous_id = Some(id);
    }

    out
}

/// Like [`plan`], but returns no commands when `current` already shows the
/// desired ids contiguously and in order at the start anchor.
///
/// `current` is the scope's id listing in backend order: all container ids
/// of the policy for the container chain, or the item ids currently inside
/// the container for an item chain. The scope is either left untouched or
/// fully resequenced; partial diffs are never emitted.
pub fn plan_minimal(
    kind: EntityKind,
    entities: &[EntityRef],
    name_to_id: &NameToId,
    start_anchor: AnchorSpec,
    current: &[String],
) -> Result<Vec<MoveCommand>, PlanError> {
    let ids = resolve(kind, entities, name_to_id)?;
    if already_placed(&ids, &start_anchor, current) {
        return Ok(Vec::new());
    }
    Ok(chain(kind, &ids, start_anchor))
}

fn already_placed(desired: &[&str], start_anchor: &AnchorSpec, current: &[String]) -> bool {
    if desired.is_empty() {
        return true;
    }

    let window: &[String] = match start_anchor {
        AnchorSpec::FirstInPolicy | AnchorSpec::FirstInContainer(_) => current,
        AnchorSpec::LastInPolicy => {
            if current.len() < desired.len() {
                return false;
            }
            &current[current.len() - desired.len()..]
        }
        AnchorSpec::AfterContainer(anchor) | AnchorSpec::AfterItem(anchor) => {
            match current.iter().position(|id| id == anchor) {
                Some(pos) => &current[pos + 1..],
                None => return false,
            }
        }
    };

    window.len() >= desired.len()
        && window.iter().zip(desired).all(|(have, want)| have == want)
}
