//! Name → id resolution against one pair of backend listings.
//!
//! Pure: takes the listings already fetched, never calls the gateway.
//!
//! Item names are only unique within a container, so item resolution runs
//! in two passes:
//! 1. an item listed inside its desired container resolves to that entry;
//! 2. anything left resolves to the single unclaimed entry with that name
//!    anywhere in the policy (it will be moved across containers).

use std::collections::{BTreeMap, BTreeSet};

use polord_gateway::{ContainerListing, ItemListing};
use polord_model::{ItemSpec, OrderModel, ValidationError};
use polord_sequencer::NameToId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Resolved {
    /// Managed container name -> id.
    pub container_ids: NameToId,
    /// Managed container name -> (item name -> id).
    pub item_ids: BTreeMap<String, NameToId>,
    /// Every container id in backend order.
    pub current_containers: Vec<String>,
    /// Container name -> item ids currently inside it, backend order.
    pub current_items: BTreeMap<String, Vec<String>>,
}

pub(crate) fn resolve(
    model: &OrderModel,
    containers: &[ContainerListing],
    items: &[ItemListing],
    start_after: Option<&str>,
) -> Result<Resolved, ValidationError> {
    let container_ids = resolve_containers(model, containers)?;

    if let Some(anchor) = start_after {
        if !containers.iter().any(|c| c.id == anchor) {
            return Err(ValidationError::AnchorNotFound {
                id: anchor.to_string(),
            });
        }
        if container_ids.values().any(|id| id == anchor) {
            return Err(ValidationError::AnchorIsManaged {
                id: anchor.to_string(),
            });
        }
    }

    let item_ids = resolve_items(model, items)?;

    let mut current_items: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        current_items
            .entry(item.container_name.clone())
            .or_default()
            .push(item.id.clone());
    }

    Ok(Resolved {
        container_ids,
        item_ids,
        current_containers: containers.iter().map(|c| c.id.clone()).collect(),
        current_items,
    })
}

fn resolve_containers(
    model: &OrderModel,
    listing: &[ContainerListing],
) -> Result<NameToId, ValidationError> {
    let mut out = NameToId::new();
    for spec in model.containers() {
        let matches: Vec<&ContainerListing> =
            listing.iter().filter(|c| c.name == spec.name).collect();
        match matches.as_slice() {
            [] => {
                return Err(ValidationError::ContainerNotFound {
                    name: spec.name.clone(),
                })
            }
            [only] => {
                out.insert(spec.name.clone(), only.id.clone());
            }
            many => {
                return Err(ValidationError::AmbiguousContainer {
                    name: spec.name.clone(),
                    candidates: many.len(),
                })
            }
        }
    }
    Ok(out)
}

fn resolve_items(
    model: &OrderModel,
    listing: &[ItemListing],
) -> Result<BTreeMap<String, NameToId>, ValidationError> {
    let mut out: BTreeMap<String, NameToId> = model
        .containers()
        .iter()
        .map(|c| (c.name.clone(), NameToId::new()))
        .collect();
    let mut claimed: BTreeSet<&str> = BTreeSet::new();
    let mut pending: Vec<&ItemSpec> = Vec::new();

    // Pass 1: already in the desired container.
    for spec in model.items() {
        let local: Vec<&ItemListing> = listing
            .iter()
            .filter(|l| l.name == spec.name && l.container_name == spec.container_name)
            .collect();
        match local.as_slice() {
            [] => pending.push(spec),
            [only] => {
                claimed.insert(only.id.as_str());
                out.entry(spec.container_name.clone())
                    .or_default()
                    .insert(spec.name.clone(), only.id.clone());
            }
            many => return Err(ambiguous(spec, many.len())),
        }
    }

    // Pass 2: unique unclaimed match anywhere else.
    for spec in pending {
        let remote: Vec<&ItemListing> = listing
            .iter()
            .filter(|l| l.name == spec.name && !claimed.contains(l.id.as_str()))
            .collect();
        match remote.as_slice() {
            [] => {
                return Err(ValidationError::ItemNotFound {
                    container: spec.container_name.clone(),
                    name: spec.name.clone(),
                })
            }
            [only] => {
                claimed.insert(only.id.as_str());
                out.entry(spec.container_name.clone())
                    .or_default()
                    .insert(spec.name.clone(), only.id.clone());
            }
            many => return Err(ambiguous(spec, many.len())),
        }
    }

    Ok(out)
}

fn ambiguous(spec: &ItemSpec, candidates: usize) -> ValidationError {
    ValidationError::AmbiguousItem {
        container: spec.container_name.clone(),
        name: spec.name.clone(),
        candidates,
    }
}
