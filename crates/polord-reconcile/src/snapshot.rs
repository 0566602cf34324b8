use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where one entity was placed: its stable id and its 1-based index within
/// its scope (policy for containers, container for items).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub id: String,
    pub index: u32,
}

/// Result of a reconciliation run; the only artifact that outlives it.
///
/// Items are keyed by container then item name, since item names are only
/// unique within their container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub containers: BTreeMap<String, PlacedEntity>,
    pub items: BTreeMap<String, BTreeMap<String, PlacedEntity>>,
}

impl ResultSnapshot {
    pub fn container(&self, name: &str) -> Option<&PlacedEntity> {
        self.containers.get(name)
    }

    pub fn item(&self, container: &str, name: &str) -> Option<&PlacedEntity> {
        self.items.get(container).and_then(|m| m.get(name))
    }

    /// `(container, item, placement)` for every item.
    pub fn iter_items(&self) -> impl Iterator<Item = (&str, &str, &PlacedEntity)> {
        self.items.iter().flat_map(|(c, m)| {
            m.iter()
                .map(move |(n, p)| (c.as_str(), n.as_str(), p))
        })
    }

    pub fn item_count(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }
}
