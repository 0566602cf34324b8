use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{validate, ValidationError};

/// Opaque item attributes (description, enabled, ...). Carried verbatim.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A container (section) and its desired 1-based position among siblings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub target_index: u32,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, target_index: u32) -> Self {
        Self {
            name: name.into(),
            target_index,
        }
    }
}

/// An item (rule) and its desired 1-based position inside its container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    #[serde(alias = "section")]
    pub container_name: String,
    pub index_in_container: u32,
    #[serde(default)]
    pub payload: Payload,
}

impl ItemSpec {
    pub fn new(
        name: impl Into<String>,
        container_name: impl Into<String>,
        index_in_container: u32,
    ) -> Self {
        Self {
            name: name.into(),
            container_name: container_name.into(),
            index_in_container,
            payload: Payload::new(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Serialized desired-order document, as produced by the surrounding schema
/// layer. Accepts `sections` / `rules` as aliases.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredOrder {
    #[serde(default, alias = "sections")]
    pub containers: Vec<ContainerSpec>,
    #[serde(default, alias = "rules")]
    pub items: Vec<ItemSpec>,
}

impl DesiredOrder {
    /// Validate and normalize into an [`OrderModel`].
    pub fn into_model(self) -> Result<OrderModel, ValidationError> {
        OrderModel::new(self.containers, self.items)
    }
}

// ---------------------------------------------------------------------------
// OrderModel
// ---------------------------------------------------------------------------

/// A validated desired order.
///
/// Containers are held sorted by target index; items are grouped by
/// container and sorted by index. Construction is the only way to obtain
/// one, so holding an `OrderModel` proves the dense-permutation invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderModel {
    containers: Vec<ContainerSpec>,
    items: BTreeMap<String, Vec<ItemSpec>>,
}

impl OrderModel {
    pub fn new(
        mut containers: Vec<ContainerSpec>,
        items: Vec<ItemSpec>,
    ) -> Result<Self, ValidationError> {
        validate(&containers, &items)?;

        containers.sort_by_key(|c| c.target_index);

        let mut grouped: BTreeMap<String, Vec<ItemSpec>> = containers
            .iter()
            .map(|c| (c.name.clone(), Vec::new()))
            .collect();
        for item in items {
            // validate() guarantees the container exists.
            if let Some(bucket) = grouped.get_mut(&item.container_name) {
                bucket.push(item);
            }
        }
        for bucket in grouped.values_mut() {
            bucket.sort_by_key(|i| i.index_in_container);
        }

        Ok(Self {
            containers,
            items: grouped,
        })
    }

    /// Containers in desired order.
    pub fn containers(&self) -> &[ContainerSpec] {
        &self.containers
    }

    /// Items of one container in desired order (empty for unknown names).
    pub fn items_in(&self, container: &str) -> &[ItemSpec] {
        self.items
            .get(container)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All items, container by container, each in desired order.
    pub fn items(&self) -> impl Iterator<Item = &ItemSpec> {
        self.containers
            .iter()
            .flat_map(move |c| self.items_in(&c.name).iter())
    }

    pub fn item_count(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_sorts_containers_and_items() {
        let model = OrderModel::new(
            vec![ContainerSpec::new("b", 2), ContainerSpec::new("a", 1)],
            vec![
                ItemSpec::new("r2", "a", 2),
                ItemSpec::new("r1", "a", 1),
                ItemSpec::new("r3", "b", 1),
            ],
        )
        .unwrap();

        let names: Vec<_> = model.containers().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);

        let items: Vec<_> = model.items().map(|i| i.name.as_str()).collect();
        assert_eq!(items, ["r1", "r2", "r3"]);
        assert_eq!(model.item_count(), 3);
    }

    #[test]
    fn payload_passes_through_untouched() {
        let mut payload = Payload::new();
        payload.insert("enabled".into(), serde_json::Value::Bool(false));
        payload.insert("description".into(), "allow dns".into());

        let model = OrderModel::new(
            vec![ContainerSpec::new("s", 1)],
            vec![ItemSpec::new("r", "s", 1).with_payload(payload.clone())],
        )
        .unwrap();

        assert_eq!(model.items_in("s")[0].payload, payload);
    }

    #[test]
    fn container_without_items_has_empty_slice() {
        let model = OrderModel::new(vec![ContainerSpec::new("s", 1)], vec![]).unwrap();
        assert!(model.items_in("s").is_empty());
        assert!(model.items_in("nope").is_empty());
    }

    #[test]
    fn desired_order_accepts_section_rule_aliases() {
        let yaml = r#"
sections:
  - name: web
    target_index: 1
rules:
  - name: allow-http
    section: web
    index_in_container: 1
    payload:
      enabled: true
"#;
        let doc: DesiredOrder = serde_yaml::from_str(yaml).unwrap();
        let model = doc.into_model().unwrap();
        assert_eq!(model.items_in("web")[0].name, "allow-http");
        assert_eq!(
            model.items_in("web")[0].payload.get("enabled"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
