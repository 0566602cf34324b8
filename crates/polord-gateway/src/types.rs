use serde::{Deserialize, Serialize};

/// One container as currently listed by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerListing {
    pub id: String,
    pub name: String,
}

impl ContainerListing {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One item as currently listed by the backend.
///
/// `container_name` is where the item sits *now*, which can differ from
/// where the desired order wants it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListing {
    pub id: String,
    pub name: String,
    #[serde(alias = "section")]
    pub container_name: String,
}

impl ItemListing {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            container_name: container_name.into(),
        }
    }
}
