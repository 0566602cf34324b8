use std::fmt;

use serde::{Deserialize, Serialize};

/// Which level of the two-level hierarchy a command repositions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Container,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Container => write!(f, "container"),
            EntityKind::Item => write!(f, "item"),
        }
    }
}

/// Default edge of the policy a managed block of containers is pinned to
/// when no start-after anchor is supplied.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEdge {
    #[default]
    First,
    Last,
}

/// Relative position understood by the backend.
///
/// Wire shape: `{"position": "AFTER_SECTION", "ref": "<id>"}`; `ref` is
/// omitted for the two policy-edge variants. A `ref` is always a resolved
/// backend id, never a name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "position", content = "ref")]
pub enum AnchorSpec {
    #[serde(rename = "FIRST_IN_POLICY")]
    FirstInPolicy,
    #[serde(rename = "LAST_IN_POLICY")]
    LastInPolicy,
    #[serde(rename = "AFTER_SECTION")]
    AfterContainer(String),
    #[serde(rename = "FIRST_IN_SECTION")]
    FirstInContainer(String),
    #[serde(rename = "AFTER_RULE")]
    AfterItem(String),
}

impl AnchorSpec {
    /// Start anchor for the top-level container chain.
    ///
    /// An explicit start-after id wins over the configured policy edge.
    pub fn container_start(start_after: Option<&str>, edge: PolicyEdge) -> Self {
        match (start_after, edge) {
            (Some(id), _) => AnchorSpec::AfterContainer(id.to_string()),
            (None, PolicyEdge::First) => AnchorSpec::FirstInPolicy,
            (None, PolicyEdge::Last) => AnchorSpec::LastInPolicy,
        }
    }

    /// Chaining anchor: directly after the entity of `kind` with `id`.
    pub fn after(kind: EntityKind, id: impl Into<String>) -> Self {
        match kind {
            EntityKind::Container => AnchorSpec::AfterContainer(id.into()),
            EntityKind::Item => AnchorSpec::AfterItem(id.into()),
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            AnchorSpec::FirstInPolicy => "FIRST_IN_POLICY",
            AnchorSpec::LastInPolicy => "LAST_IN_POLICY",
            AnchorSpec::AfterContainer(_) => "AFTER_SECTION",
            AnchorSpec::FirstInContainer(_) => "FIRST_IN_SECTION",
            AnchorSpec::AfterItem(_) => "AFTER_RULE",
        }
    }

    /// The referenced id, if this anchor references one.
    pub fn reference(&self) -> Option<&str> {
        match self {
            AnchorSpec::FirstInPolicy | AnchorSpec::LastInPolicy => None,
            AnchorSpec::AfterContainer(id)
            | AnchorSpec::FirstInContainer(id)
            | AnchorSpec::AfterItem(id) => Some(id),
        }
    }
}

impl fmt::Display for AnchorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reference() {
            Some(id) => write!(f, "{}({id})", self.wire_name()),
            None => write!(f, "{}", self.wire_name()),
        }
    }
}

/// One relative move. Immutable once created; correctness of command `k`
/// assumes commands `0..k` have already been applied by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveCommand {
    pub target_id: String,
    pub anchor: AnchorSpec,
    pub kind: EntityKind,
}

impl MoveCommand {
    pub fn container(target_id: impl Into<String>, anchor: AnchorSpec) -> Self {
        Self {
            target_id: target_id.into(),
            anchor,
            kind: EntityKind::Container,
        }
    }

    pub fn item(target_id: impl Into<String>, anchor: AnchorSpec) -> Self {
        Self {
            target_id: target_id.into(),
            anchor,
            kind: EntityKind::Item,
        }
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntityKind::Container => write!(f, "MoveContainer({}, {})", self.target_id, self.anchor),
            EntityKind::Item => write!(f, "MoveItem({}, {})", self.target_id, self.anchor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_for_referencing_anchor() {
        let v = serde_json::to_value(AnchorSpec::AfterContainer("s-1".into())).unwrap();
        assert_eq!(v, json!({"position": "AFTER_SECTION", "ref": "s-1"}));
    }

    #[test]
    fn wire_shape_for_edge_anchor_has_no_ref() {
        let v = serde_json::to_value(AnchorSpec::FirstInPolicy).unwrap();
        assert_eq!(v, json!({"position": "FIRST_IN_POLICY"}));
    }

    #[test]
    fn wire_shape_parses_back() {
        let a: AnchorSpec =
            serde_json::from_value(json!({"position": "AFTER_RULE", "ref": "r-9"})).unwrap();
        assert_eq!(a, AnchorSpec::AfterItem("r-9".into()));
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(AnchorSpec::LastInPolicy.to_string(), "LAST_IN_POLICY");
        assert_eq!(
            AnchorSpec::FirstInContainer("s".into()).to_string(),
            "FIRST_IN_SECTION(s)"
        );
        assert_eq!(
            MoveCommand::item("r1", AnchorSpec::AfterItem("r0".into())).to_string(),
            "MoveItem(r1, AFTER_RULE(r0))"
        );
    }

    #[test]
    fn start_after_wins_over_edge() {
        assert_eq!(
            AnchorSpec::container_start(Some("x"), PolicyEdge::Last),
            AnchorSpec::AfterContainer("x".into())
        );
        assert_eq!(
            AnchorSpec::container_start(None, PolicyEdge::Last),
            AnchorSpec::LastInPolicy
        );
        assert_eq!(
            AnchorSpec::container_start(None, PolicyEdge::First),
            AnchorSpec::FirstInPolicy
        );
    }
}
