use polord_sequencer::AnchorSpec;
use serde::{Deserialize, Serialize};

/// A rule as stored by the paper backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRule {
    pub id: String,
    pub name: String,
}

/// A section and its rules, in policy order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<PaperRule>,
}

/// Serializable backend state: the full policy layout.
///
/// Used to seed a [`crate::PaperBackend`] from a JSON file and to write the
/// resulting layout back out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendState {
    #[serde(default)]
    pub sections: Vec<PaperSection>,
}

impl BackendState {
    /// Section names in policy order.
    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    /// Rule names of one section in order (empty if the section is unknown).
    pub fn rule_names(&self, section: &str) -> Vec<String> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.rules.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }
}

/// One call observed by the paper backend, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    ListContainers,
    ListItems,
    MoveContainer {
        id: String,
        anchor: AnchorSpec,
        ok: bool,
    },
    MoveItem {
        id: String,
        anchor: AnchorSpec,
        ok: bool,
    },
    Publish {
        ok: bool,
    },
}

impl RecordedCall {
    pub fn is_move(&self) -> bool {
        matches!(
            self,
            RecordedCall::MoveContainer { .. } | RecordedCall::MoveItem { .. }
        )
    }

    pub fn succeeded(&self) -> bool {
        match self {
            RecordedCall::ListContainers | RecordedCall::ListItems => true,
            RecordedCall::MoveContainer { ok, .. }
            | RecordedCall::MoveItem { ok, .. }
            | RecordedCall::Publish { ok } => *ok,
        }
    }
}
