use std::fmt;

use thiserror::Error;

/// Which index sequence a validation failure refers to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    /// The top-level sequence of containers.
    Containers,
    /// The item sequence inside one container.
    Items { container: String },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Containers => write!(f, "containers"),
            Scope::Items { container } => write!(f, "items of container '{container}'"),
        }
    }
}

/// Malformed desired order.
///
/// Every variant is raised before any backend mutation, so the caller can
/// correct the input and retry with zero remote effect.
///
/// The resolution variants (`AnchorNotFound`, `AnchorIsManaged`,
/// `ContainerNotFound`, `AmbiguousContainer`, `ItemNotFound`,
/// `AmbiguousItem`) are produced by the reconciler once the
/// backend listing is known; they live here so one type covers every
/// "fix your input" outcome.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate index {index} in {scope}")]
    DuplicateIndex { scope: Scope, index: u32 },

    #[error("gap in {scope}: index {missing} missing from 1..={count}")]
    GapInSequence {
        scope: Scope,
        missing: u32,
        count: usize,
    },

    /// Indices are 1-based; zero is never valid.
    #[error("index {index} out of range in {scope} (expected 1..={count})")]
    IndexOutOfRange {
        scope: Scope,
        index: u32,
        count: usize,
    },

    #[error("duplicate name '{name}' in {scope}")]
    DuplicateName { scope: Scope, name: String },

    #[error("item '{item}' references unknown container '{container}'")]
    UnknownContainer { item: String, container: String },

    #[error("start-after anchor '{id}' not present in backend listing")]
    AnchorNotFound { id: String },

    #[error("start-after anchor '{id}' is itself a container being ordered")]
    AnchorIsManaged { id: String },

    #[error("container '{name}' not present in backend listing")]
    ContainerNotFound { name: String },

    #[error("container '{name}' matches {candidates} backend containers")]
    AmbiguousContainer { name: String, candidates: usize },

    #[error("item '{name}' (container '{container}') not present in backend listing")]
    ItemNotFound { container: String, name: String },

    #[error("item '{name}' for container '{container}' matches {candidates} backend items")]
    AmbiguousItem {
        container: String,
        name: String,
        candidates: usize,
    },
}
