//! polord-sequencer
//!
//! Turns a desired ordering into anchor-relative move commands.
//!
//! The backend never accepts an absolute index. It only understands
//! "put X first", "put X last" and "put X right after Y". A desired order is
//! therefore expressed as a chain: the first entity goes to a start anchor
//! and every following entity goes after the one placed before it.
//!
//! Deterministic, pure logic. No IO. No gateway calls.

mod anchor;
mod plan;

pub use anchor::{AnchorSpec, EntityKind, MoveCommand, PolicyEdge};
pub use plan::{plan, plan_minimal, EntityRef, NameToId, PlanError};
