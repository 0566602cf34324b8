//! Deterministic in-memory "paper" policy backend.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - Sections and rules live in ordered `Vec`s; listing order is storage order.
//! - Moves are remove-then-insert relative to the anchor, so re-issuing
//!   "X after Y" when X already follows Y leaves the layout unchanged.
//! - A move whose anchor does not exist fails with `NotFound` and leaves the
//!   layout untouched.
//! - `publish` snapshots the current layout as the committed layout.
//! - Every call is recorded in arrival order for assertions.
//!
//! Fault injection (for scenario tests):
//! - [`PaperBackend::fail_move_at`]: the n-th move call (1-based) fails.
//! - [`PaperBackend::fail_next_publish`]: the next publish fails.
//! - [`PaperBackend::fail_listings`]: listing calls fail.
//! - [`PaperBackend::cancel_after_moves`]: cancel the run token after n
//!   successful moves.
//! - [`PaperBackend::with_move_delay`]: every move sleeps first.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use polord_gateway::{BackendGateway, ContainerListing, GatewayError, ItemListing, RunContext};
use polord_sequencer::AnchorSpec;
use tracing::debug;

pub mod types;

pub use types::{BackendState, PaperRule, PaperSection, RecordedCall};

#[derive(Debug, Default)]
struct Inner {
    layout: BackendState,
    committed: Option<BackendState>,
    calls: Vec<RecordedCall>,
    move_attempts: usize,
    successful_moves: usize,
    move_faults: BTreeMap<usize, GatewayError>,
    publish_faults: VecDeque<GatewayError>,
    listing_fault: Option<GatewayError>,
    cancel_after: Option<usize>,
}

#[derive(Debug)]
pub struct PaperBackend {
    inner: Mutex<Inner>,
    idempotent: bool,
    move_delay: Option<Duration>,
}

impl Default for PaperBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperBackend {
    /// Empty policy. Moves are idempotent.
    pub fn new() -> Self {
        Self::from_state(BackendState::default())
    }

    pub fn from_state(state: BackendState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                layout: state,
                ..Default::default()
            }),
            idempotent: true,
            move_delay: None,
        }
    }

    /// Build a layout from `(section, [rules])` pairs with derived ids:
    /// sections get `s:<name>`, rules get `r:<section>:<name>`.
    pub fn seeded(layout: &[(&str, &[&str])]) -> Self {
        let sections = layout
            .iter()
            .map(|(section, rules)| PaperSection {
                id: format!("s:{section}"),
                name: section.to_string(),
                rules: rules
                    .iter()
                    .map(|r| PaperRule {
                        id: format!("r:{section}:{r}"),
                        name: r.to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self::from_state(BackendState { sections })
    }

    /// Advertise moves as non-idempotent, disabling reconciler retries.
    pub fn with_idempotent_moves(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    pub fn with_move_delay(mut self, delay: Duration) -> Self {
        self.move_delay = Some(delay);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- fault injection ----------------------------------------------------

    /// Make the `nth` move call (1-based, counting every attempt) fail.
    pub fn fail_move_at(&self, nth: usize, err: GatewayError) {
        self.lock().move_faults.insert(nth, err);
    }

    pub fn fail_next_publish(&self, err: GatewayError) {
        self.lock().publish_faults.push_back(err);
    }

    /// Make listing calls fail until cleared with `None`.
    pub fn fail_listings(&self, err: Option<GatewayError>) {
        self.lock().listing_fault = err;
    }

    /// Cancel the caller's run token once `n` moves have succeeded.
    pub fn cancel_after_moves(&self, n: usize) {
        self.lock().cancel_after = Some(n);
    }

    // -- inspection ---------------------------------------------------------

    pub fn state(&self) -> BackendState {
        self.lock().layout.clone()
    }

    /// Layout as of the last successful publish.
    pub fn committed(&self) -> Option<BackendState> {
        self.lock().committed.clone()
    }

    pub fn section_names(&self) -> Vec<String> {
        self.lock().layout.section_names()
    }

    pub fn rule_names(&self, section: &str) -> Vec<String> {
        self.lock().layout.rule_names(section)
    }

    pub fn section_id(&self, name: &str) -> Option<String> {
        self.lock()
            .layout
            .sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id.clone())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Recorded move calls only, successful or not.
    pub fn move_calls(&self) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_move())
            .cloned()
            .collect()
    }

    pub fn successful_moves(&self) -> usize {
        self.lock().successful_moves
    }

    pub fn publish_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Publish { ok: true }))
            .count()
    }

    pub fn clear_calls(&self) {
        let mut inner = self.lock();
        inner.calls.clear();
        inner.move_attempts = 0;
        inner.successful_moves = 0;
    }

    // -- move mechanics -----------------------------------------------------

    async fn before_move(&self) {
        if let Some(delay) = self.move_delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Count the attempt and return an injected fault, if any.
    fn take_fault(inner: &mut Inner) -> Option<GatewayError> {
        inner.move_attempts += 1;
        let nth = inner.move_attempts;
        inner.move_faults.remove(&nth)
    }

    fn after_success(inner: &mut Inner, ctx: &RunContext) {
        inner.successful_moves += 1;
        if inner.cancel_after == Some(inner.successful_moves) {
            ctx.cancel.cancel();
        }
    }
}

fn place_section(
    layout: &mut BackendState,
    id: &str,
    anchor: &AnchorSpec,
) -> Result<(), GatewayError> {
    let from = layout
        .sections
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| GatewayError::NotFound { id: id.to_string() })?;

    if anchor.reference() == Some(id) {
        // "X after X": already there.
        return Ok(());
    }

    // Validate the anchor before touching the layout.
    match anchor {
        AnchorSpec::FirstInPolicy | AnchorSpec::LastInPolicy => {}
        AnchorSpec::AfterContainer(r) => {
            if !layout.sections.iter().any(|s| &s.id == r) {
                return Err(GatewayError::NotFound { id: r.clone() });
            }
        }
        AnchorSpec::FirstInContainer(_) | AnchorSpec::AfterItem(_) => {
            return Err(GatewayError::Api {
                code: Some(400),
                message: format!("anchor {anchor} is not valid for a section move"),
            });
        }
    }

    let section = layout.sections.remove(from);
    let to = match anchor {
        AnchorSpec::FirstInPolicy => 0,
        AnchorSpec::LastInPolicy => layout.sections.len(),
        AnchorSpec::AfterContainer(r) => {
            // Checked above; still present after removing a different id.
            layout
                .sections
                .iter()
                .position(|s| &s.id == r)
                .map(|p| p + 1)
                .unwrap_or(layout.sections.len())
        }
        AnchorSpec::FirstInContainer(_) | AnchorSpec::AfterItem(_) => from,
    };
    layout.sections.insert(to, section);
    Ok(())
}

fn find_rule(layout: &BackendState, id: &str) -> Option<(usize, usize)> {
    layout.sections.iter().enumerate().find_map(|(si, s)| {
        s.rules
            .iter()
            .position(|r| r.id == id)
            .map(|ri| (si, ri))
    })
}

fn place_rule(
    layout: &mut BackendState,
    id: &str,
    anchor: &AnchorSpec,
) -> Result<(), GatewayError> {
    let (from_s, from_r) =
        find_rule(layout, id).ok_or_else(|| GatewayError::NotFound { id: id.to_string() })?;

    if anchor.reference() == Some(id) {
        return Ok(());
    }

    match anchor {
        AnchorSpec::FirstInContainer(sid) => {
            if !layout.sections.iter().any(|s| &s.id == sid) {
                return Err(GatewayError::NotFound { id: sid.clone() });
            }
        }
        AnchorSpec::AfterItem(rid) => {
            if find_rule(layout, rid).is_none() {
                return Err(GatewayError::NotFound { id: rid.clone() });
            }
        }
        AnchorSpec::FirstInPolicy | AnchorSpec::LastInPolicy | AnchorSpec::AfterContainer(_) => {
            return Err(GatewayError::Api {
                code: Some(400),
                message: format!("anchor {anchor} is not valid for a rule move"),
            });
        }
    }

    let rule = layout.sections[from_s].rules.remove(from_r);
    let (to_s, to_r) = match anchor {
        AnchorSpec::FirstInContainer(sid) => {
            let si = layout
                .sections
                .iter()
                .position(|s| &s.id == sid)
                .unwrap_or(from_s);
            (si, 0)
        }
        AnchorSpec::AfterItem(rid) => find_rule(layout, rid)
            .map(|(si, ri)| (si, ri + 1))
            .unwrap_or((from_s, from_r)),
        _ => (from_s, from_r),
    };
    layout.sections[to_s].rules.insert(to_r, rule);
    Ok(())
}

#[async_trait]
impl BackendGateway for PaperBackend {
    fn name(&self) -> &str {
        "paper"
    }

    fn moves_are_idempotent(&self) -> bool {
        self.idempotent
    }

    async fn list_containers(&self, _ctx: &RunContext) -> Result<Vec<ContainerListing>, GatewayError> {
        let mut inner = self.lock();
        inner.calls.push(RecordedCall::ListContainers);
        if let Some(err) = inner.listing_fault.clone() {
            return Err(err);
        }
        Ok(inner
            .layout
            .sections
            .iter()
            .map(|s| ContainerListing::new(s.id.clone(), s.name.clone()))
            .collect())
    }

    async fn list_items(&self, _ctx: &RunContext) -> Result<Vec<ItemListing>, GatewayError> {
        let mut inner = self.lock();
        inner.calls.push(RecordedCall::ListItems);
        if let Some(err) = inner.listing_fault.clone() {
            return Err(err);
        }
        Ok(inner
            .layout
            .sections
            .iter()
            .flat_map(|s| {
                s.rules
                    .iter()
                    .map(move |r| ItemListing::new(r.id.clone(), r.name.clone(), s.name.clone()))
            })
            .collect())
    }

    async fn move_container(
        &self,
        ctx: &RunContext,
        id: &str,
        anchor: &AnchorSpec,
    ) -> Result<(), GatewayError> {
        self.before_move().await;
        let mut inner = self.lock();
        let res = match Self::take_fault(&mut inner) {
            Some(err) => Err(err),
            None => place_section(&mut inner.layout, id, anchor),
        };
        inner.calls.push(RecordedCall::MoveContainer {
            id: id.to_string(),
            anchor: anchor.clone(),
            ok: res.is_ok(),
        });
        if res.is_ok() {
            Self::after_success(&mut inner, ctx);
        }
        debug!(id, %anchor, ok = res.is_ok(), "paper move_container");
        res
    }

    async fn move_item(
        &self,
        ctx: &RunContext,
        id: &str,
        anchor: &AnchorSpec,
    ) -> Result<(), GatewayError> {
        self.before_move().await;
        let mut inner = self.lock();
        let res = match Self::take_fault(&mut inner) {
            Some(err) => Err(err),
            None => place_rule(&mut inner.layout, id, anchor),
        };
        inner.calls.push(RecordedCall::MoveItem {
            id: id.to_string(),
            anchor: anchor.clone(),
            ok: res.is_ok(),
        });
        if res.is_ok() {
            Self::after_success(&mut inner, ctx);
        }
        debug!(id, %anchor, ok = res.is_ok(), "paper move_item");
        res
    }

    async fn publish(&self, _ctx: &RunContext) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        let res = match inner.publish_faults.pop_front() {
            Some(err) => Err(err),
            None => {
                inner.committed = Some(inner.layout.clone());
                Ok(())
            }
        };
        inner.calls.push(RecordedCall::Publish { ok: res.is_ok() });
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor_after_section(id: &str) -> AnchorSpec {
        AnchorSpec::AfterContainer(id.to_string())
    }

    #[tokio::test]
    async fn section_moves_are_relative() {
        let pb = PaperBackend::seeded(&[("a", &[]), ("b", &[]), ("c", &[])]);
        let ctx = RunContext::new();

        pb.move_container(&ctx, "s:c", &AnchorSpec::FirstInPolicy)
            .await
            .unwrap();
        assert_eq!(pb.section_names(), ["c", "a", "b"]);

        pb.move_container(&ctx, "s:c", &anchor_after_section("s:b"))
            .await
            .unwrap();
        assert_eq!(pb.section_names(), ["a", "b", "c"]);

        pb.move_container(&ctx, "s:a", &AnchorSpec::LastInPolicy)
            .await
            .unwrap();
        assert_eq!(pb.section_names(), ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn repeated_move_is_a_no_op() {
        let pb = PaperBackend::seeded(&[("a", &[]), ("b", &[])]);
        let ctx = RunContext::new();
        for _ in 0..3 {
            pb.move_container(&ctx, "s:a", &anchor_after_section("s:b"))
                .await
                .unwrap();
        }
        assert_eq!(pb.section_names(), ["b", "a"]);
    }

    #[tokio::test]
    async fn rule_can_move_across_sections() {
        let pb = PaperBackend::seeded(&[("a", &["x", "y"]), ("b", &["z"])]);
        let ctx = RunContext::new();

        pb.move_item(&ctx, "r:a:y", &AnchorSpec::FirstInContainer("s:b".into()))
            .await
            .unwrap();
        assert_eq!(pb.rule_names("a"), ["x"]);
        assert_eq!(pb.rule_names("b"), ["y", "z"]);

        pb.move_item(&ctx, "r:a:x", &AnchorSpec::AfterItem("r:b:z".into()))
            .await
            .unwrap();
        assert!(pb.rule_names("a").is_empty());
        assert_eq!(pb.rule_names("b"), ["y", "z", "x"]);
    }

    #[tokio::test]
    async fn missing_anchor_leaves_layout_untouched() {
        let pb = PaperBackend::seeded(&[("a", &["x"]), ("b", &[])]);
        let ctx = RunContext::new();

        let err = pb
            .move_container(&ctx, "s:a", &anchor_after_section("nope"))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NotFound { id: "nope".into() });
        assert_eq!(pb.section_names(), ["a", "b"]);

        let err = pb
            .move_item(&ctx, "r:a:x", &AnchorSpec::FirstInPolicy)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Api { .. }));
        assert_eq!(pb.rule_names("a"), ["x"]);
        assert_eq!(pb.successful_moves(), 0);
        assert_eq!(pb.move_calls().len(), 2);
    }

    #[tokio::test]
    async fn injected_move_fault_fires_once_on_nth_attempt() {
        let pb = PaperBackend::seeded(&[("a", &[]), ("b", &[])]);
        let ctx = RunContext::new();
        pb.fail_move_at(2, GatewayError::Transport("reset".into()));

        assert!(pb.move_container(&ctx, "s:b", &AnchorSpec::FirstInPolicy).await.is_ok());
        assert!(pb.move_container(&ctx, "s:a", &AnchorSpec::FirstInPolicy).await.is_err());
        assert!(pb.move_container(&ctx, "s:a", &AnchorSpec::FirstInPolicy).await.is_ok());
        assert_eq!(pb.successful_moves(), 2);
        assert_eq!(pb.section_names(), ["a", "b"]);
    }

    #[tokio::test]
    async fn publish_commits_layout() {
        let pb = PaperBackend::seeded(&[("a", &[]), ("b", &[])]);
        let ctx = RunContext::new();
        pb.fail_next_publish(GatewayError::Transport("down".into()));

        assert!(pb.publish(&ctx).await.is_err());
        assert!(pb.committed().is_none());

        pb.move_container(&ctx, "s:b", &AnchorSpec::FirstInPolicy)
            .await
            .unwrap();
        pb.publish(&ctx).await.unwrap();
        assert_eq!(pb.committed().unwrap().section_names(), ["b", "a"]);
        assert_eq!(pb.publish_count(), 1);
    }

    #[tokio::test]
    async fn listings_follow_storage_order() {
        let pb = PaperBackend::seeded(&[("b", &["2", "1"]), ("a", &["3"])]);
        let ctx = RunContext::new();
        let cs = pb.list_containers(&ctx).await.unwrap();
        let is = pb.list_items(&ctx).await.unwrap();
        assert_eq!(cs[0], ContainerListing::new("s:b", "b"));
        let names: Vec<_> = is.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["2", "1", "3"]);
        assert_eq!(is[2].container_name, "a");
    }

    #[test]
    fn state_round_trips_through_json() {
        let raw = r#"{"sections":[{"id":"1","name":"web","rules":[{"id":"10","name":"allow"}]}]}"#;
        let state: BackendState = serde_json::from_str(raw).unwrap();
        let pb = PaperBackend::from_state(state.clone());
        assert_eq!(pb.state(), state);
        assert_eq!(pb.section_id("web").as_deref(), Some("1"));
    }
}
