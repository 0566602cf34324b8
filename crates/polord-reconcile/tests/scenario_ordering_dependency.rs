//! Containers [B, A, C] with no items produce exactly one chained command
//! per container: the first goes to the start anchor, each next one goes
//! after the previous id.

use polord_gateway::RunContext;
use polord_model::ContainerSpec;
use polord_paper::{PaperBackend, RecordedCall};
use polord_reconcile::{Reconciler, ReconcilerSettings};
use polord_sequencer::{AnchorSpec, PolicyEdge};

fn desired_bac() -> Vec<ContainerSpec> {
    vec![
        ContainerSpec::new("B", 1),
        ContainerSpec::new("A", 2),
        ContainerSpec::new("C", 3),
    ]
}

fn moved(id: &str, anchor: AnchorSpec) -> RecordedCall {
    RecordedCall::MoveContainer {
        id: id.to_string(),
        anchor,
        ok: true,
    }
}

#[tokio::test]
async fn scenario_bac_chains_from_first_in_policy() {
    let pb = PaperBackend::seeded(&[("A", &[]), ("B", &[]), ("C", &[])]);
    let rec = Reconciler::new(pb, ReconcilerSettings::default());

    let snap = rec
        .reconcile(&RunContext::new(), desired_bac(), vec![], None)
        .await
        .unwrap();

    assert_eq!(
        rec.gateway().move_calls(),
        vec![
            moved("s:B", AnchorSpec::FirstInPolicy),
            moved("s:A", AnchorSpec::AfterContainer("s:B".into())),
            moved("s:C", AnchorSpec::AfterContainer("s:A".into())),
        ]
    );
    assert_eq!(rec.gateway().section_names(), ["B", "A", "C"]);
    assert_eq!(rec.gateway().publish_count(), 1);

    assert_eq!(snap.container("B").unwrap().id, "s:B");
    assert_eq!(snap.container("A").unwrap().index, 2);
}

#[tokio::test]
async fn scenario_bac_chains_from_start_after_anchor() {
    let pb = PaperBackend::seeded(&[("A", &[]), ("X", &[]), ("B", &[]), ("C", &[])]);
    let rec = Reconciler::new(pb, ReconcilerSettings::default());

    rec.reconcile(&RunContext::new(), desired_bac(), vec![], Some("s:X"))
        .await
        .unwrap();

    let calls = rec.gateway().move_calls();
    assert_eq!(calls[0], moved("s:B", AnchorSpec::AfterContainer("s:X".into())));
    assert_eq!(calls.len(), 3);
    assert_eq!(rec.gateway().section_names(), ["X", "B", "A", "C"]);
}

#[tokio::test]
async fn scenario_default_placement_last_pins_block_to_policy_end() {
    let pb = PaperBackend::seeded(&[("A", &[]), ("B", &[]), ("Z", &[]), ("C", &[])]);
    let settings = ReconcilerSettings {
        default_placement: PolicyEdge::Last,
        ..ReconcilerSettings::default()
    };
    let rec = Reconciler::new(pb, settings);

    rec.reconcile(&RunContext::new(), desired_bac(), vec![], None)
        .await
        .unwrap();

    assert_eq!(
        rec.gateway().move_calls()[0],
        moved("s:B", AnchorSpec::LastInPolicy)
    );
    assert_eq!(rec.gateway().section_names(), ["Z", "B", "A", "C"]);
}
