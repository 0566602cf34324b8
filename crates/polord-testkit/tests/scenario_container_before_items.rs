//! Within one run, no rule move precedes the move of the section the rule
//! ends up in, and section moves form one contiguous chain.

use polord_gateway::RunContext;
use polord_paper::PaperBackend;
use polord_reconcile::{Reconciler, ReconcilerSettings};
use polord_sequencer::{AnchorSpec, EntityKind};
use polord_testkit::{container_moves_precede_items, desired_from_layout, move_trace};

#[tokio::test]
async fn scenario_section_moves_precede_their_rules() {
    let pb = PaperBackend::seeded(&[
        ("web", &["allow", "deny"]),
        ("db", &["read", "write"]),
        ("ops", &["ssh"]),
    ]);
    let rec = Reconciler::new(pb, ReconcilerSettings::default());

    let (containers, items) = desired_from_layout(&[
        ("ops", &["ssh", "read"]),
        ("db", &["write"]),
        ("web", &["deny", "allow"]),
    ]);

    let snapshot = rec
        .reconcile(&RunContext::new(), containers, items, None)
        .await
        .unwrap();

    let calls = rec.gateway().calls();
    container_moves_precede_items(&calls, &snapshot).unwrap();

    let trace = move_trace(&calls);
    let kinds: Vec<EntityKind> = trace.iter().map(|(k, _, _)| *k).collect();
    let first_item = kinds
        .iter()
        .position(|k| *k == EntityKind::Item)
        .unwrap();
    assert_eq!(first_item, 3);
    assert!(kinds[first_item..].iter().all(|k| *k == EntityKind::Item));

    // Each section's rule chain opens at the top of that section.
    assert_eq!(
        trace[3],
        (
            EntityKind::Item,
            "r:ops:ssh".to_string(),
            AnchorSpec::FirstInContainer("s:ops".into())
        )
    );
    assert_eq!(
        trace[4],
        (
            EntityKind::Item,
            "r:db:read".to_string(),
            AnchorSpec::AfterItem("r:ops:ssh".into())
        )
    );

    assert_eq!(rec.gateway().rule_names("ops"), ["ssh", "read"]);
    assert_eq!(snapshot.item("ops", "read").unwrap().id, "r:db:read");
}
