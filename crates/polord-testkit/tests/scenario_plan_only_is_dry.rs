//! A dry run resolves and plans against live listings but never moves or
//! publishes; a real run then issues exactly the planned commands.

use polord_gateway::RunContext;
use polord_paper::PaperBackend;
use polord_reconcile::{Reconciler, ReconcilerSettings};
use polord_testkit::{desired_from_layout, move_trace};

#[tokio::test]
async fn scenario_plan_matches_executed_moves() {
    let pb = PaperBackend::seeded(&[("x", &["p", "q"]), ("y", &["r"])]);
    let rec = Reconciler::new(pb, ReconcilerSettings::default());
    let (cs, is) = desired_from_layout(&[("y", &["r"]), ("x", &["q", "p"])]);

    let plan = rec
        .plan_only(&RunContext::new(), cs.clone(), is.clone(), None)
        .await
        .unwrap();

    assert!(rec.gateway().move_calls().is_empty());
    assert_eq!(rec.gateway().publish_count(), 0);
    assert_eq!(plan.container_moves(), 2);
    assert_eq!(plan.item_moves(), 3);

    let snapshot = rec
        .reconcile(&RunContext::new(), cs, is, None)
        .await
        .unwrap();

    let executed = move_trace(&rec.gateway().calls());
    let planned: Vec<_> = plan
        .commands
        .iter()
        .map(|c| (c.kind, c.target_id.clone(), c.anchor.clone()))
        .collect();
    assert_eq!(executed, planned);
    assert_eq!(snapshot, plan.snapshot);
}
