use anyhow::{Context, Result};
use polord_gateway::RunContext;
use polord_paper::PaperBackend;
use polord_reconcile::Reconciler;
use std::fs;

use super::RunInputs;

pub async fn run_plan(inputs: RunInputs) -> Result<()> {
    let RunInputs {
        desired,
        state,
        settings,
        config_hash,
        start_after,
        ..
    } = inputs;

    let reconciler = Reconciler::new(PaperBackend::from_state(state), settings.reconcile);
    let ctx = RunContext::new();

    let plan = reconciler
        .plan_only(&ctx, desired.containers, desired.items, start_after.as_deref())
        .await
        .context("plan failed")?;

    if let Some(hash) = config_hash {
        println!("config_hash={hash}");
    }
    println!("run_id={}", ctx.run_id);
    for cmd in &plan.commands {
        println!("{cmd}");
    }
    println!(
        "moves={} container_moves={} item_moves={}",
        plan.commands.len(),
        plan.container_moves(),
        plan.item_moves()
    );
    Ok(())
}

pub async fn run_apply(inputs: RunInputs, write_state: bool) -> Result<()> {
    let RunInputs {
        desired,
        state,
        state_path,
        settings,
        config_hash,
        start_after,
    } = inputs;

    let reconciler = Reconciler::new(PaperBackend::from_state(state), settings.reconcile);
    let ctx = RunContext::new();

    let snapshot = reconciler
        .reconcile(&ctx, desired.containers, desired.items, start_after.as_deref())
        .await
        .context("apply failed")?;

    let backend = reconciler.gateway();
    if write_state {
        let out = serde_json::to_string_pretty(&backend.state())
            .context("serialize backend state failed")?;
        fs::write(&state_path, out)
            .with_context(|| format!("write state failed: {}", state_path.display()))?;
    }

    if let Some(hash) = config_hash {
        println!("config_hash={hash}");
    }
    println!("run_id={}", ctx.run_id);
    println!("moves_applied={}", backend.successful_moves());
    println!("published=true");
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("serialize snapshot failed")?
    );
    Ok(())
}
