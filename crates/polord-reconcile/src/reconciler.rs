//! Reconciliation run orchestration.
//!
//! # Design
//!
//! ```text
//! reconcile(ctx, containers, items, start_after)
//!   ├─ Validating   OrderModel::new                      (no gateway calls)
//!   ├─ Resolving    try_join!(list_containers, list_items) → name → id
//!   ├─ Planning     container chain, then one item chain per container
//!   ├─ Executing    one command at a time, cancel checked before each
//!   ├─ Publishing   publish once
//!   └─ Done         ResultSnapshot
//! ```
//!
//! Commands are never issued concurrently: command `k` is only valid once
//! commands `0..k` have landed. The engine never guesses at remote state
//! after a failure; it reports how many moves landed and stops.

use polord_gateway::{
    BackendGateway, GatewayClient, GatewayError, GatewayOp, RunContext,
};
use polord_model::{ContainerSpec, ItemSpec, OrderModel};
use polord_sequencer::{
    plan, plan_minimal, AnchorSpec, EntityKind, EntityRef, MoveCommand, NameToId, PlanError,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::resolve::{resolve, Resolved};
use crate::{
    PlacedEntity, PlanMode, ReconcileError, ReconcilerSettings, ResultSnapshot, RunPhase,
    RunState,
};

/// Output of a dry run: the commands a real run would issue, in order, and
/// the snapshot it would return.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub commands: Vec<MoveCommand>,
    pub snapshot: ResultSnapshot,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn container_moves(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| c.kind == EntityKind::Container)
            .count()
    }

    pub fn item_moves(&self) -> usize {
        self.commands.len() - self.container_moves()
    }
}

pub struct Reconciler<G: BackendGateway> {
    client: GatewayClient<G>,
    settings: ReconcilerSettings,
}

impl<G: BackendGateway> Reconciler<G> {
    pub fn new(gateway: G, settings: ReconcilerSettings) -> Self {
        Self {
            client: GatewayClient::new(gateway, settings.call_timeout),
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    pub fn gateway(&self) -> &G {
        self.client.inner()
    }

    /// Drive the backend to the desired order and publish.
    ///
    /// On success every listed container and item has been moved (or, in
    /// minimal mode, was already in place) and the change set is committed.
    pub async fn reconcile(
        &self,
        ctx: &RunContext,
        containers: Vec<ContainerSpec>,
        items: Vec<ItemSpec>,
        start_after: Option<&str>,
    ) -> Result<ResultSnapshot, ReconcileError> {
        let span = info_span!(
            "reconcile",
            run_id = %ctx.run_id,
            backend = self.client.backend_name(),
            plan_mode = self.settings.plan_mode.as_str(),
        );

        async move {
            let mut run = RunState::new();
            let res = self
                .run(ctx, &mut run, containers, items, start_after)
                .await;
            finish(&mut run, &res);
            res
        }
        .instrument(span)
        .await
    }

    /// Validate, resolve and plan without issuing any move or publish.
    pub async fn plan_only(
        &self,
        ctx: &RunContext,
        containers: Vec<ContainerSpec>,
        items: Vec<ItemSpec>,
        start_after: Option<&str>,
    ) -> Result<ReconcilePlan, ReconcileError> {
        let span = info_span!(
            "plan",
            run_id = %ctx.run_id,
            backend = self.client.backend_name(),
            plan_mode = self.settings.plan_mode.as_str(),
        );

        async move {
            let mut run = RunState::new();
            let res = self
                .prepare(ctx, &mut run, containers, items, start_after)
                .await;
            if res.is_ok() {
                enter(&mut run, RunPhase::Done);
            }
            finish(&mut run, &res);
            res
        }
        .instrument(span)
        .await
    }

    /// Re-issue only `publish` after a [`ReconcileError::Publish`].
    ///
    /// For gateways that keep applied-but-unpublished moves pending. Returns
    /// the snapshot unchanged on success.
    pub async fn retry_publish(
        &self,
        ctx: &RunContext,
        snapshot: ResultSnapshot,
    ) -> Result<ResultSnapshot, ReconcileError> {
        let span = info_span!("retry_publish", run_id = %ctx.run_id);
        async move {
            match self.client.publish(ctx).await {
                Ok(()) => {
                    info!("publish retried");
                    Ok(snapshot)
                }
                Err(source) => Err(ReconcileError::Publish {
                    applied_count: 0,
                    snapshot: Box::new(snapshot),
                    source,
                }),
            }
        }
        .instrument(span)
        .await
    }

    // -----------------------------------------------------------------------
    // phases
    // -----------------------------------------------------------------------

    async fn run(
        &self,
        ctx: &RunContext,
        run: &mut RunState,
        containers: Vec<ContainerSpec>,
        items: Vec<ItemSpec>,
        start_after: Option<&str>,
    ) -> Result<ResultSnapshot, ReconcileError> {
        let ReconcilePlan { commands, snapshot } = self
            .prepare(ctx, run, containers, items, start_after)
            .await?;

        enter(run, RunPhase::Executing);
        self.execute(ctx, &commands).await?;

        enter(run, RunPhase::Publishing);
        if let Err(source) = self.client.publish(ctx).await {
            return Err(ReconcileError::Publish {
                applied_count: commands.len(),
                snapshot: Box::new(snapshot),
                source,
            });
        }

        enter(run, RunPhase::Done);
        info!(
            moves = commands.len(),
            containers = snapshot.containers.len(),
            items = snapshot.item_count(),
            "reconcile complete"
        );
        Ok(snapshot)
    }

    async fn prepare(
        &self,
        ctx: &RunContext,
        run: &mut RunState,
        containers: Vec<ContainerSpec>,
        items: Vec<ItemSpec>,
        start_after: Option<&str>,
    ) -> Result<ReconcilePlan, ReconcileError> {
        enter(run, RunPhase::Validating);
        let model = OrderModel::new(containers, items)?;

        enter(run, RunPhase::Resolving);
        let (container_listing, item_listing) = tokio::try_join!(
            async {
                self.client
                    .list_containers(ctx)
                    .await
                    .map_err(|source| ReconcileError::Remote {
                        op: GatewayOp::ListContainers,
                        source,
                    })
            },
            async {
                self.client
                    .list_items(ctx)
                    .await
                    .map_err(|source| ReconcileError::Remote {
                        op: GatewayOp::ListItems,
                        source,
                    })
            },
        )?;
        let resolved = resolve(&model, &container_listing, &item_listing, start_after)?;

        enter(run, RunPhase::Planning);
        let commands = self.build_commands(&model, &resolved, start_after)?;
        debug!(
            commands = commands.len(),
            containers = model.containers().len(),
            items = model.item_count(),
            "plan built"
        );

        Ok(ReconcilePlan {
            commands,
            snapshot: build_snapshot(&model, &resolved),
        })
    }

    fn build_commands(
        &self,
        model: &OrderModel,
        resolved: &Resolved,
        start_after: Option<&str>,
    ) -> Result<Vec<MoveCommand>, PlanError> {
        let containers: Vec<EntityRef> = model
            .containers()
            .iter()
            .map(|c| EntityRef::new(c.name.clone(), c.target_index))
            .collect();
        let mut commands = self.plan_scope(
            EntityKind::Container,
            &containers,
            &resolved.container_ids,
            AnchorSpec::container_start(start_after, self.settings.default_placement),
            &resolved.current_containers,
        )?;

        let no_items = NameToId::new();
        for container in model.containers() {
            let container_id = resolved
                .container_ids
                .get(&container.name)
                .ok_or_else(|| PlanError::UnresolvedName {
                    kind: EntityKind::Container,
                    name: container.name.clone(),
                })?;
            let items: Vec<EntityRef> = model
                .items_in(&container.name)
                .iter()
                .map(|i| EntityRef::new(i.name.clone(), i.index_in_container))
                .collect();
            let current = resolved
                .current_items
                .get(&container.name)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            commands.extend(self.plan_scope(
                EntityKind::Item,
                &items,
                resolved.item_ids.get(&container.name).unwrap_or(&no_items),
                AnchorSpec::FirstInContainer(container_id.clone()),
                current,
            )?);
        }

        Ok(commands)
    }

    fn plan_scope(
        &self,
        kind: EntityKind,
        entities: &[EntityRef],
        name_to_id: &NameToId,
        start: AnchorSpec,
        current: &[String],
    ) -> Result<Vec<MoveCommand>, PlanError> {
        match self.settings.plan_mode {
            PlanMode::Full => plan(kind, entities, name_to_id, start),
            PlanMode::Minimal => plan_minimal(kind, entities, name_to_id, start, current),
        }
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        commands: &[MoveCommand],
    ) -> Result<(), ReconcileError> {
        let total = commands.len();
        for (applied_count, cmd) in commands.iter().enumerate() {
            let res = if ctx.is_cancelled() {
                Err(GatewayError::Cancelled)
            } else {
                self.apply_with_retry(ctx, cmd).await
            };

            if let Err(source) = res {
                return Err(ReconcileError::PartialApply {
                    applied_count,
                    total,
                    failed_command: cmd.clone(),
                    source,
                });
            }
        }
        Ok(())
    }

    async fn apply_with_retry(
        &self,
        ctx: &RunContext,
        cmd: &MoveCommand,
    ) -> Result<(), GatewayError> {
        let retries = if self.client.moves_are_idempotent() {
            self.settings.max_move_retries
        } else {
            0
        };

        let mut attempt = 0u32;
        loop {
            match self.client.apply(ctx, cmd).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < retries && err.is_retryable() && !ctx.is_cancelled() => {
                    attempt += 1;
                    warn!(command = %cmd, attempt, error = %err, "retrying move");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn build_snapshot(model: &OrderModel, resolved: &Resolved) -> ResultSnapshot {
    let mut snapshot = ResultSnapshot::default();

    for container in model.containers() {
        if let Some(id) = resolved.container_ids.get(&container.name) {
            snapshot.containers.insert(
                container.name.clone(),
                PlacedEntity {
                    id: id.clone(),
                    index: container.target_index,
                },
            );
        }

        let ids = resolved.item_ids.get(&container.name);
        let placed = snapshot.items.entry(container.name.clone()).or_default();
        for item in model.items_in(&container.name) {
            if let Some(id) = ids.and_then(|m| m.get(&item.name)) {
                placed.insert(
                    item.name.clone(),
                    PlacedEntity {
                        id: id.clone(),
                        index: item.index_in_container,
                    },
                );
            }
        }
    }

    snapshot
}

fn enter(run: &mut RunState, next: RunPhase) {
    if let Err(err) = run.advance(next) {
        warn!(error = %err, "run state out of sequence");
    }
}

fn finish<T>(run: &mut RunState, res: &Result<T, ReconcileError>) {
    if let Err(err) = res {
        enter(run, RunPhase::Failed(err.kind()));
        warn!(
            phase = %err.phase(),
            applied = err.applied_count(),
            pre_mutation = err.is_pre_mutation(),
            error = %err,
            "reconcile failed"
        );
    }
}
