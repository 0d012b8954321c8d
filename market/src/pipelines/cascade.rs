// galleria-market/src/pipelines/cascade.rs

//! Cascading deletes of an artwork or a user.
//!
//! The rows to remove come from a [`CascadePlan`]; `execute_plan` walks it
//! inside the run's `UnitOfWork`, so either every dependent row and the parent
//! go, or none do.

use crate::activity::{record_quietly, ActivityKind};
use crate::errors::MarketError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::CascadeCtxData;
use crate::store::{CascadePlan, CascadeReport, CascadeTarget};
use galleria_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};

pub fn build_cascade_pipeline() -> Pipeline<CascadeCtxData, MarketError> {
  let mut p = Pipeline::<CascadeCtxData, MarketError>::new(&[
    ("check_permissions", false, None),
    ("begin_transaction", false, None),
    ("locate_target", false, None),
    ("plan_cascade", false, None),
    ("execute_plan", false, None),
    ("commit_transaction", false, None),
    ("record_activity", true, None),
  ]);

  p.on("check_permissions", |ctx_data: ContextData<CascadeCtxData>| {
    Box::pin(async move {
      let (actor, target, require_owner) = {
        let guard = ctx_data.read();
        (guard.actor, guard.target, guard.require_owner)
      };

      if !require_owner && !actor.is_admin() {
        warn!(user_id = actor.user_id, ?target, "Cascade: non-admin attempted an admin delete.");
        return Err(MarketError::Auth("Administrator access required".to_string()));
      }
      if let CascadeTarget::User(user_id) = target {
        if user_id == actor.user_id {
          return Err(MarketError::validation("user_id", "You cannot delete your own account"));
        }
      }
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("begin_transaction", common_steps::begin_transaction::<CascadeCtxData>);
  p.on("locate_target", locate_target);

  p.on("plan_cascade", |ctx_data: ContextData<CascadeCtxData>| {
    Box::pin(async move {
      let (uow, target) = {
        let guard = ctx_data.read();
        (guard.uow.clone(), guard.target)
      };
      let plan = match target {
        CascadeTarget::Artwork(artwork_id) => CascadePlan::for_artwork(artwork_id),
        CascadeTarget::User(user_id) => {
          let authored = uow.tx().await?.artworks_by_artist(user_id).await?;
          CascadePlan::for_user(user_id, &authored)
        }
      };
      info!(?target, steps = plan.len(), "Cascade: plan built.");
      ctx_data.write().plan = Some(plan);
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p.on("execute_plan", execute_plan);
  p.on("commit_transaction", common_steps::commit_transaction::<CascadeCtxData>);

  p.on("record_activity", |ctx_data: ContextData<CascadeCtxData>| {
    Box::pin(async move {
      let (activity, actor, target, label, rows) = {
        let guard = ctx_data.read();
        (
          guard.activity.clone(),
          guard.actor,
          guard.target,
          guard.target_label.clone(),
          guard.report.total(),
        )
      };
      let label = label.unwrap_or_default();
      let (kind, description) = match target {
        CascadeTarget::Artwork(id) if !actor.is_admin() => {
          (ActivityKind::Delete, format!("deleted artwork '{}' (ID: {})", label, id))
        }
        CascadeTarget::Artwork(id) => (
          ActivityKind::AdminAction,
          format!("deleted artwork '{}' (ID: {}, {} rows removed)", label, id, rows),
        ),
        CascadeTarget::User(id) => (
          ActivityKind::AdminAction,
          format!("deleted user '{}' (ID: {}, {} rows removed)", label, id, rows),
        ),
      };
      record_quietly(activity.as_ref(), actor.user_id, kind, &description).await;
      Ok::<_, MarketError>(PipelineControl::Continue)
    })
  });

  p
}

/// Confirms the parent row exists and, for an artist, that it is theirs.
#[instrument(name = "cascade::locate_target", skip_all, err(Display))]
async fn locate_target(ctx_data: ContextData<CascadeCtxData>) -> Result<PipelineControl, MarketError> {
  let (uow, actor, target, require_owner) = {
    let guard = ctx_data.read();
    (guard.uow.clone(), guard.actor, guard.target, guard.require_owner)
  };

  let label = match target {
    CascadeTarget::Artwork(artwork_id) => {
      let artwork = uow.tx().await?.artwork(artwork_id).await?;
      match artwork {
        Some(artwork) if !require_owner || artwork.artist_id == actor.user_id => artwork.title,
        Some(_) => {
          warn!(user_id = actor.user_id, artwork_id, "Cascade: artwork belongs to another artist.");
          return Err(MarketError::not_found(format!("Artwork {} not found", artwork_id)));
        }
        None => return Err(MarketError::not_found(format!("Artwork {} not found", artwork_id))),
      }
    }
    CascadeTarget::User(user_id) => {
      if !uow.tx().await?.user_exists(user_id).await? {
        return Err(MarketError::not_found("User not found"));
      }
      format!("user #{}", user_id)
    }
  };

  ctx_data.write().target_label = Some(label);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "cascade::execute_plan", skip_all, err(Display))]
async fn execute_plan(ctx_data: ContextData<CascadeCtxData>) -> Result<PipelineControl, MarketError> {
  let (uow, plan) = {
    let guard = ctx_data.read();
    (guard.uow.clone(), guard.plan.clone())
  };
  let plan = plan.ok_or_else(|| MarketError::Internal("cascade plan missing".to_string()))?;

  let mut report = CascadeReport::default();
  {
    let mut tx = uow.tx().await?;
    for step in plan.steps() {
      let rows = tx.delete_related(step.relation, step.link, step.parent_id).await?;
      report.record(step.relation, rows);
    }
  }

  info!(rows = report.total(), "Cascade: plan executed.");
  ctx_data.write().report = report;
  Ok(PipelineControl::Continue)
}

pub fn register_cascade_pipeline(registry: &FlowRegistry<MarketError>) {
  registry.register(build_cascade_pipeline());
  info!("Cascade pipeline registered.");
}
