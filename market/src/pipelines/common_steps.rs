// galleria-market/src/pipelines/common_steps.rs

//! Steps shared by every transactional pipeline.

use crate::errors::MarketError;
use crate::pipelines::contexts::Transactional;
use galleria_flow::{ContextData, PipelineControl};
use tracing::instrument;

#[instrument(name = "common_step::begin_transaction", skip_all, err(Display))]
pub async fn begin_transaction<T: Transactional>(ctx_data: ContextData<T>) -> Result<PipelineControl, MarketError> {
  let uow = ctx_data.read().unit_of_work().clone();
  uow.begin().await?;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "common_step::commit_transaction", skip_all, err(Display))]
pub async fn commit_transaction<T: Transactional>(ctx_data: ContextData<T>) -> Result<PipelineControl, MarketError> {
  let uow = ctx_data.read().unit_of_work().clone();
  uow.commit().await?;
  Ok(PipelineControl::Continue)
}
