//! `GET /reports/summary?year=2024&month=3`: monthly case counts for the
//! officer dashboard. Defaults to the current month. Officers only see
//! counts over the cases assigned to them.

use axum::{
  Json,
  extract::State,
};
use chrono::{Datelike, Utc};
use ligtas_core::{
  report::{Summary, month_range, summarize},
  staff::Role,
  store::{CaseQuery, CaseStore},
};
use serde::Deserialize;

use crate::{ApiState, auth::Session, error::ApiError, extract::ApiQuery};

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
  pub year:  Option<i32>,
  pub month: Option<u32>,
}

pub async fn summary<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiQuery(params): ApiQuery<SummaryParams>,
) -> Result<Json<Summary>, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Admin, Role::Superadmin])?;

  let today = Utc::now().with_timezone(&state.office_offset).date_naive();
  let year = params.year.unwrap_or(today.year());
  let month = params.month.unwrap_or(today.month());
  let (start, end) = month_range(year, month, state.office_offset)
    .ok_or_else(|| ApiError::BadRequest(format!("no such month: {year}-{month}")))?;

  let mut query = CaseQuery {
    created_after: Some(start),
    created_before: Some(end),
    hide_removed: true,
    limit: Some(i64::MAX as usize),
    ..Default::default()
  };
  session.scope(&mut query)?;

  let cases = state.store.list_cases(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(summarize(year, month, state.office_offset, &cases)))
}
