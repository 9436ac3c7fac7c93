//! `GET /assignments/queue`: unassigned cases in the order a supervisor
//! should hand them out, plus the officers they can go to.

use axum::{Json, extract::State};
use ligtas_core::{
  assignment::{Roster, sort_queue},
  case::Case,
  staff::Role,
  status::CaseStatus,
  store::{CaseQuery, CaseStore},
};
use serde::Serialize;

use crate::{ApiState, auth::Session, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Queue {
  pub cases:  Vec<Case>,
  pub roster: Roster,
}

pub async fn queue<S>(
  State(state): State<ApiState<S>>,
  session: Session,
) -> Result<Json<Queue>, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin])?;

  let query = CaseQuery {
    status: Some(CaseStatus::Unassigned),
    limit: Some(i64::MAX as usize),
    ..Default::default()
  };
  let cases = state.store.list_cases(&query).await.map_err(ApiError::from_store)?;
  let officers = state
    .store
    .list_staff(&[Role::Admin])
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(Queue {
    cases:  sort_queue(cases),
    roster: Roster::from_staff(&officers),
  }))
}
