//! Handlers for `/cases/{id}/transitions`.
//!
//! `GET` lists the statuses the case may move to next. `POST` moves it:
//! the body is a [`TransitionRequest`] and the `If-Match` header must carry
//! the ETag the caller last read.

use axum::{
  Json,
  extract::State,
  http::HeaderMap,
  response::IntoResponse,
};
use ligtas_core::{
  assignment::Roster,
  staff::Role,
  status::CaseStatus,
  store::CaseStore,
  workflow::{Capture, CaptureKind, TransitionRequest, allowed_targets, find_edge},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::Session,
  error::ApiError,
  etag::{compute_etag, require_if_match},
  extract::{ApiJson, ApiPath},
  visible_case,
};

#[derive(Debug, Serialize)]
pub struct Targets {
  pub from:    CaseStatus,
  /// Every legal destination.
  pub targets: Vec<CaseStatus>,
  /// The subset the caller may drive.
  pub allowed: Vec<CaseStatus>,
}

/// `GET /cases/{id}/transitions`
pub async fn targets<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Targets>, ApiError>
where
  S: CaseStore + 'static,
{
  let case = visible_case(&state, &session, id).await?;
  let targets = allowed_targets(case.status);
  let allowed = targets
    .iter()
    .copied()
    .filter(|to| {
      find_edge(case.status, *to).is_some_and(|edge| session.can_drive(edge, &case))
    })
    .collect();
  Ok(Json(Targets { from: case.status, targets, allowed }))
}

/// `POST /cases/{id}/transitions`
pub async fn apply<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  headers: HeaderMap,
  ApiJson(request): ApiJson<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Admin, Role::Barangay, Role::Superadmin])?;
  let case = visible_case(&state, &session, id).await?;
  let version = require_if_match(&headers, &case)?;

  let edge = find_edge(case.status, request.to);
  if edge.is_some_and(|edge| !session.can_drive(edge, &case)) {
    return Err(ApiError::Forbidden(format!(
      "{} accounts cannot move a case from {} to {}",
      session.role, case.status, request.to
    )));
  }

  let wants_assignee = edge.and_then(|e| e.capture) == Some(CaptureKind::Assignee);
  if let (true, Some(Capture::Assignee(email))) = (wants_assignee, &request.capture) {
    let officers = state
      .store
      .list_staff(&[Role::Admin])
      .await
      .map_err(ApiError::from_store)?;
    if !Roster::from_staff(&officers).contains(email) {
      return Err(ApiError::BadRequest(format!("{email} is not a case officer")));
    }
  }

  let (from, to) = (case.status, request.to);
  let case = match state.store.transition(id, version, request).await {
    Ok(case) => case,
    Err(e) => {
      let err = ApiError::from_store(e);
      match &err {
        ApiError::Rejected(r) => {
          tracing::warn!(case_id = %id, %from, %to, reason = r.reason(), "transition rejected");
        }
        ApiError::Conflict(_) => {
          tracing::warn!(case_id = %id, expected = version, "transition lost a race");
        }
        _ => {}
      }
      return Err(err);
    }
  };

  if from == CaseStatus::Unassigned {
    if let Some(officer) = case.assigned.as_deref() {
      tracing::info!(case_id = %id, %officer, by = %session.sub, "case assigned");
    }
  }
  Ok(([(axum::http::header::ETAG, compute_etag(&case))], Json(case)))
}
