//! Handlers for `/cases` endpoints and the reporter's own view.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/cases` | Intake, no session needed; returns 201 + receipt with a client token |
//! | `GET`    | `/cases` | Staff only; scoped by role |
//! | `GET`    | `/cases/{id}` | Returns an `ETag` |
//! | `PUT`    | `/cases/{id}/form` | Superadmin; `If-Match` required |
//! | `DELETE` | `/cases/{id}` | Superadmin, or the barangay for its own unvalidated report |
//! | `POST`   | `/cases/{id}/attachments` | Body `{"files": [...]}` |
//! | `GET`    | `/me/case` | Client only; masked summary |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use ligtas_core::{
  case::{Case, NewCase, clean_refs},
  form::{IncidentType, IntakeForm},
  mask::{mask_name, mask_phone},
  reference::ReferenceCode,
  staff::Role,
  status::CaseStatus,
  store::{CaseQuery, CaseStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
  ApiState,
  auth::Session,
  error::ApiError,
  etag::{compute_etag, require_if_match},
  extract::{ApiJson, ApiPath, ApiQuery},
  visible_case,
};

fn tagged(case: Case) -> impl IntoResponse {
  ([(header::ETAG, compute_etag(&case))], Json(case))
}

// ─── Intake ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IntakeReceipt {
  pub case:           Case,
  pub reference_code: ReferenceCode,
  /// A client session for following the report.
  pub token:          String,
}

/// `POST /cases`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<NewCase>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  let body = body.normalized();
  body.validate()?;

  let case = state.store.create_case(body).await.map_err(ApiError::from_store)?;
  let token = state.sessions.issue(&Session::client(case.case_id))?;
  tracing::info!(case_id = %case.case_id, "report filed");

  let receipt = IntakeReceipt {
    reference_code: case.reference_code.clone(),
    case,
    token,
  };
  Ok((StatusCode::CREATED, Json(receipt)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub status:          Option<CaseStatus>,
  pub incident_type:   Option<String>,
  pub assigned:        Option<String>,
  pub address:         Option<String>,
  pub created_after:   Option<DateTime<Utc>>,
  pub created_before:  Option<DateTime<Utc>>,
  /// Matches the child's name or the reportee.
  pub text:            Option<String>,
  /// Also return removed cases. Default `false`.
  #[serde(default)]
  pub include_removed: bool,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

impl From<ListParams> for CaseQuery {
  fn from(p: ListParams) -> Self {
    CaseQuery {
      status:         p.status,
      incident_type:  p.incident_type.map(IncidentType::from),
      assigned:       p.assigned,
      address:        p.address,
      created_after:  p.created_after,
      created_before: p.created_before,
      text:           p.text,
      hide_removed:   !p.include_removed,
      limit:          p.limit,
      offset:         p.offset,
    }
  }
}

/// `GET /cases[?status=...][&incident_type=...][&text=...][&limit=...]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Case>>, ApiError>
where
  S: CaseStore + 'static,
{
  let mut query = CaseQuery::from(params);
  session.scope(&mut query)?;
  let cases = state.store.list_cases(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(cases))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /cases/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  let case = visible_case(&state, &session, id).await?;
  Ok(tagged(case))
}

// ─── Correct intake ──────────────────────────────────────────────────────────

/// `PUT /cases/{id}/form` with the full replacement [`IntakeForm`].
pub async fn correct_intake<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  headers: HeaderMap,
  ApiJson(form): ApiJson<IntakeForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin])?;
  form.validate()?;
  let current = visible_case(&state, &session, id).await?;
  let version = require_if_match(&headers, &current)?;

  let case = state
    .store
    .correct_intake(id, version, form)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(case_id = %id, by = %session.sub, "intake corrected");
  Ok(tagged(case))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /cases/{id}` — 204 on success.
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin, Role::Barangay])?;
  let case = visible_case(&state, &session, id).await?;
  if session.role == Role::Barangay && case.status != CaseStatus::Review {
    return Err(ApiError::Forbidden(
      "only reports still under review can be discarded by the barangay".into(),
    ));
  }

  if !state.store.delete_case(id).await.map_err(ApiError::from_store)? {
    return Err(ApiError::NotFound(format!("case {id} not found")));
  }
  tracing::info!(case_id = %id, by = %session.sub, "case deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AttachBody {
  pub files: Vec<String>,
}

/// `POST /cases/{id}/attachments`
pub async fn attach<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<AttachBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  visible_case(&state, &session, id).await?;
  let files = clean_refs(body.files);
  if files.is_empty() {
    return Err(ApiError::BadRequest("no attachment references given".into()));
  }

  let case = state.store.attach_files(id, files).await.map_err(ApiError::from_store)?;
  Ok(tagged(case))
}

// ─── Reporter view ───────────────────────────────────────────────────────────

/// What a reporter sees of their own case.
#[derive(Debug, Serialize)]
pub struct MyCase {
  pub case_id:        Uuid,
  pub reference_code: ReferenceCode,
  pub status:         CaseStatus,
  /// Rough completion percentage for a progress bar.
  pub progress:       u8,
  pub name:           String,
  pub contact:        String,
  pub incident_type:  IncidentType,
  pub file_uploads:   Vec<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl From<Case> for MyCase {
  fn from(c: Case) -> Self {
    MyCase {
      case_id:        c.case_id,
      reference_code: c.reference_code,
      status:         c.status,
      progress:       c.status.progress(),
      name:           mask_name(&c.form_data.name),
      contact:        mask_phone(&c.form_data.contact),
      incident_type:  c.form_data.incident_type,
      file_uploads:   c.file_uploads,
      created_at:     c.created_at,
      updated_at:     c.updated_at,
    }
  }
}

/// `GET /me/case`
pub async fn my_case<S>(
  State(state): State<ApiState<S>>,
  session: Session,
) -> Result<Json<MyCase>, ApiError>
where
  S: CaseStore + 'static,
{
  let id = session
    .case_id
    .ok_or_else(|| ApiError::Forbidden("only reporters have a case of their own".into()))?;
  let case = visible_case(&state, &session, id).await?;
  Ok(Json(MyCase::from(case)))
}
