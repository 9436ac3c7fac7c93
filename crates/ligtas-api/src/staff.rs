//! Staff-account administration. Superadmin only.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/staff` | Officers and barangay officials |
//! | `POST`   | `/staff` | Body: [`NewStaff`]; returns 201 |
//! | `PUT`    | `/staff/{id}` | Body: [`StaffUpdate`]; password unchanged |
//! | `DELETE` | `/staff/{id}` | 204, or 404 if there was no such account |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use ligtas_core::{
  staff::{NewStaff, Role, StaffAccount, StaffUpdate},
  store::CaseStore,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
  ApiState,
  auth::{Session, hash_password_blocking},
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

pub async fn list<S>(
  State(state): State<ApiState<S>>,
  session: Session,
) -> Result<Json<Vec<StaffAccount>>, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin])?;
  let staff = state
    .store
    .list_staff(&[Role::Admin, Role::Barangay])
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(staff))
}

pub async fn create<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiJson(body): ApiJson<NewStaff>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin])?;
  body.validate()?;

  let (details, password) = body.split_password();
  let hash = hash_password_blocking(password).await?;
  let account = state
    .store
    .create_staff(details, hash)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(email = %account.email, role = %account.role, "staff account created");
  Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<StaffUpdate>,
) -> Result<Json<StaffAccount>, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin])?;
  body.validate()?;
  let account = state
    .store
    .update_staff(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(account))
}

pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Superadmin])?;
  if !state.store.delete_staff(id).await.map_err(ApiError::from_store)? {
    return Err(ApiError::NotFound(format!("staff account {id} not found")));
  }
  tracing::info!(staff_id = %id, by = %session.sub, "staff account deleted");
  Ok(StatusCode::NO_CONTENT)
}
