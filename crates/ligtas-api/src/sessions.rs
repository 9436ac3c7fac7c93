//! Sign-in endpoints. Both return a bearer token.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/sessions` | `{"email": "...", "password": "..."}` |
//! | `POST` | `/sessions/reference` | `{"reference_code": "abc123"}` |

use std::sync::LazyLock;

use axum::{Json, extract::State};
use ligtas_core::{
  reference::ReferenceCode,
  staff::StaffAccount,
  store::CaseStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  auth::{Session, hash_password, verify_password_blocking},
  cases::MyCase,
  error::ApiError,
  extract::ApiJson,
};

// ─── Staff ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct StaffSession {
  pub token: String,
  pub staff: StaffAccount,
}

/// Hash checked when no account holds the e-mail. Uses the same argon2
/// parameters as real account hashes.
pub(crate) static UNKNOWN_ACCOUNT_HASH: LazyLock<String> =
  LazyLock::new(|| hash_password("ligtas-unknown-account").unwrap_or_default());

fn bad_credentials() -> ApiError {
  ApiError::Unauthorized("e-mail or password is incorrect".into())
}

/// `POST /sessions`
pub async fn staff_login<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<StaffSession>, ApiError>
where
  S: CaseStore + 'static,
{
  let found = state
    .store
    .find_staff_by_email(body.email.trim())
    .await
    .map_err(ApiError::from_store)?;
  let Some(account) = found else {
    // Unknown e-mails pay for one argon2 verification too.
    verify_password_blocking(body.password, UNKNOWN_ACCOUNT_HASH.clone()).await?;
    tracing::warn!("staff sign-in for an unknown e-mail");
    return Err(bad_credentials());
  };

  if !verify_password_blocking(body.password, account.password_hash.clone()).await? {
    tracing::warn!(email = %account.email, "failed staff sign-in");
    return Err(bad_credentials());
  }

  let token = state.sessions.issue(&Session::staff(&account))?;
  tracing::info!(email = %account.email, role = %account.role, "staff signed in");
  Ok(Json(StaffSession { token, staff: account }))
}

// ─── Reporter ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReferenceBody {
  pub reference_code: String,
}

#[derive(Debug, Serialize)]
pub struct ClientSession {
  pub token: String,
  pub case:  MyCase,
}

/// `POST /sessions/reference`
pub async fn reference_lookup<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<ReferenceBody>,
) -> Result<Json<ClientSession>, ApiError>
where
  S: CaseStore + 'static,
{
  let code = ReferenceCode::parse(&body.reference_code)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let case = state
    .store
    .find_by_reference(&code)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("no report with reference code {code}")))?;

  let token = state.sessions.issue(&Session::client(case.case_id))?;
  Ok(Json(ClientSession { token, case: MyCase::from(case) }))
}
