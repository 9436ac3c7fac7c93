//! Handlers for a case's chat thread.
//!
//! Clients poll with `?after=<created_at of the last message seen>` to pick
//! up only new messages.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use ligtas_core::{
  chat::{ChatMessage, NewChatMessage},
  store::CaseStore,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
  ApiState,
  auth::Session,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
  visible_case,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub after: Option<DateTime<Utc>>,
}

/// `GET /cases/{id}/chats[?after=...]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<ChatMessage>>, ApiError>
where
  S: CaseStore + 'static,
{
  visible_case(&state, &session, id).await?;
  let messages = state
    .store
    .list_chats(id, params.after)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(messages))
}

/// `POST /cases/{id}/chats` — 201 + the stored message.
pub async fn send<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<NewChatMessage>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  body.validate()?;
  visible_case(&state, &session, id).await?;
  let message = state
    .store
    .append_chat(id, session.sub.clone(), body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(message)))
}
