//! Handlers for `/news`. Reading is public; publishing needs an officer or
//! superadmin session.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use ligtas_core::{
  news::{NewNews, NewsItem},
  staff::Role,
  store::CaseStore,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
  ApiState,
  auth::Session,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

/// `GET /news`, newest first.
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<NewsItem>>, ApiError>
where
  S: CaseStore + 'static,
{
  let items = state.store.list_news().await.map_err(ApiError::from_store)?;
  Ok(Json(items))
}

/// `GET /news/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<NewsItem>, ApiError>
where
  S: CaseStore + 'static,
{
  let item = state
    .store
    .get_news(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("news item {id} not found")))?;
  Ok(Json(item))
}

/// `POST /news` — 201 + the stored item.
pub async fn publish<S>(
  State(state): State<ApiState<S>>,
  session: Session,
  ApiJson(body): ApiJson<NewNews>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + 'static,
{
  session.require(&[Role::Admin, Role::Superadmin])?;
  body.validate()?;
  let item = state.store.publish_news(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(item)))
}
