//! Body, query and path extractors that fail with [`ApiError`].
//!
//! axum's own extractors answer a malformed request with a plain-text body.
//! These wrappers delegate to them and turn the rejection into a JSON 400,
//! so every error a client sees has the same shape.

use axum::{
  Json,
  extract::{
    FromRequest, FromRequestParts, Path, Query, Request,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// Query-string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state).await?;
    Ok(Self(value))
  }
}

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
    Ok(Self(value))
  }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
    Ok(Self(value))
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{StatusCode, header},
    response::IntoResponse,
  };
  use serde::Deserialize;

  use super::*;

  #[derive(Debug, Deserialize)]
  struct Tally {
    #[allow(dead_code)]
    count: u32,
  }

  #[tokio::test]
  async fn bad_json_is_a_json_400() {
    let req = axum::http::Request::builder()
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"count":"many"}"#))
      .unwrap();
    let err = ApiJson::<Tally>::from_request(req, &()).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let res = err.into_response();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
  }

  #[tokio::test]
  async fn bad_query_is_a_bad_request() {
    let req = axum::http::Request::builder().uri("/?count=-1").body(Body::empty()).unwrap();
    let (mut parts, _) = req.into_parts();
    let err = ApiQuery::<Tally>::from_request_parts(&mut parts, &()).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
  }
}
