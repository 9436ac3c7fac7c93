//! JSON REST API for Ligtas.
//!
//! Exposes an axum [`Router`] backed by any [`ligtas_core::store::CaseStore`].
//! TLS, request tracing and process concerns are the caller's
//! responsibility; session tokens are issued and checked here.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ligtas_api::api_router(state))
//! ```

pub mod assignments;
pub mod auth;
pub mod cases;
pub mod chats;
pub mod error;
pub mod etag;
pub mod extract;
pub mod news;
pub mod reports;
pub mod sessions;
pub mod staff;
pub mod transitions;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use chrono::{FixedOffset, Offset, Utc};
use ligtas_core::{case::Case, store::CaseStore};
use uuid::Uuid;

pub use auth::{Session, SessionKeys};
pub use error::ApiError;

/// UTC offset of the field office (Asia/Manila), in hours.
pub const DEFAULT_OFFICE_OFFSET_HOURS: i32 = 8;

/// Shared state threaded through every handler.
pub struct ApiState<S> {
  pub store:         Arc<S>,
  pub sessions:      Arc<SessionKeys>,
  /// Calendar months in reports follow this offset.
  pub office_offset: FixedOffset,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, sessions: SessionKeys) -> Self {
    Self {
      store,
      sessions: Arc::new(sessions),
      office_offset: office_offset(DEFAULT_OFFICE_OFFSET_HOURS)
        .unwrap_or(Utc.fix()),
    }
  }

  pub fn with_office_offset(mut self, offset: FixedOffset) -> Self {
    self.office_offset = offset;
    self
  }
}

/// A whole-hour UTC offset, if it is a real one.
pub fn office_offset(hours: i32) -> Option<FixedOffset> {
  FixedOffset::east_opt(hours.checked_mul(3600)?)
}

// `S` itself need not be `Clone`; only the `Arc`s are cloned.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:         self.store.clone(),
      sessions:      self.sessions.clone(),
      office_offset: self.office_offset,
    }
  }
}

/// Load a case the caller is allowed to see.
pub(crate) async fn visible_case<S: CaseStore>(
  state: &ApiState<S>,
  session: &Session,
  id: Uuid,
) -> Result<Case, ApiError> {
  let case = state
    .store
    .get_case(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))?;
  if !session.can_view(&case) {
    return Err(ApiError::Forbidden(format!("case {id} is outside your scope")));
  }
  Ok(case)
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CaseStore + 'static,
{
  Router::new()
    // Cases
    .route("/cases", get(cases::list::<S>).post(cases::create::<S>))
    .route("/cases/{id}", get(cases::get_one::<S>).delete(cases::delete::<S>))
    .route("/cases/{id}/form", put(cases::correct_intake::<S>))
    .route(
      "/cases/{id}/transitions",
      get(transitions::targets::<S>).post(transitions::apply::<S>),
    )
    .route("/cases/{id}/attachments", post(cases::attach::<S>))
    .route("/cases/{id}/chats", get(chats::list::<S>).post(chats::send::<S>))
    .route("/me/case", get(cases::my_case::<S>))
    // Back office
    .route("/assignments/queue", get(assignments::queue::<S>))
    .route("/reports/summary", get(reports::summary::<S>))
    // Sessions
    .route("/sessions", post(sessions::staff_login::<S>))
    .route("/sessions/reference", post(sessions::reference_lookup::<S>))
    // News
    .route("/news", get(news::list::<S>).post(news::publish::<S>))
    .route("/news/{id}", get(news::get_one::<S>))
    // Staff
    .route("/staff", get(staff::list::<S>).post(staff::create::<S>))
    .route("/staff/{id}", put(staff::update::<S>).delete(staff::delete::<S>))
    .with_state(state)
}
