//! The `CaseStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `ligtas-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  case::{Case, NewCase},
  chat::{ChatMessage, NewChatMessage},
  form::{IncidentType, IntakeForm},
  news::{NewNews, NewsItem},
  reference::ReferenceCode,
  staff::{Role, StaffAccount, StaffUpdate},
  status::CaseStatus,
  workflow::{Rejection, TransitionRequest},
};

// ─── Query type ──────────────────────────────────────────────────────────────

pub const DEFAULT_LIMIT: usize = 100;

/// Parameters for [`CaseStore::list_cases`]. Every filter is optional and
/// filters combine with AND. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
  pub status:         Option<CaseStatus>,
  pub incident_type:  Option<IncidentType>,
  /// Assigned officer's e-mail.
  pub assigned:       Option<String>,
  /// Barangay.
  pub address:        Option<String>,
  pub created_after:  Option<DateTime<Utc>>,
  pub created_before: Option<DateTime<Utc>>,
  /// Substring match over the child's name and the reportee.
  pub text:           Option<String>,
  /// Leave out `Removed` cases unless `status` asks for them.
  pub hide_removed:   bool,
  pub limit:          Option<usize>,
  pub offset:         Option<usize>,
}

// ─── Error classification ────────────────────────────────────────────────────

/// Backend-neutral classes of store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
  NotFound,
  /// The caller's expected version is stale.
  Conflict,
  /// The transition guard refused the request.
  Rejected,
  /// A uniqueness rule was violated (e.g. a staff e-mail).
  Duplicate,
  Internal,
}

/// Implemented by each backend's error type so callers can react to a
/// failure without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn failure(&self) -> Failure;

  /// The guard's rejection, when `failure()` is [`Failure::Rejected`].
  fn rejection(&self) -> Option<&Rejection> { None }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Ligtas case store backend.
///
/// Every case mutation is conditioned on the version the caller read, and
/// either applies completely or not at all.
pub trait CaseStore: Send + Sync {
  type Error: StoreError;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// File a new report in `review`. The store assigns the id and a
  /// reference code that no other case holds.
  fn create_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  fn get_case(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + '_;

  fn find_by_reference<'a>(
    &'a self,
    code: &'a ReferenceCode,
  ) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + 'a;

  fn list_cases<'a>(
    &'a self,
    query: &'a CaseQuery,
  ) -> impl Future<Output = Result<Vec<Case>, Self::Error>> + Send + 'a;

  /// Run the transition guard and, if it approves, write the new status and
  /// capture in one conditional statement.
  ///
  /// Fails with [`Failure::Conflict`] when the case is no longer at
  /// `expected_version`, and with [`Failure::Rejected`] when the guard says
  /// no. In both cases nothing is written.
  fn transition(
    &self,
    id: Uuid,
    expected_version: i64,
    request: TransitionRequest,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  /// Replace the intake details of a case.
  fn correct_intake(
    &self,
    id: Uuid,
    expected_version: i64,
    form: IntakeForm,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  /// Append a batch of attachment references. The batch lands entirely or
  /// not at all.
  fn attach_files(
    &self,
    id: Uuid,
    refs: Vec<String>,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  /// Hard-delete a case and its chat thread. Returns `false` if there was
  /// no such case.
  fn delete_case(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Chats ─────────────────────────────────────────────────────────────

  fn append_chat(
    &self,
    case_id: Uuid,
    sender_id: String,
    message: NewChatMessage,
  ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + '_;

  /// Messages in send order. With `after`, only those created strictly
  /// later.
  fn list_chats(
    &self,
    case_id: Uuid,
    after: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<ChatMessage>, Self::Error>> + Send + '_;

  // ── News ──────────────────────────────────────────────────────────────

  fn publish_news(
    &self,
    input: NewNews,
  ) -> impl Future<Output = Result<NewsItem, Self::Error>> + Send + '_;

  fn get_news(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<NewsItem>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_news(
    &self,
  ) -> impl Future<Output = Result<Vec<NewsItem>, Self::Error>> + Send + '_;

  // ── Staff ─────────────────────────────────────────────────────────────

  /// `password_hash` must already be an argon2 PHC string.
  fn create_staff(
    &self,
    input: StaffUpdate,
    password_hash: String,
  ) -> impl Future<Output = Result<StaffAccount, Self::Error>> + Send + '_;

  fn get_staff(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StaffAccount>, Self::Error>> + Send + '_;

  /// Case-insensitive on the e-mail.
  fn find_staff_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<StaffAccount>, Self::Error>> + Send + 'a;

  /// Accounts holding any of `roles`, oldest first. An empty slice lists
  /// everyone.
  fn list_staff<'a>(
    &'a self,
    roles: &'a [Role],
  ) -> impl Future<Output = Result<Vec<StaffAccount>, Self::Error>> + Send + 'a;

  fn update_staff(
    &self,
    id: Uuid,
    update: StaffUpdate,
  ) -> impl Future<Output = Result<StaffAccount, Self::Error>> + Send + '_;

  /// Returns `false` if there was no such account.
  fn delete_staff(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
