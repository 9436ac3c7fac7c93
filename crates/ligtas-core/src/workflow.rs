//! The status transition guard.
//!
//! Every status change goes through [`check`], a pure function of the
//! current status, the requested destination and the form captured with the
//! request. Nothing here touches storage; the store applies the returned
//! [`Transition`] in a single conditional write.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::{
  form::{CompletionForm, InvestigationForm, ReferralForm},
  status::CaseStatus,
};

// ─── Captures ────────────────────────────────────────────────────────────────

/// Which side form an edge requires.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaptureKind {
  Assignee,
  Referral,
  Investigation,
  Completion,
}

/// A form captured together with a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Capture {
  /// E-mail of the case officer taking the case.
  Assignee(String),
  Referral(ReferralForm),
  Investigation(InvestigationForm),
  Completion(CompletionForm),
}

impl Capture {
  pub fn kind(&self) -> CaptureKind {
    match self {
      Self::Assignee(_) => CaptureKind::Assignee,
      Self::Referral(_) => CaptureKind::Referral,
      Self::Investigation(_) => CaptureKind::Investigation,
      Self::Completion(_) => CaptureKind::Completion,
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Self::Assignee(email) => email.trim().is_empty(),
      Self::Referral(f) => f.is_empty(),
      Self::Investigation(f) => f.is_empty(),
      Self::Completion(f) => f.is_empty(),
    }
  }
}

/// What a caller asks for: move to `to`, carrying `capture` if the edge
/// needs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
  pub to:      CaseStatus,
  #[serde(default)]
  pub capture: Option<Capture>,
}

impl TransitionRequest {
  pub fn to(to: CaseStatus) -> Self { Self { to, capture: None } }

  pub fn with(to: CaseStatus, capture: Capture) -> Self {
    Self { to, capture: Some(capture) }
  }
}

// ─── Rejections ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum Rejection {
  #[error("cannot move a case from {from} to {to}")]
  InvalidTransition { from: CaseStatus, to: CaseStatus },

  #[error("moving a case to {to} requires a non-empty {required} form")]
  MissingRequiredForm {
    to:       CaseStatus,
    required: CaptureKind,
  },
}

impl Rejection {
  /// The stable machine-readable reason string.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::InvalidTransition { .. } => "invalid-transition",
      Self::MissingRequiredForm { .. } => "missing-required-form",
    }
  }
}

// ─── Edges ───────────────────────────────────────────────────────────────────

/// Who may drive an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
  /// A barangay official whose address matches the case's address.
  Barangay,
  /// The case officer the case is assigned to.
  AssignedOfficer,
  Superadmin,
}

/// One allowed move in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
  pub from:    CaseStatus,
  pub to:      CaseStatus,
  pub capture: Option<CaptureKind>,
  pub actors:  &'static [Actor],
}

const PIPELINE: &[Actor] = &[Actor::AssignedOfficer, Actor::Superadmin];
const SUPERVISOR: &[Actor] = &[Actor::Superadmin];

const fn edge(
  from: CaseStatus,
  to: CaseStatus,
  capture: Option<CaptureKind>,
  actors: &'static [Actor],
) -> Edge {
  Edge { from, to, capture, actors }
}

use CaseStatus::*;

/// The complete set of legal moves. Anything not listed is rejected.
pub const EDGES: &[Edge] = &[
  edge(Review, Unassigned, None, &[Actor::Barangay, Actor::Superadmin]),
  edge(Unassigned, Assigned, Some(CaptureKind::Assignee), SUPERVISOR),
  edge(Assigned, UnderInvestigation, Some(CaptureKind::Referral), PIPELINE),
  edge(UnderInvestigation, Assigned, None, PIPELINE),
  edge(UnderInvestigation, InProgress, Some(CaptureKind::Investigation), PIPELINE),
  edge(InProgress, UnderInvestigation, None, PIPELINE),
  edge(InProgress, Completed, Some(CaptureKind::Completion), PIPELINE),
  edge(Completed, InProgress, None, PIPELINE),
  edge(Review, Removed, None, SUPERVISOR),
  edge(Unassigned, Removed, None, SUPERVISOR),
  edge(Assigned, Removed, None, SUPERVISOR),
  edge(UnderInvestigation, Removed, None, SUPERVISOR),
  edge(InProgress, Removed, None, SUPERVISOR),
];

/// Look up the edge between two statuses, if there is one.
pub fn find_edge(from: CaseStatus, to: CaseStatus) -> Option<&'static Edge> {
  EDGES.iter().find(|e| e.from == from && e.to == to)
}

/// Legal destinations from `from`, in table order.
pub fn allowed_targets(from: CaseStatus) -> Vec<CaseStatus> {
  EDGES.iter().filter(|e| e.from == from).map(|e| e.to).collect()
}

/// An approved move, ready to be written.
///
/// `capture` is `Some` exactly when the edge requires one; captures sent on
/// edges that need none are dropped here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub from:    CaseStatus,
  pub to:      CaseStatus,
  pub capture: Option<Capture>,
}

/// Decide whether `request` may be applied to a case currently in `from`.
pub fn check(
  from: CaseStatus,
  request: TransitionRequest,
) -> Result<Transition, Rejection> {
  let TransitionRequest { to, capture } = request;
  let edge = find_edge(from, to)
    .ok_or(Rejection::InvalidTransition { from, to })?;

  let Some(required) = edge.capture else {
    return Ok(Transition { from, to, capture: None });
  };

  match capture {
    Some(c) if c.kind() == required && !c.is_empty() => {
      Ok(Transition { from, to, capture: Some(c) })
    }
    _ => Err(Rejection::MissingRequiredForm { to, required }),
  }
}
