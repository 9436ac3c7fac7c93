//! The case record and the operations that change it in memory.
//!
//! Stores load a [`Case`], run one of the methods here, and write the result
//! back conditioned on the version they loaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
  form::{CompletionForm, IntakeForm, InvestigationForm, MemberRecord, ReferralForm},
  reference::ReferenceCode,
  status::CaseStatus,
  workflow::{self, Capture, CaptureKind, Rejection, Transition, TransitionRequest},
};

/// A single incident report and everything captured while handling it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
  pub case_id:        Uuid,
  pub reference_code: ReferenceCode,
  pub status:         CaseStatus,
  /// Bumped on every write. Writers must present the version they read.
  pub version:        i64,
  pub form_data:      IntakeForm,
  pub family_data:    Vec<MemberRecord>,
  pub household_data: Vec<MemberRecord>,
  /// Referral form, set on entry to `Under Investigation`.
  pub first_form:     Option<ReferralForm>,
  /// Investigation form, set on entry to `In Progress`.
  pub second_form:    Option<InvestigationForm>,
  /// Completion form, set on entry to `Completed`.
  pub complete_form:  Option<CompletionForm>,
  /// E-mail of the assigned case officer.
  pub assigned:       Option<String>,
  pub file_uploads:   Vec<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input for filing a new report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewCase {
  #[validate(nested)]
  pub form_data:      IntakeForm,
  pub family_data:    Vec<MemberRecord>,
  pub household_data: Vec<MemberRecord>,
  /// Opaque references to evidence uploaded alongside the report.
  pub file_uploads:   Vec<String>,
}

impl NewCase {
  /// Drop blank member rows and blank attachment references.
  pub fn normalized(mut self) -> Self {
    self.family_data.retain(|m| !m.is_blank());
    self.household_data.retain(|m| !m.is_blank());
    self.file_uploads = clean_refs(self.file_uploads);
    self
  }
}

/// Trim attachment references and drop the empty ones.
pub fn clean_refs(refs: Vec<String>) -> Vec<String> {
  refs
    .into_iter()
    .map(|r| r.trim().to_owned())
    .filter(|r| !r.is_empty())
    .collect()
}

impl Case {
  /// Build a freshly filed case in `review`.
  pub fn open(case_id: Uuid, input: NewCase, now: DateTime<Utc>) -> Self {
    let input = input.normalized();
    Self {
      case_id,
      reference_code: ReferenceCode::derive(case_id),
      status: CaseStatus::Review,
      version: 1,
      form_data: input.form_data,
      family_data: input.family_data,
      household_data: input.household_data,
      first_form: None,
      second_form: None,
      complete_form: None,
      assigned: None,
      file_uploads: input.file_uploads,
      created_at: now,
      updated_at: now,
    }
  }

  /// Run the guard for `request` against this case.
  ///
  /// A referral capture has its blank identity fields filled from the
  /// intake before the emptiness check.
  pub fn plan(&self, mut request: TransitionRequest) -> Result<Transition, Rejection> {
    if let Some(Capture::Referral(form)) = request.capture.as_mut() {
      form.prefill(&self.form_data, self.created_at.date_naive());
    }
    workflow::check(self.status, request)
  }

  /// Apply an approved transition. Forms captured on earlier edges are kept,
  /// so a reopened case still carries its completion form.
  pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) {
    match transition.capture {
      Some(Capture::Assignee(email)) => self.assigned = Some(email.trim().to_owned()),
      Some(Capture::Referral(f)) => self.first_form = Some(f),
      Some(Capture::Investigation(f)) => self.second_form = Some(f),
      Some(Capture::Completion(f)) => self.complete_form = Some(f),
      None => {}
    }
    self.status = transition.to;
    self.touch(now);
  }

  /// Replace the intake details (administrative correction).
  pub fn correct_intake(&mut self, form: IntakeForm, now: DateTime<Utc>) {
    self.form_data = form;
    self.touch(now);
  }

  /// Append attachment references.
  pub fn attach(&mut self, refs: Vec<String>, now: DateTime<Utc>) {
    self.file_uploads.extend(refs);
    self.touch(now);
  }

  fn touch(&mut self, now: DateTime<Utc>) {
    self.version += 1;
    self.updated_at = now;
  }

  /// Statuses that require a capture form have that form, non-empty.
  pub fn capture_invariant_holds(&self) -> bool {
    match self.status.required_form() {
      None => true,
      Some(CaptureKind::Referral) => {
        self.first_form.as_ref().is_some_and(|f| !f.is_empty())
      }
      Some(CaptureKind::Investigation) => {
        self.second_form.as_ref().is_some_and(|f| !f.is_empty())
      }
      Some(CaptureKind::Completion) => {
        self.complete_form.as_ref().is_some_and(|f| !f.is_empty())
      }
      Some(CaptureKind::Assignee) => self.assigned.is_some(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::form::tests::valid_intake;

  fn filed() -> Case {
    let input = NewCase {
      form_data: valid_intake(),
      family_data: vec![
        MemberRecord { name: "Rosa".into(), ..Default::default() },
        MemberRecord::default(),
      ],
      household_data: vec![MemberRecord::default()],
      file_uploads: vec!["photo-1.jpg".into(), "  ".into()],
    };
    Case::open(Uuid::new_v4(), input, Utc::now())
  }

  fn step(case: &mut Case, request: TransitionRequest) {
    let t = case.plan(request).unwrap();
    case.apply(t, Utc::now());
  }

  #[test]
  fn open_normalises_input() {
    let case = filed();
    assert_eq!(case.status, CaseStatus::Review);
    assert_eq!(case.version, 1);
    assert_eq!(case.family_data.len(), 1);
    assert!(case.household_data.is_empty());
    assert_eq!(case.file_uploads, vec!["photo-1.jpg".to_owned()]);
    assert!(case.reference_code.matches(case.case_id));
  }

  #[test]
  fn referral_is_prefilled_from_intake() {
    let mut case = filed();
    step(&mut case, TransitionRequest::to(CaseStatus::Unassigned));
    step(
      &mut case,
      TransitionRequest::with(
        CaseStatus::Assigned,
        Capture::Assignee("officer@bani.gov".into()),
      ),
    );
    step(
      &mut case,
      TransitionRequest::with(
        CaseStatus::UnderInvestigation,
        Capture::Referral(ReferralForm {
          referral_reason: "bruises".into(),
          ..Default::default()
        }),
      ),
    );

    let referral = case.first_form.as_ref().unwrap();
    assert_eq!(referral.user_name, "Juan Dela Cruz");
    assert_eq!(referral.referral_date, Some(case.created_at.date_naive()));
    assert_eq!(case.assigned.as_deref(), Some("officer@bani.gov"));
    assert_eq!(case.version, 4);
    assert!(case.capture_invariant_holds());
  }

  #[test]
  fn reopening_keeps_the_completion_form() {
    let mut case = filed();
    case.status = CaseStatus::InProgress;
    case.second_form = Some(InvestigationForm {
      officer_report: "done".into(),
      ..Default::default()
    });
    let form = CompletionForm { initial_assessment: "safe at home".into() };
    step(
      &mut case,
      TransitionRequest::with(CaseStatus::Completed, Capture::Completion(form.clone())),
    );
    step(&mut case, TransitionRequest::to(CaseStatus::InProgress));

    assert_eq!(case.status, CaseStatus::InProgress);
    assert_eq!(case.complete_form, Some(form));
    assert!(case.capture_invariant_holds());
  }

  #[test]
  fn rejected_plan_leaves_case_untouched() {
    let case = filed();
    let before = case.clone();
    assert!(case.plan(TransitionRequest::to(CaseStatus::Completed)).is_err());
    assert_eq!(case, before);
  }

  #[test]
  fn invariant_detects_missing_form() {
    let mut case = filed();
    case.status = CaseStatus::UnderInvestigation;
    assert!(!case.capture_invariant_holds());
  }

  #[test]
  fn assigned_case_needs_an_officer() {
    let mut case = filed();
    case.status = CaseStatus::Assigned;
    assert!(!case.capture_invariant_holds());

    case.assigned = Some("officer@bani.gov".into());
    assert!(case.capture_invariant_holds());
  }

  #[test]
  fn new_case_validation_is_nested() {
    let input = NewCase {
      form_data: IntakeForm { name: String::new(), ..valid_intake() },
      ..Default::default()
    };
    assert!(input.validate().is_err());
  }
}
