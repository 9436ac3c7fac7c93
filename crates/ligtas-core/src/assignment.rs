//! Ordering of the assignment queue and the officer roster.
//!
//! The queue is advisory: it only decides the order a supervisor sees
//! unassigned cases in. The binding step is the `unassigned → assigned`
//! transition carrying an assignee capture.

use std::cmp::{Ordering, Reverse};

use serde::Serialize;

use crate::{
  case::Case,
  form::IncidentType,
  staff::{Role, StaffAccount},
  status::CaseStatus,
};

/// Lower sorts first.
pub fn priority(incident: &IncidentType) -> u8 {
  match incident {
    IncidentType::PhysicalAbuse => 0,
    IncidentType::Neglect => 2,
    _ => 1,
  }
}

/// Queue order: incident priority, then newest first.
pub fn queue_order(a: &Case, b: &Case) -> Ordering {
  let key = |c: &Case| (priority(&c.form_data.incident_type), Reverse(c.created_at));
  key(a).cmp(&key(b))
}

/// Keep the unassigned cases and sort them into queue order.
pub fn sort_queue(mut cases: Vec<Case>) -> Vec<Case> {
  cases.retain(|c| c.status == CaseStatus::Unassigned);
  cases.sort_by(queue_order);
  cases
}

/// E-mails of the case officers eligible for assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster(Vec<String>);

impl Roster {
  pub fn from_staff<'a>(staff: impl IntoIterator<Item = &'a StaffAccount>) -> Self {
    let mut emails: Vec<String> = staff
      .into_iter()
      .filter(|s| s.role == Role::Admin)
      .map(|s| s.email.clone())
      .collect();
    emails.sort();
    emails.dedup();
    Self(emails)
  }

  /// E-mail comparison is case-insensitive.
  pub fn contains(&self, email: &str) -> bool {
    let email = email.trim();
    self.0.iter().any(|e| e.eq_ignore_ascii_case(email))
  }

  pub fn emails(&self) -> &[String] { &self.0 }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{case::NewCase, form::tests::valid_intake};

  fn unassigned(kind: IncidentType, age_minutes: i64) -> Case {
    let form_data = crate::form::IntakeForm {
      incident_type: kind,
      ..valid_intake()
    };
    let created = Utc::now() - Duration::minutes(age_minutes);
    let mut case = Case::open(
      Uuid::new_v4(),
      NewCase { form_data, ..Default::default() },
      created,
    );
    case.status = CaseStatus::Unassigned;
    case
  }

  #[test]
  fn physical_abuse_first_neglect_last_newest_within_tier() {
    let old_abuse = unassigned(IncidentType::PhysicalAbuse, 60);
    let new_abuse = unassigned(IncidentType::PhysicalAbuse, 5);
    let rape = unassigned(IncidentType::Rape, 10);
    let neglect = unassigned(IncidentType::Neglect, 1);
    let mut reviewed = unassigned(IncidentType::PhysicalAbuse, 0);
    reviewed.status = CaseStatus::Review;

    let queue = sort_queue(vec![
      neglect.clone(),
      old_abuse.clone(),
      reviewed,
      rape.clone(),
      new_abuse.clone(),
    ]);
    let ids: Vec<Uuid> = queue.iter().map(|c| c.case_id).collect();
    assert_eq!(ids, vec![
      new_abuse.case_id,
      old_abuse.case_id,
      rape.case_id,
      neglect.case_id
    ]);
  }

  #[test]
  fn roster_is_officers_only() {
    let now = Utc::now();
    let staff = |email: &str, role| StaffAccount {
      staff_id: Uuid::new_v4(),
      email: email.into(),
      full_name: String::new(),
      name: String::new(),
      role,
      address: String::new(),
      password_hash: String::new(),
      created_at: now,
    };
    let accounts = [
      staff("officer@bani.gov", Role::Admin),
      staff("captain@bani.gov", Role::Barangay),
      staff("chief@bani.gov", Role::Superadmin),
    ];
    let roster = Roster::from_staff(&accounts);
    assert_eq!(roster.emails(), ["officer@bani.gov".to_owned()]);
    assert!(roster.contains(" Officer@Bani.gov"));
    assert!(!roster.contains("captain@bani.gov"));
  }
}
