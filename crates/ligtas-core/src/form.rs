//! Intake data and the three capture forms attached during the pipeline.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// ─── Incident type ───────────────────────────────────────────────────────────

/// The kind of incident being reported. Unknown labels are preserved
/// verbatim so older records keep round-tripping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncidentType {
  PhysicalAbuse,
  Rape,
  Neglect,
  Other(String),
}

impl IncidentType {
  pub fn as_str(&self) -> &str {
    match self {
      Self::PhysicalAbuse => "Physical Abuse",
      Self::Rape => "Rape",
      Self::Neglect => "Neglect",
      Self::Other(s) => s,
    }
  }
}

impl Default for IncidentType {
  fn default() -> Self { Self::Other(String::new()) }
}

impl From<String> for IncidentType {
  fn from(s: String) -> Self {
    match s.trim() {
      "Physical Abuse" => Self::PhysicalAbuse,
      "Rape" => Self::Rape,
      "Neglect" => Self::Neglect,
      other => Self::Other(other.to_owned()),
    }
  }
}

impl From<&str> for IncidentType {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<IncidentType> for String {
  fn from(t: IncidentType) -> Self {
    match t {
      IncidentType::Other(s) => s,
      known => known.as_str().to_owned(),
    }
  }
}

impl fmt::Display for IncidentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Validators ──────────────────────────────────────────────────────────────

fn not_blank(value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    let mut err = ValidationError::new("required");
    err.message = Some("This field is required.".into());
    return Err(err);
  }
  Ok(())
}

fn incident_given(value: &IncidentType) -> Result<(), ValidationError> {
  not_blank(value.as_str())
}

// ─── Intake ──────────────────────────────────────────────────────────────────

/// The intake details captured when a report is filed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IntakeForm {
  /// Name of the person filing the report.
  #[validate(custom(function = "not_blank"))]
  pub reportee:               String,
  pub reportee_address:       String,
  /// The child's name.
  #[validate(custom(function = "not_blank"))]
  pub name:                   String,
  pub alias:                  String,
  #[validate(range(
    min = 1,
    max = 18,
    message = "Age is required and the child must be 18 or younger."
  ))]
  pub age:                    u8,
  #[validate(length(equal = 11, message = "Mobile number must be 11 digits."))]
  pub contact:                String,
  #[validate(custom(function = "incident_given"))]
  pub incident_type:          IncidentType,
  pub place_of_birth:         String,
  pub date_of_birth:          Option<NaiveDate>,
  pub religion:               String,
  pub disability:             String,
  /// Identifying marks.
  pub marks:                  String,
  /// The barangay the incident belongs to.
  #[validate(custom(function = "not_blank"))]
  pub address:                String,
  pub permanent_address:      String,
  pub educational_attainment: String,
  pub school_attended:        String,
  pub school_address:         String,
  #[validate(custom(function = "not_blank"))]
  pub sex:                    String,
  pub civil_status:           String,
}

/// One row of the family or household composition tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberRecord {
  pub name:         String,
  pub age:          String,
  pub relationship: String,
  pub status:       String,
  pub address:      String,
  pub education:    String,
  pub occupation:   String,
  pub income:       String,
  pub remarks:      String,
}

impl MemberRecord {
  pub fn is_blank(&self) -> bool {
    [
      &self.name,
      &self.age,
      &self.relationship,
      &self.status,
      &self.address,
      &self.education,
      &self.occupation,
      &self.income,
      &self.remarks,
    ]
    .iter()
    .all(|f| f.trim().is_empty())
  }
}

// ─── Capture forms ───────────────────────────────────────────────────────────

/// Referral form captured on `assigned → Under Investigation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralForm {
  pub user_name:          String,
  pub user_address:       String,
  pub contact_number:     String,
  pub referral_reason:    String,
  pub referral_date:      Option<NaiveDate>,
  pub client_category:    String,
  pub offense_date:       Option<NaiveDate>,
  pub offense_place:      String,
  pub apprehension_date:  Option<NaiveDate>,
  pub apprehension_place: String,
  pub apprehended_by:     String,
  pub agency_address:     String,
  pub agency_contact:     String,
}

impl Default for ReferralForm {
  fn default() -> Self {
    Self {
      user_name:          String::new(),
      user_address:       String::new(),
      contact_number:     String::new(),
      referral_reason:    String::new(),
      referral_date:      None,
      client_category:    "Minor".to_owned(),
      offense_date:       None,
      offense_place:      String::new(),
      apprehension_date:  None,
      apprehension_place: String::new(),
      apprehended_by:     String::new(),
      agency_address:     String::new(),
      agency_contact:     String::new(),
    }
  }
}

impl ReferralForm {
  /// A referral is empty when the officer supplied nothing beyond the
  /// identity fields that [`prefill`](Self::prefill) copies from the intake.
  pub fn is_empty(&self) -> bool {
    let dates = [self.offense_date, self.apprehension_date];
    [
      &self.referral_reason,
      &self.offense_place,
      &self.apprehension_place,
      &self.apprehended_by,
      &self.agency_address,
      &self.agency_contact,
    ]
    .iter()
    .all(|f| f.trim().is_empty())
      && dates.iter().all(Option::is_none)
  }

  /// Fill blank identifying fields from the intake. Fields the officer
  /// already typed are left alone.
  pub fn prefill(&mut self, intake: &IntakeForm, filed_on: NaiveDate) {
    fill(&mut self.user_name, &intake.name);
    fill(&mut self.user_address, &intake.address);
    fill(&mut self.contact_number, &intake.contact);
    if self.referral_date.is_none() {
      self.referral_date = Some(filed_on);
    }
  }
}

fn fill(slot: &mut String, from: &str) {
  if slot.trim().is_empty() {
    *slot = from.to_owned();
  }
}

/// Investigation form captured on `Under Investigation → In Progress`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigationForm {
  pub officer_report:     String,
  pub child_version:      String,
  pub case_circumstances: String,
}

impl InvestigationForm {
  pub fn is_empty(&self) -> bool {
    self.officer_report.trim().is_empty()
      && self.child_version.trim().is_empty()
      && self.case_circumstances.trim().is_empty()
  }
}

/// Completion form captured on `In Progress → Completed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionForm {
  pub initial_assessment: String,
}

impl CompletionForm {
  pub fn is_empty(&self) -> bool { self.initial_assessment.trim().is_empty() }
}
