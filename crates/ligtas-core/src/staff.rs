//! Staff accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// A session role. `Client` is never stored; it marks reporters who signed
/// in with a reference code.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Client,
  /// Case officer.
  Admin,
  Barangay,
  Superadmin,
}

impl Role {
  pub fn is_staff(self) -> bool { !matches!(self, Self::Client) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffAccount {
  pub staff_id:      Uuid,
  pub email:         String,
  pub full_name:     String,
  pub name:          String,
  pub role:          Role,
  /// The barangay this account serves.
  pub address:       String,
  /// Argon2 PHC string.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

fn staff_role(role: &Role) -> Result<(), validator::ValidationError> {
  if role.is_staff() {
    return Ok(());
  }
  let mut err = validator::ValidationError::new("role");
  err.message = Some("Role must be admin, barangay or superadmin.".into());
  Err(err)
}

/// Payload for creating an account. The password arrives in clear and is
/// hashed before it reaches the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStaff {
  #[validate(email(message = "A valid e-mail is required."))]
  pub email:     String,
  #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
  pub password:  String,
  #[validate(length(min = 1, message = "Full name is required."))]
  pub full_name: String,
  #[validate(length(min = 1, message = "Name is required."))]
  pub name:      String,
  #[validate(custom(function = "staff_role"))]
  pub role:      Role,
  #[validate(length(min = 1, message = "Address is required."))]
  pub address:   String,
}

impl NewStaff {
  /// Separate the clear-text password from the account details.
  pub fn split_password(self) -> (StaffUpdate, String) {
    let details = StaffUpdate {
      email:     self.email,
      full_name: self.full_name,
      name:      self.name,
      role:      self.role,
      address:   self.address,
    };
    (details, self.password)
  }
}

/// Payload for updating an account. Passwords are not changed here.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StaffUpdate {
  #[validate(email(message = "A valid e-mail is required."))]
  pub email:     String,
  #[validate(length(min = 1, message = "Full name is required."))]
  pub full_name: String,
  #[validate(length(min = 1, message = "Name is required."))]
  pub name:      String,
  #[validate(custom(function = "staff_role"))]
  pub role:      Role,
  #[validate(length(min = 1, message = "Address is required."))]
  pub address:   String,
}
