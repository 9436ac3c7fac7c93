//! Session tokens, the bearer-token extractor and password hashing.
//!
//! Staff sign in with e-mail and password; reporters sign in with their
//! case's reference code. Either way the server hands back an HS256 token
//! and every later request presents it as `Authorization: Bearer <token>`.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::http::{header, request::Parts};
use axum::extract::FromRequestParts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ligtas_core::{
  case::Case,
  staff::{Role, StaffAccount},
  store::{CaseQuery, CaseStore},
  workflow::{Actor, Edge},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Signing material and lifetime for session tokens.
pub struct SessionKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl:      Duration,
}

impl SessionKeys {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      ttl,
    }
  }

  pub fn issue(&self, session: &Session) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
      sub:     session.sub.clone(),
      role:    session.role,
      case_id: session.case_id,
      address: session.address.clone(),
      iat:     now.timestamp() as usize,
      exp:     (now + self.ttl).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &self.encoding)
      .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
  }

  pub fn verify(&self, token: &str) -> Result<Session, ApiError> {
    let data = decode::<Claims>(token, &self.decoding, &Validation::default())
      .map_err(|_| ApiError::Unauthorized("invalid or expired session token".into()))?;
    Ok(data.claims.into())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Staff e-mail, or the case id for a reporter.
  pub sub:     String,
  pub role:    Role,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub case_id: Option<Uuid>,
  /// The barangay a barangay official serves.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  pub iat:     usize,
  pub exp:     usize,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub sub:     String,
  pub role:    Role,
  pub case_id: Option<Uuid>,
  pub address: Option<String>,
}

impl From<Claims> for Session {
  fn from(c: Claims) -> Self {
    Self { sub: c.sub, role: c.role, case_id: c.case_id, address: c.address }
  }
}

fn same(a: &str, b: &str) -> bool { a.trim().eq_ignore_ascii_case(b.trim()) }

impl Session {
  pub fn staff(account: &StaffAccount) -> Self {
    Self {
      sub:     account.email.clone(),
      role:    account.role,
      case_id: None,
      address: Some(account.address.clone()),
    }
  }

  pub fn client(case_id: Uuid) -> Self {
    Self {
      sub:     case_id.to_string(),
      role:    Role::Client,
      case_id: Some(case_id),
      address: None,
    }
  }

  /// Fail with 403 unless the caller holds one of `roles`.
  pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&self.role) {
      Ok(())
    } else {
      Err(ApiError::Forbidden(format!("{} accounts cannot do this", self.role)))
    }
  }

  /// The staff e-mail, for staff sessions.
  pub fn email(&self) -> Option<&str> {
    self.role.is_staff().then_some(self.sub.as_str())
  }

  fn serves(&self, case: &Case) -> bool {
    self.address.as_deref().is_some_and(|a| same(a, &case.form_data.address))
  }

  fn holds(&self, case: &Case) -> bool {
    case.assigned.as_deref().is_some_and(|a| same(a, &self.sub))
  }

  /// Whether the caller may read `case` and its thread.
  pub fn can_view(&self, case: &Case) -> bool {
    match self.role {
      Role::Superadmin => true,
      Role::Admin => self.holds(case),
      Role::Barangay => self.serves(case),
      Role::Client => self.case_id == Some(case.case_id),
    }
  }

  /// Whether the caller may drive `edge` on `case`.
  pub fn can_drive(&self, edge: &Edge, case: &Case) -> bool {
    edge.actors.iter().any(|actor| match actor {
      Actor::Superadmin => self.role == Role::Superadmin,
      Actor::AssignedOfficer => self.role == Role::Admin && self.holds(case),
      Actor::Barangay => self.role == Role::Barangay && self.serves(case),
    })
  }

  /// Narrow a case listing to what the caller may see.
  pub fn scope(&self, query: &mut CaseQuery) -> Result<(), ApiError> {
    match self.role {
      Role::Superadmin => {}
      Role::Admin => query.assigned = Some(self.sub.clone()),
      Role::Barangay => query.address = self.address.clone(),
      Role::Client => return Err(ApiError::Forbidden("staff only".into())),
    }
    Ok(())
  }
}

impl<S> FromRequestParts<ApiState<S>> for Session
where
  S: CaseStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
    state.sessions.verify(token.trim())
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

/// Run argon2 off the async runtime.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
}

pub async fn verify_password_blocking(password: String, phc: String) -> Result<bool, ApiError> {
  tokio::task::spawn_blocking(move || verify_password(&password, &phc))
    .await
    .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
  use ligtas_core::{status::CaseStatus, workflow::find_edge};

  use super::*;

  fn keys() -> SessionKeys {
    SessionKeys::new(b"0123456789abcdef0123456789abcdef", Duration::hours(1))
  }

  fn case_in(address: &str, assigned: Option<&str>) -> Case {
    let form_data = ligtas_core::form::IntakeForm {
      address: address.into(),
      ..Default::default()
    };
    let mut case = Case::open(
      Uuid::new_v4(),
      ligtas_core::case::NewCase { form_data, ..Default::default() },
      Utc::now(),
    );
    case.assigned = assigned.map(str::to_owned);
    case
  }

  fn staff(role: Role, email: &str, address: &str) -> Session {
    Session {
      sub: email.into(),
      role,
      case_id: None,
      address: Some(address.into()),
    }
  }

  #[test]
  fn token_round_trips() {
    let k = keys();
    let session = Session::client(Uuid::new_v4());
    let token = k.issue(&session).unwrap();
    assert_eq!(k.verify(&token).unwrap(), session);
  }

  #[test]
  fn foreign_signature_is_refused() {
    let other = SessionKeys::new(b"another-secret-another-secret-xx", Duration::hours(1));
    let token = other.issue(&Session::client(Uuid::new_v4())).unwrap();
    assert!(matches!(keys().verify(&token), Err(ApiError::Unauthorized(_))));
  }

  #[test]
  fn expired_token_is_refused() {
    let k = SessionKeys::new(b"0123456789abcdef0123456789abcdef", Duration::hours(-2));
    let token = k.issue(&Session::client(Uuid::new_v4())).unwrap();
    assert!(k.verify(&token).is_err());
  }

  #[test]
  fn visibility_by_role() {
    let case = case_in("Poblacion", Some("officer@bani.gov"));
    assert!(staff(Role::Admin, "Officer@bani.gov", "x").can_view(&case));
    assert!(!staff(Role::Admin, "other@bani.gov", "x").can_view(&case));
    assert!(staff(Role::Barangay, "cap@bani.gov", "poblacion").can_view(&case));
    assert!(!staff(Role::Barangay, "cap@bani.gov", "Tiep").can_view(&case));
    assert!(staff(Role::Superadmin, "chief@bani.gov", "").can_view(&case));
    assert!(Session::client(case.case_id).can_view(&case));
    assert!(!Session::client(Uuid::new_v4()).can_view(&case));
  }

  #[test]
  fn edge_actors_are_enforced() {
    let case = case_in("Poblacion", Some("officer@bani.gov"));
    let validate = find_edge(CaseStatus::Review, CaseStatus::Unassigned).unwrap();
    let refer = find_edge(CaseStatus::Assigned, CaseStatus::UnderInvestigation).unwrap();
    let assign = find_edge(CaseStatus::Unassigned, CaseStatus::Assigned).unwrap();

    let captain = staff(Role::Barangay, "cap@bani.gov", "Poblacion");
    let officer = staff(Role::Admin, "officer@bani.gov", "Poblacion");
    let chief = staff(Role::Superadmin, "chief@bani.gov", "");

    assert!(captain.can_drive(validate, &case));
    assert!(!captain.can_drive(refer, &case));
    assert!(officer.can_drive(refer, &case));
    assert!(!officer.can_drive(assign, &case));
    assert!(chief.can_drive(assign, &case));
    assert!(!Session::client(case.case_id).can_drive(validate, &case));
  }

  #[test]
  fn passwords_verify() {
    let phc = hash_password("correct horse").unwrap();
    assert!(verify_password("correct horse", &phc));
    assert!(!verify_password("wrong", &phc));
    assert!(!verify_password("anything", "not a phc string"));
  }
}
