//! Process-level wiring for the Ligtas server: configuration, the outer
//! router and first-run bootstrap.

use std::path::PathBuf;

use axum::{Router, routing::get};
use ligtas_api::{ApiState, api_router};
use ligtas_core::{
  staff::{Role, StaffUpdate},
  store::{CaseStore, StoreError},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Shortest accepted session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Runtime configuration, read from `config.toml` and `LIGTAS_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  pub store_path:              PathBuf,
  /// HMAC key for session tokens.
  pub session_secret:          String,
  pub session_ttl_hours:       i64,
  /// Offset of the field office from UTC. Report months start at its
  /// midnight.
  pub office_utc_offset_hours: i32,
  /// Superadmin account created on first start if no account holds this
  /// e-mail yet.
  pub bootstrap_email:         Option<String>,
  /// Argon2 PHC string for the bootstrap account.
  pub bootstrap_password_hash: Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    "127.0.0.1".into(),
      port:                    8080,
      store_path:              PathBuf::from("ligtas.db"),
      session_secret:          String::new(),
      session_ttl_hours:       12,
      office_utc_offset_hours: ligtas_api::DEFAULT_OFFICE_OFFSET_HOURS,
      bootstrap_email:         None,
      bootstrap_password_hash: None,
    }
  }
}

impl ServerConfig {
  /// Refuse settings the server cannot run safely with.
  pub fn check(&self) -> anyhow::Result<()> {
    anyhow::ensure!(
      self.session_secret.len() >= MIN_SECRET_LEN,
      "session_secret must be at least {MIN_SECRET_LEN} bytes"
    );
    anyhow::ensure!(self.session_ttl_hours > 0, "session_ttl_hours must be positive");
    anyhow::ensure!(
      self.office_offset().is_some(),
      "office_utc_offset_hours must lie between -23 and 23"
    );
    anyhow::ensure!(
      self.bootstrap_email.is_some() == self.bootstrap_password_hash.is_some(),
      "bootstrap_email and bootstrap_password_hash must be set together"
    );
    Ok(())
  }

  pub fn session_ttl(&self) -> chrono::Duration {
    chrono::Duration::hours(self.session_ttl_hours)
  }

  pub fn office_offset(&self) -> Option<chrono::FixedOffset> {
    ligtas_api::office_offset(self.office_utc_offset_hours)
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, a health probe, request
/// tracing.
pub fn app<S>(state: ApiState<S>) -> Router
where
  S: CaseStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

/// Make sure the configured superadmin exists. Returns `true` if an account
/// was created.
pub async fn bootstrap_superadmin<S>(store: &S, config: &ServerConfig) -> anyhow::Result<bool>
where
  S: CaseStore,
{
  let (Some(email), Some(hash)) = (&config.bootstrap_email, &config.bootstrap_password_hash)
  else {
    return Ok(false);
  };

  let existing = store.find_staff_by_email(email).await.map_err(store_error)?;
  if existing.is_some() {
    return Ok(false);
  }

  let details = StaffUpdate {
    email:     email.trim().to_owned(),
    full_name: "Superadmin".into(),
    name:      "Superadmin".into(),
    role:      Role::Superadmin,
    address:   String::new(),
  };
  store.create_staff(details, hash.clone()).await.map_err(store_error)?;
  tracing::info!(%email, "bootstrap superadmin created");
  Ok(true)
}

fn store_error<E: StoreError>(e: E) -> anyhow::Error { anyhow::Error::new(e) }
