//! [`SqliteStore`], the SQLite implementation of [`CaseStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use ligtas_core::{
  case::{Case, NewCase, clean_refs},
  chat::{ChatMessage, NewChatMessage},
  form::IntakeForm,
  news::{NewNews, NewsItem},
  reference::ReferenceCode,
  staff::{Role, StaffAccount, StaffUpdate},
  store::{CaseQuery, CaseStore, DEFAULT_LIMIT},
  workflow::TransitionRequest,
};

use crate::{
  Error, Result,
  encode::{
    CASE_COLUMNS, CHAT_COLUMNS, NEWS_COLUMNS, RawCase, RawChat, RawNews, RawStaff,
    STAFF_COLUMNS, encode_dt, encode_images, encode_uuid, now,
  },
  schema::SCHEMA,
};

/// How many fresh case ids to try before giving up on a unique reference
/// code.
const MAX_CODE_ATTEMPTS: usize = 8;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ligtas case store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

enum WriteOutcome {
  Written,
  Stale,
  Missing,
}

/// A `LIKE` pattern matching `text` anywhere, with `\`, `%` and `_` taken
/// literally. Pair it with `ESCAPE '\'`.
fn contains_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

fn insert_case(conn: &rusqlite::Connection, raw: &RawCase) -> rusqlite::Result<bool> {
  let result = conn.execute(
    &format!(
      "INSERT INTO cases ({CASE_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
               ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
    ),
    rusqlite::params![
      raw.case_id,
      raw.reference_code,
      raw.status,
      raw.version,
      raw.incident_type,
      raw.address,
      raw.child_name,
      raw.reportee,
      raw.assigned,
      raw.form_data,
      raw.family_data,
      raw.household_data,
      raw.first_form,
      raw.second_form,
      raw.complete_form,
      raw.file_uploads,
      raw.created_at,
      raw.updated_at,
    ],
  );
  match result {
    Ok(_) => Ok(true),
    Err(e) if is_unique_violation(&e) => Ok(false),
    Err(e) => Err(e),
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// File a case, drawing ids from `draw` until one yields a reference code
  /// nobody holds.
  pub(crate) async fn create_case_drawing(
    &self,
    input: NewCase,
    mut draw: impl FnMut() -> Uuid + Send,
  ) -> Result<Case> {
    let mut case = Case::open(draw(), input, now());

    for _ in 0..MAX_CODE_ATTEMPTS {
      let raw = RawCase::from_case(&case)?;
      let inserted = self
        .conn
        .call(move |conn| Ok(insert_case(conn, &raw)?))
        .await?;

      if inserted {
        tracing::info!(
          case_id = %case.case_id,
          reference_code = %case.reference_code,
          "case filed"
        );
        return Ok(case);
      }

      tracing::debug!(
        reference_code = %case.reference_code,
        "reference code already taken, drawing a new case id"
      );
      let id = draw();
      case.case_id = id;
      case.reference_code = ReferenceCode::derive(id);
    }

    Err(Error::ReferenceCodeExhausted)
  }

  async fn load_case(&self, id: Uuid) -> Result<Case> {
    self.get_case(id).await?.ok_or(Error::CaseNotFound(id))
  }

  /// Load a case and check it is still at `expected`.
  async fn load_at(&self, id: Uuid, expected: i64) -> Result<Case> {
    let case = self.load_case(id).await?;
    if case.version != expected {
      return Err(Error::VersionConflict { case_id: id, expected });
    }
    Ok(case)
  }

  /// Write every mutable column of `case` in one statement, provided the
  /// row is still at `expected`.
  async fn write_back(&self, case: &Case, expected: i64) -> Result<()> {
    let raw = RawCase::from_case(case)?;
    let case_id = case.case_id;

    let outcome = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE cases SET
             status = ?2, version = ?3, incident_type = ?4, address = ?5,
             child_name = ?6, reportee = ?7, assigned = ?8, form_data = ?9,
             family_data = ?10, household_data = ?11, first_form = ?12,
             second_form = ?13, complete_form = ?14, file_uploads = ?15,
             updated_at = ?16
           WHERE case_id = ?1 AND version = ?17",
          rusqlite::params![
            raw.case_id,
            raw.status,
            raw.version,
            raw.incident_type,
            raw.address,
            raw.child_name,
            raw.reportee,
            raw.assigned,
            raw.form_data,
            raw.family_data,
            raw.household_data,
            raw.first_form,
            raw.second_form,
            raw.complete_form,
            raw.file_uploads,
            raw.updated_at,
            expected,
          ],
        )?;
        if changed == 1 {
          return Ok(WriteOutcome::Written);
        }

        let exists = conn
          .query_row(
            "SELECT 1 FROM cases WHERE case_id = ?1",
            rusqlite::params![raw.case_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        Ok(if exists { WriteOutcome::Stale } else { WriteOutcome::Missing })
      })
      .await?;

    match outcome {
      WriteOutcome::Written => Ok(()),
      WriteOutcome::Stale => {
        tracing::warn!(%case_id, expected, "lost a concurrent write");
        Err(Error::VersionConflict { case_id, expected })
      }
      WriteOutcome::Missing => Err(Error::CaseNotFound(case_id)),
    }
  }
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  // ── Cases ─────────────────────────────────────────────────────────────────

  async fn create_case(&self, input: NewCase) -> Result<Case> {
    self.create_case_drawing(input, Uuid::new_v4).await
  }

  async fn get_case(&self, id: Uuid) -> Result<Option<Case>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCase> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?1"),
            rusqlite::params![id_str],
            RawCase::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCase::into_case).transpose()
  }

  async fn find_by_reference(&self, code: &ReferenceCode) -> Result<Option<Case>> {
    let code_str = code.to_string();

    let raw: Option<RawCase> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM cases WHERE reference_code = ?1"),
            rusqlite::params![code_str],
            RawCase::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCase::into_case).transpose()
  }

  async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>> {
    let status        = query.status.map(|s| s.to_string());
    let incident_type = query.incident_type.as_ref().map(|t| t.to_string());
    let assigned      = query.assigned.as_deref().map(|s| s.trim().to_owned());
    let address       = query.address.as_deref().map(|s| s.trim().to_owned());
    let after         = query.created_after.map(encode_dt);
    let before        = query.created_before.map(encode_dt);
    let text_pattern  = query.text.as_deref().map(|t| contains_pattern(t.trim()));
    let hide_removed  = query.hide_removed;
    let limit_val     = query.limit.unwrap_or(DEFAULT_LIMIT) as i64;
    let offset_val    = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawCase> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CASE_COLUMNS} FROM cases
           WHERE (?1 IS NULL OR status = ?1)
             AND (?2 IS NULL OR incident_type = ?2)
             AND (?3 IS NULL OR assigned = ?3 COLLATE NOCASE)
             AND (?4 IS NULL OR address = ?4 COLLATE NOCASE)
             AND (?5 IS NULL OR created_at >= ?5)
             AND (?6 IS NULL OR created_at < ?6)
             AND (?7 IS NULL
                  OR child_name LIKE ?7 ESCAPE '\\'
                  OR reportee LIKE ?7 ESCAPE '\\')
             AND (?8 = 0 OR ?1 IS NOT NULL OR status != 'Removed')
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?9 OFFSET ?10"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              status,
              incident_type,
              assigned,
              address,
              after,
              before,
              text_pattern,
              hide_removed,
              limit_val,
              offset_val,
            ],
            RawCase::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCase::into_case).collect()
  }

  async fn transition(
    &self,
    id: Uuid,
    expected_version: i64,
    request: TransitionRequest,
  ) -> Result<Case> {
    let mut case = self.load_at(id, expected_version).await?;

    let transition = case.plan(request)?;
    let (from, to) = (transition.from, transition.to);
    case.apply(transition, now());
    self.write_back(&case, expected_version).await?;

    tracing::info!(
      case_id = %id,
      %from,
      %to,
      version = case.version,
      assigned = case.assigned.as_deref().unwrap_or(""),
      "case status changed"
    );
    Ok(case)
  }

  async fn correct_intake(
    &self,
    id: Uuid,
    expected_version: i64,
    form: IntakeForm,
  ) -> Result<Case> {
    let mut case = self.load_at(id, expected_version).await?;
    case.correct_intake(form, now());
    self.write_back(&case, expected_version).await?;
    tracing::info!(case_id = %id, version = case.version, "intake corrected");
    Ok(case)
  }

  async fn attach_files(&self, id: Uuid, refs: Vec<String>) -> Result<Case> {
    let refs = clean_refs(refs);
    if refs.is_empty() {
      return self.load_case(id).await;
    }

    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT file_uploads FROM cases WHERE case_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(false);
        };

        let mut uploads: Vec<String> = serde_json::from_str(&current).map_err(|e| {
          rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
          )
        })?;
        uploads.extend(refs);
        let encoded = serde_json::to_string(&uploads)
          .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        tx.execute(
          "UPDATE cases SET file_uploads = ?2, version = version + 1, updated_at = ?3
           WHERE case_id = ?1",
          rusqlite::params![id_str, encoded, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::CaseNotFound(id));
    }
    self.load_case(id).await
  }

  async fn delete_case(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chats WHERE case_id = ?1", rusqlite::params![id_str])?;
        let n =
          tx.execute("DELETE FROM cases WHERE case_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    if deleted {
      tracing::info!(case_id = %id, "case deleted");
    }
    Ok(deleted)
  }

  // ── Chats ─────────────────────────────────────────────────────────────────

  async fn append_chat(
    &self,
    case_id: Uuid,
    sender_id: String,
    message: NewChatMessage,
  ) -> Result<ChatMessage> {
    let (kind, body) = message.into_body();
    let msg = ChatMessage {
      message_id: Uuid::new_v4(),
      case_id,
      kind,
      body,
      sender_id,
      created_at: now(),
    };

    let id_str   = encode_uuid(msg.message_id);
    let case_str = encode_uuid(case_id);
    let kind_str = msg.kind.to_string();
    let body     = msg.body.clone();
    let sender   = msg.sender_id.clone();
    let at_str   = encode_dt(msg.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM cases WHERE case_id = ?1",
            rusqlite::params![case_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO chats (message_id, case_id, kind, body, sender_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, case_str, kind_str, body, sender, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::CaseNotFound(case_id));
    }
    Ok(msg)
  }

  async fn list_chats(
    &self,
    case_id: Uuid,
    after: Option<DateTime<Utc>>,
  ) -> Result<Vec<ChatMessage>> {
    let case_str  = encode_uuid(case_id);
    let after_str = after.map(encode_dt);

    let raws: Vec<RawChat> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHAT_COLUMNS} FROM chats
           WHERE case_id = ?1 AND (?2 IS NULL OR created_at > ?2)
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![case_str, after_str], RawChat::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChat::into_message).collect()
  }

  // ── News ──────────────────────────────────────────────────────────────────

  async fn publish_news(&self, input: NewNews) -> Result<NewsItem> {
    let item = NewsItem {
      news_id:    Uuid::new_v4(),
      title:      input.title.trim().to_owned(),
      caption:    input.caption.trim().to_owned(),
      images:     clean_refs(input.images),
      created_at: now(),
    };

    let id_str     = encode_uuid(item.news_id);
    let title      = item.title.clone();
    let caption    = item.caption.clone();
    let images_str = encode_images(&item.images)?;
    let at_str     = encode_dt(item.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO news (news_id, title, caption, images, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, title, caption, images_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn get_news(&self, id: Uuid) -> Result<Option<NewsItem>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNews> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {NEWS_COLUMNS} FROM news WHERE news_id = ?1"),
            rusqlite::params![id_str],
            RawNews::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawNews::into_news).transpose()
  }

  async fn list_news(&self) -> Result<Vec<NewsItem>> {
    let raws: Vec<RawNews> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NEWS_COLUMNS} FROM news ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawNews::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNews::into_news).collect()
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  async fn create_staff(
    &self,
    input: StaffUpdate,
    password_hash: String,
  ) -> Result<StaffAccount> {
    let account = StaffAccount {
      staff_id: Uuid::new_v4(),
      email: input.email.trim().to_owned(),
      full_name: input.full_name,
      name: input.name,
      role: input.role,
      address: input.address.trim().to_owned(),
      password_hash,
      created_at: now(),
    };

    let id_str    = encode_uuid(account.staff_id);
    let email     = account.email.clone();
    let full_name = account.full_name.clone();
    let name      = account.name.clone();
    let role_str  = account.role.to_string();
    let address   = account.address.clone();
    let hash      = account.password_hash.clone();
    let at_str    = encode_dt(account.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          &format!(
            "INSERT INTO staff ({STAFF_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![id_str, email, full_name, name, role_str, address, hash, at_str],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(account.email));
    }
    tracing::info!(staff_id = %account.staff_id, role = %account.role, "staff account created");
    Ok(account)
  }

  async fn get_staff(&self, id: Uuid) -> Result<Option<StaffAccount>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStaff> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = ?1"),
            rusqlite::params![id_str],
            RawStaff::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStaff::into_staff).transpose()
  }

  async fn find_staff_by_email(&self, email: &str) -> Result<Option<StaffAccount>> {
    let email = email.trim().to_owned();

    let raw: Option<RawStaff> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE email = ?1"),
            rusqlite::params![email],
            RawStaff::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStaff::into_staff).transpose()
  }

  async fn list_staff(&self, roles: &[Role]) -> Result<Vec<StaffAccount>> {
    let roles: Vec<String> = roles.iter().map(Role::to_string).collect();

    let raws: Vec<RawStaff> = self
      .conn
      .call(move |conn| {
        let where_clause = if roles.is_empty() {
          String::new()
        } else {
          let slots: Vec<String> = (1..=roles.len()).map(|i| format!("?{i}")).collect();
          format!("WHERE role IN ({})", slots.join(", "))
        };
        let mut stmt = conn.prepare(&format!(
          "SELECT {STAFF_COLUMNS} FROM staff {where_clause}
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(roles.iter()), RawStaff::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStaff::into_staff).collect()
  }

  async fn update_staff(&self, id: Uuid, update: StaffUpdate) -> Result<StaffAccount> {
    let id_str    = encode_uuid(id);
    let email     = update.email.trim().to_owned();
    let full_name = update.full_name;
    let name      = update.name;
    let role_str  = update.role.to_string();
    let address   = update.address.trim().to_owned();
    let taken     = email.clone();

    let changed: Option<usize> = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "UPDATE staff SET email = ?2, full_name = ?3, name = ?4, role = ?5, address = ?6
           WHERE staff_id = ?1",
          rusqlite::params![id_str, email, full_name, name, role_str, address],
        );
        match result {
          Ok(n) => Ok(Some(n)),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match changed {
      None => Err(Error::EmailTaken(taken)),
      Some(0) => Err(Error::StaffNotFound(id)),
      Some(_) => self.get_staff(id).await?.ok_or(Error::StaffNotFound(id)),
    }
  }

  async fn delete_staff(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM staff WHERE staff_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(n > 0)
  }
}
