//! SQL schema for the Ligtas SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per case. The intake and capture forms are JSON; the columns the
-- list filters touch are copied out of them on every write.
CREATE TABLE IF NOT EXISTS cases (
    case_id         TEXT PRIMARY KEY,
    reference_code  TEXT NOT NULL UNIQUE,
    status          TEXT NOT NULL CHECK (status IN (
                      'review', 'unassigned', 'assigned',
                      'Under Investigation', 'In Progress',
                      'Completed', 'Removed'
                    )),
    version         INTEGER NOT NULL CHECK (version >= 1),
    incident_type   TEXT NOT NULL,
    address         TEXT NOT NULL,
    child_name      TEXT NOT NULL,
    reportee        TEXT NOT NULL,
    assigned        TEXT,
    form_data       TEXT NOT NULL,
    family_data     TEXT NOT NULL DEFAULT '[]',
    household_data  TEXT NOT NULL DEFAULT '[]',
    first_form      TEXT,
    second_form     TEXT,
    complete_form   TEXT,
    file_uploads    TEXT NOT NULL DEFAULT '[]',
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, microseconds
    updated_at      TEXT NOT NULL
);

-- Append-only per-case thread.
CREATE TABLE IF NOT EXISTS chats (
    message_id  TEXT PRIMARY KEY,
    case_id     TEXT NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
    kind        TEXT NOT NULL CHECK (kind IN ('chat', 'file')),
    body        TEXT NOT NULL,
    sender_id   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS news (
    news_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    caption     TEXT NOT NULL,
    images      TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id       TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    full_name      TEXT NOT NULL,
    name           TEXT NOT NULL,
    role           TEXT NOT NULL CHECK (role IN ('admin', 'barangay', 'superadmin')),
    address        TEXT NOT NULL,
    password_hash  TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cases_status_idx   ON cases(status);
CREATE INDEX IF NOT EXISTS cases_assigned_idx ON cases(assigned);
CREATE INDEX IF NOT EXISTS cases_address_idx  ON cases(address);
CREATE INDEX IF NOT EXISTS cases_created_idx  ON cases(created_at);
CREATE INDEX IF NOT EXISTS chats_case_idx     ON chats(case_id, created_at);
CREATE INDEX IF NOT EXISTS news_created_idx   ON news(created_at);

PRAGMA user_version = 1;
";
