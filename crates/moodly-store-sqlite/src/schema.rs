//! SQL schema for the Moodly SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'employee',  -- employee | manager | hr | admin
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teams (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    manager_id  TEXT REFERENCES users(id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    team_id     TEXT NOT NULL REFERENCES teams(id),
    user_id     TEXT NOT NULL REFERENCES users(id),
    joined_at   TEXT NOT NULL,
    PRIMARY KEY (team_id, user_id)
);

CREATE TABLE IF NOT EXISTS mood_categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    type        TEXT NOT NULL,                     -- emotion | trigger | activity
    icon        TEXT,
    sort_order  INTEGER NOT NULL DEFAULT 0
);

-- Entries are create-only. No UPDATE or DELETE is ever issued.
CREATE TABLE IF NOT EXISTS mood_entries (
    id                  TEXT PRIMARY KEY,
    author_id           TEXT REFERENCES users(id),
    team_id             TEXT REFERENCES teams(id),
    mood_value          INTEGER NOT NULL CHECK (mood_value BETWEEN 1 AND 5),
    context             TEXT NOT NULL,             -- personal | professional | mixed
    is_anonymous        INTEGER NOT NULL DEFAULT 0,
    reason_summary      TEXT,
    note                TEXT,
    logged_at           TEXT NOT NULL,             -- RFC 3339 UTC, fixed width
    peers_visibility    TEXT NOT NULL,             -- hidden | anonymized | visible
    managers_visibility TEXT NOT NULL,
    hr_visibility       TEXT NOT NULL,
    share_globally      INTEGER NOT NULL DEFAULT 0,
    custom_recipients   INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mood_entry_categories (
    entry_id    TEXT NOT NULL REFERENCES mood_entries(id),
    category_id TEXT NOT NULL REFERENCES mood_categories(id),
    PRIMARY KEY (entry_id, category_id)
);

CREATE INDEX IF NOT EXISTS mood_entries_author_idx ON mood_entries(author_id);
CREATE INDEX IF NOT EXISTS mood_entries_team_idx   ON mood_entries(team_id);
CREATE INDEX IF NOT EXISTS mood_entries_logged_idx ON mood_entries(logged_at);
CREATE INDEX IF NOT EXISTS team_members_user_idx   ON team_members(user_id);

PRAGMA user_version = 1;
";
