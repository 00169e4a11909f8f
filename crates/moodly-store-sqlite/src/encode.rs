//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that text
//! comparison orders them chronologically. Enums are stored as their
//! lowercase names. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use moodly_core::{
  category::MoodCategory,
  entry::{AuthorRef, MoodEntry, MoodValue},
  team::Team,
  user::BasicUser,
  visibility::VisibilitySettings,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The lowercase name an enum is stored under.
pub fn encode_enum<T: AsRef<str>>(value: T) -> String { value.as_ref().to_owned() }

/// Parse a lowercase enum name written by [`encode_enum`].
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::UnknownVariant { column, value: s.to_owned() })
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "u.id, u.username, u.email, u.role";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:       String,
  pub username: String,
  pub email:    String,
  pub role:     String,
}

impl RawUser {
  /// Read the columns listed in [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:       row.get(0)?,
      username: row.get(1)?,
      email:    row.get(2)?,
      role:     row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<BasicUser> {
    Ok(BasicUser {
      id:       decode_uuid(&self.id)?,
      username: self.username,
      email:    self.email,
      role:     decode_enum("role", &self.role)?,
    })
  }
}

// ─── Teams ───────────────────────────────────────────────────────────────────

pub const TEAM_COLUMNS: &str = "t.id, t.name, t.manager_id";

pub struct RawTeam {
  pub id:         String,
  pub name:       String,
  pub manager_id: Option<String>,
}

impl RawTeam {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, name: row.get(1)?, manager_id: row.get(2)? })
  }

  pub fn into_team(self) -> Result<Team> {
    Ok(Team {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      manager_id: decode_opt_uuid(self.manager_id)?,
    })
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub const CATEGORY_COLUMNS: &str = "c.id, c.name, c.slug, c.type, c.icon, c.sort_order";

pub struct RawCategory {
  pub id:         String,
  pub name:       String,
  pub slug:       String,
  pub kind:       String,
  pub icon:       Option<String>,
  pub sort_order: i32,
}

impl RawCategory {
  /// Read [`CATEGORY_COLUMNS`] starting at column `start`.
  pub fn from_row_at(row: &rusqlite::Row<'_>, start: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(start)?,
      name:       row.get(start + 1)?,
      slug:       row.get(start + 2)?,
      kind:       row.get(start + 3)?,
      icon:       row.get(start + 4)?,
      sort_order: row.get(start + 5)?,
    })
  }

  pub fn into_category(self) -> Result<MoodCategory> {
    Ok(MoodCategory {
      id:    decode_uuid(&self.id)?,
      name:  self.name,
      slug:  self.slug,
      kind:  decode_enum("type", &self.kind)?,
      icon:  self.icon,
      order: self.sort_order,
    })
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// Selected from `mood_entries e LEFT JOIN users a ON a.id = e.author_id`.
pub const ENTRY_COLUMNS: &str = "e.id, e.author_id, a.username, e.team_id, e.mood_value,
  e.context, e.is_anonymous, e.reason_summary, e.note, e.logged_at,
  e.peers_visibility, e.managers_visibility, e.hr_visibility,
  e.share_globally, e.custom_recipients";

/// Raw values read directly from a `mood_entries` row joined with its author.
pub struct RawEntry {
  pub id:                  String,
  pub author_id:           Option<String>,
  pub author_username:     Option<String>,
  pub team_id:             Option<String>,
  pub mood_value:          i64,
  pub context:             String,
  pub is_anonymous:        bool,
  pub reason_summary:      Option<String>,
  pub note:                Option<String>,
  pub logged_at:           String,
  pub peers_visibility:    String,
  pub managers_visibility: String,
  pub hr_visibility:       String,
  pub share_globally:      bool,
  pub custom_recipients:   bool,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      author_id:           row.get(1)?,
      author_username:     row.get(2)?,
      team_id:             row.get(3)?,
      mood_value:          row.get(4)?,
      context:             row.get(5)?,
      is_anonymous:        row.get(6)?,
      reason_summary:      row.get(7)?,
      note:                row.get(8)?,
      logged_at:           row.get(9)?,
      peers_visibility:    row.get(10)?,
      managers_visibility: row.get(11)?,
      hr_visibility:       row.get(12)?,
      share_globally:      row.get(13)?,
      custom_recipients:   row.get(14)?,
    })
  }

  pub fn into_entry(self, categories: Vec<MoodCategory>) -> Result<MoodEntry> {
    let author = match (self.author_id, self.author_username) {
      (Some(id), Some(username)) => Some(AuthorRef { id: decode_uuid(&id)?, username }),
      _ => None,
    };

    Ok(MoodEntry {
      id: decode_uuid(&self.id)?,
      mood_value: MoodValue::new(self.mood_value)?,
      context: decode_enum("context", &self.context)?,
      is_anonymous: self.is_anonymous,
      reason_summary: self.reason_summary,
      note: self.note,
      logged_at: decode_dt(&self.logged_at)?,
      visibility: VisibilitySettings {
        peers:             decode_enum("peers_visibility", &self.peers_visibility)?,
        managers:          decode_enum("managers_visibility", &self.managers_visibility)?,
        hr:                decode_enum("hr_visibility", &self.hr_visibility)?,
        share_globally:    self.share_globally,
        custom_recipients: self.custom_recipients,
      },
      categories,
      author,
      team_id: decode_opt_uuid(self.team_id)?,
    })
  }
}
