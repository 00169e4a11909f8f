//! Mood entries: the unit a user submits from the log screen.
//!
//! Entries are create-on-submit and never updated or deleted. The stored
//! record always carries the full reason text and author; what a given viewer
//! sees is decided at read time by [`crate::visibility::project`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, category::MoodCategory, visibility::VisibilitySettings};

// ─── MoodValue ───────────────────────────────────────────────────────────────

/// A mood score on the 1–5 scale. Out-of-range values cannot be constructed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct MoodValue(u8);

impl MoodValue {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::MoodOutOfRange(value))
    }
  }

  pub fn get(self) -> u8 { self.0 }

  pub fn label(self) -> &'static str {
    match self.0 {
      1 => "Awful",
      2 => "Bad",
      3 => "Okay",
      4 => "Good",
      _ => "Great",
    }
  }

  pub fn emoji(self) -> &'static str {
    match self.0 {
      1 => "😢",
      2 => "😕",
      3 => "😐",
      4 => "🙂",
      _ => "😄",
    }
  }

  /// Every valid value, lowest first.
  pub fn all() -> impl Iterator<Item = Self> {
    (Self::MIN..=Self::MAX).map(Self)
  }
}

impl TryFrom<i64> for MoodValue {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> { Self::new(value) }
}

impl From<MoodValue> for i64 {
  fn from(value: MoodValue) -> Self { i64::from(value.0) }
}

impl fmt::Display for MoodValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.emoji(), self.label())
  }
}

// ─── MoodContext ─────────────────────────────────────────────────────────────

/// Which part of life the mood relates to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MoodContext {
  Personal,
  Professional,
  Mixed,
}

// ─── Author reference ────────────────────────────────────────────────────────

/// The author of an entry as joined from the users table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
  pub id:       Uuid,
  pub username: String,
}

// ─── MoodEntry ───────────────────────────────────────────────────────────────

/// A stored mood entry with its categories resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
  pub id:             Uuid,
  pub mood_value:     MoodValue,
  pub context:        MoodContext,
  /// When set, the author is never revealed to anyone but themselves.
  pub is_anonymous:   bool,
  /// Short shareable reason; exposure is governed by `visibility`.
  pub reason_summary: Option<String>,
  /// Private note, only ever shown to the author.
  pub note:           Option<String>,
  pub logged_at:      DateTime<Utc>,
  pub visibility:     VisibilitySettings,
  pub categories:     Vec<MoodCategory>,
  pub author:         Option<AuthorRef>,
  pub team_id:        Option<Uuid>,
}

impl MoodEntry {
  pub fn author_id(&self) -> Option<Uuid> { self.author.as_ref().map(|a| a.id) }

  pub fn is_authored_by(&self, user_id: Uuid) -> bool {
    self.author_id() == Some(user_id)
  }
}

// ─── NewMoodEntry ────────────────────────────────────────────────────────────

/// Validated input to [`crate::store::MoodStore::record_entry`].
///
/// Built from a [`crate::validate::MoodEntryForm`]; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewMoodEntry {
  pub author_id:      Option<Uuid>,
  pub team_id:        Option<Uuid>,
  pub mood_value:     MoodValue,
  pub context:        MoodContext,
  pub is_anonymous:   bool,
  pub reason_summary: Option<String>,
  pub note:           Option<String>,
  pub logged_at:      DateTime<Utc>,
  pub visibility:     VisibilitySettings,
  pub category_ids:   Vec<Uuid>,
}

impl NewMoodEntry {
  /// Convenience constructor with every optional field left empty and
  /// `logged_at` set to now.
  pub fn new(author_id: Uuid, mood_value: MoodValue, context: MoodContext) -> Self {
    Self {
      author_id: Some(author_id),
      team_id: None,
      mood_value,
      context,
      is_anonymous: false,
      reason_summary: None,
      note: None,
      logged_at: Utc::now(),
      visibility: VisibilitySettings::default(),
      category_ids: Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn mood_value_bounds() {
    assert!(MoodValue::new(0).is_err());
    assert!(MoodValue::new(6).is_err());
    assert_eq!(MoodValue::new(1).unwrap().get(), 1);
    assert_eq!(MoodValue::new(5).unwrap().label(), "Great");
    assert_eq!(MoodValue::all().count(), 5);
  }

  #[test]
  fn mood_value_rejects_out_of_range_json() {
    assert!(serde_json::from_str::<MoodValue>("7").is_err());
    let v: MoodValue = serde_json::from_str("3").unwrap();
    assert_eq!(v.to_string(), "😐 Okay");
  }

  #[test]
  fn context_text_round_trip() {
    let name: &str = MoodContext::Professional.as_ref();
    assert_eq!(name, "professional");
    assert_eq!(MoodContext::from_str("mixed").unwrap(), MoodContext::Mixed);
    assert!(MoodContext::from_str("Work").is_err());
  }

  #[test]
  fn entry_serialises_camel_case() {
    let author = Uuid::new_v4();
    let entry = MoodEntry {
      id:             Uuid::new_v4(),
      mood_value:     MoodValue::new(4).unwrap(),
      context:        MoodContext::Professional,
      is_anonymous:   false,
      reason_summary: Some("shipped the release".into()),
      note:           None,
      logged_at:      Utc::now(),
      visibility:     VisibilitySettings::default(),
      categories:     vec![],
      author:         Some(AuthorRef { id: author, username: "ada".into() }),
      team_id:        None,
    };

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["moodValue"], 4);
    assert_eq!(json["reasonSummary"], "shipped the release");
    assert_eq!(json["isAnonymous"], false);
    assert!(json.get("loggedAt").is_some());
    assert!(json.get("logged_at").is_none());
    assert_eq!(json["visibility"]["shareGlobally"], false);
    assert_eq!(json["author"]["username"], "ada");
  }
}
