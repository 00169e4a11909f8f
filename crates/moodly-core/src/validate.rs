//! Form validation for everything a user can submit.
//!
//! Validation collects every problem instead of stopping at the first, so a
//! client can mark all offending fields at once.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  category::{NewCategory, slugify},
  entry::{MoodContext, MoodValue, NewMoodEntry},
  team::NewTeam,
  user::NewUser,
  visibility::VisibilitySettings,
};

pub const MAX_REASON_CHARS: usize = 280;
pub const MAX_NOTE_CHARS: usize = 2000;
pub const MAX_CATEGORIES: usize = 8;

/// Tolerated clock skew for client-supplied `loggedAt`.
pub fn max_future_skew() -> Duration { Duration::minutes(5) }

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn push(&mut self, field: &str, message: impl Into<String>) {
    self.0.push(FieldError { field: field.to_owned(), message: message.into() });
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn has(&self, field: &str) -> bool { self.0.iter().any(|e| e.field == field) }

  /// `Ok(value)` if nothing was recorded.
  pub fn finish<T>(self, value: T) -> Result<T, Self> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("validation failed: ")?;
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{} {}", e.field, e.message)?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Trim, drop if empty, and check the length in characters.
fn optional_text(
  errors: &mut ValidationErrors,
  field: &str,
  value: Option<String>,
  max_chars: usize,
) -> Option<String> {
  let trimmed = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())?;
  if trimmed.chars().count() > max_chars {
    errors.push(field, format!("must be at most {max_chars} characters"));
  }
  Some(trimmed)
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    errors.push(field, "is required");
  }
  trimmed.to_owned()
}

// ─── Mood entry form ─────────────────────────────────────────────────────────

/// The log screen's form as submitted, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoodEntryForm {
  pub mood_value:     Option<i64>,
  pub context:        Option<MoodContext>,
  pub is_anonymous:   bool,
  pub reason_summary: Option<String>,
  pub note:           Option<String>,
  pub logged_at:      Option<DateTime<Utc>>,
  pub visibility:     Option<VisibilitySettings>,
  pub category_ids:   Vec<Uuid>,
  pub team_id:        Option<Uuid>,
}

impl MoodEntryForm {
  /// Validate the form on behalf of `author_id`.
  pub fn validate(
    self,
    author_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<NewMoodEntry, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let mood_value = match self.mood_value {
      None => {
        errors.push("moodValue", "is required");
        None
      }
      Some(raw) => match MoodValue::new(raw) {
        Ok(v) => Some(v),
        Err(_) => {
          errors.push("moodValue", "must be between 1 and 5");
          None
        }
      },
    };

    if self.context.is_none() {
      errors.push("context", "is required");
    }

    let reason_summary =
      optional_text(&mut errors, "reasonSummary", self.reason_summary, MAX_REASON_CHARS);
    let note = optional_text(&mut errors, "note", self.note, MAX_NOTE_CHARS);

    if self.category_ids.len() > MAX_CATEGORIES {
      errors.push("categoryIds", format!("at most {MAX_CATEGORIES} categories"));
    }
    let unique: HashSet<_> = self.category_ids.iter().collect();
    if unique.len() != self.category_ids.len() {
      errors.push("categoryIds", "contains duplicates");
    }

    let logged_at = self.logged_at.unwrap_or(now);
    if logged_at > now + max_future_skew() {
      errors.push("loggedAt", "cannot be in the future");
    }

    match (mood_value, self.context) {
      (Some(mood_value), Some(context)) if errors.is_empty() => Ok(NewMoodEntry {
        author_id: Some(author_id),
        team_id: self.team_id,
        mood_value,
        context,
        is_anonymous: self.is_anonymous,
        reason_summary,
        note,
        logged_at,
        visibility: self.visibility.unwrap_or_default(),
        category_ids: self.category_ids,
      }),
      _ => Err(errors),
    }
  }
}

// ─── Admin forms ─────────────────────────────────────────────────────────────

pub fn validate_new_user(input: NewUser) -> Result<NewUser, ValidationErrors> {
  let mut errors = ValidationErrors::default();

  let username = input.username.trim().to_lowercase();
  let len = username.chars().count();
  if !(3..=32).contains(&len) {
    errors.push("username", "must be 3 to 32 characters");
  }
  if !username
    .chars()
    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.-".contains(c))
  {
    errors.push("username", "may only contain a-z, 0-9, '_', '.' and '-'");
  }

  let email = input.email.trim().to_owned();
  let valid_email = matches!(
    email.split_once('@'),
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@')
  );
  if !valid_email {
    errors.push("email", "is not a valid address");
  }

  errors.finish(NewUser { username, email, role: input.role })
}

pub fn validate_new_team(input: NewTeam) -> Result<NewTeam, ValidationErrors> {
  let mut errors = ValidationErrors::default();
  let name = required_text(&mut errors, "name", &input.name);
  errors.finish(NewTeam { name, manager_id: input.manager_id })
}

/// Also fills in the slug from the name when none was supplied.
pub fn validate_new_category(input: NewCategory) -> Result<NewCategory, ValidationErrors> {
  let mut errors = ValidationErrors::default();
  let name = required_text(&mut errors, "name", &input.name);

  let slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    Some(s) => slugify(s),
    None => slugify(&name),
  };
  if slug.is_empty() && !name.is_empty() {
    errors.push("slug", "could not be derived from the name");
  }

  errors.finish(NewCategory { name, slug: Some(slug), ..input })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{category::CategoryType, user::Role};

  fn form(mood: i64) -> MoodEntryForm {
    MoodEntryForm {
      mood_value: Some(mood),
      context: Some(MoodContext::Personal),
      ..Default::default()
    }
  }

  #[test]
  fn minimal_form_is_valid() {
    let now = Utc::now();
    let author = Uuid::new_v4();
    let entry = form(3).validate(author, now).unwrap();
    assert_eq!(entry.author_id, Some(author));
    assert_eq!(entry.logged_at, now);
    assert_eq!(entry.visibility, VisibilitySettings::default());
  }

  #[test]
  fn required_fields_are_reported_together() {
    let errors = MoodEntryForm::default()
      .validate(Uuid::new_v4(), Utc::now())
      .unwrap_err();
    assert!(errors.has("moodValue"));
    assert!(errors.has("context"));
    assert_eq!(errors.0.len(), 2);
  }

  #[test]
  fn mood_out_of_range() {
    let errors = form(9).validate(Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(errors.has("moodValue"));
  }

  #[test]
  fn text_is_trimmed_and_blank_dropped() {
    let mut f = form(4);
    f.reason_summary = Some("  finished the migration \n".into());
    f.note = Some("   ".into());
    let entry = f.validate(Uuid::new_v4(), Utc::now()).unwrap();
    assert_eq!(entry.reason_summary.as_deref(), Some("finished the migration"));
    assert!(entry.note.is_none());
  }

  #[test]
  fn long_reason_rejected() {
    let mut f = form(4);
    f.reason_summary = Some("x".repeat(MAX_REASON_CHARS + 1));
    let errors = f.validate(Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(errors.has("reasonSummary"));
  }

  #[test]
  fn note_capped_at_limit() {
    let mut f = form(4);
    f.note = Some("é".repeat(MAX_NOTE_CHARS));
    assert!(f.validate(Uuid::new_v4(), Utc::now()).is_ok());

    let mut f = form(4);
    f.note = Some("é".repeat(MAX_NOTE_CHARS + 1));
    let errors = f.validate(Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(errors.has("note"));
  }

  #[test]
  fn category_count_capped() {
    let mut f = form(4);
    f.category_ids = (0..MAX_CATEGORIES).map(|_| Uuid::new_v4()).collect();
    assert!(f.validate(Uuid::new_v4(), Utc::now()).is_ok());

    let mut f = form(4);
    f.category_ids = (0..=MAX_CATEGORIES).map(|_| Uuid::new_v4()).collect();
    let errors = f.validate(Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(errors.has("categoryIds"));
  }

  #[test]
  fn duplicate_categories_rejected() {
    let id = Uuid::new_v4();
    let mut f = form(4);
    f.category_ids = vec![id, id];
    let errors = f.validate(Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(errors.has("categoryIds"));
  }

  #[test]
  fn future_timestamp_rejected_beyond_skew() {
    let now = Utc::now();
    let mut ok = form(4);
    ok.logged_at = Some(now + Duration::minutes(1));
    assert!(ok.validate(Uuid::new_v4(), now).is_ok());

    let mut late = form(4);
    late.logged_at = Some(now + Duration::hours(1));
    assert!(late.validate(Uuid::new_v4(), now).unwrap_err().has("loggedAt"));
  }

  #[test]
  fn form_accepts_camel_case_json() {
    let f: MoodEntryForm = serde_json::from_str(
      r#"{"moodValue":5,"context":"mixed","isAnonymous":true,"reasonSummary":"sun"}"#,
    )
    .unwrap();
    let entry = f.validate(Uuid::new_v4(), Utc::now()).unwrap();
    assert!(entry.is_anonymous);
    assert_eq!(entry.context, MoodContext::Mixed);
  }

  #[test]
  fn user_validation() {
    assert!(validate_new_user(NewUser::new("Ada.L", "ada@example.com", Role::Hr)).is_ok());
    let errors =
      validate_new_user(NewUser::new("a b", "nope", Role::Employee)).unwrap_err();
    assert!(errors.has("username"));
    assert!(errors.has("email"));
  }

  #[test]
  fn category_slug_derived() {
    let cat = validate_new_category(NewCategory::new(" Focus work ", CategoryType::Activity))
      .unwrap();
    assert_eq!(cat.name, "Focus work");
    assert_eq!(cat.slug.as_deref(), Some("focus-work"));
    assert!(validate_new_category(NewCategory::new("  ", CategoryType::Emotion)).is_err());
  }

  #[test]
  fn display_joins_fields() {
    let mut errors = ValidationErrors::default();
    errors.push("a", "is required");
    errors.push("b", "is bad");
    assert_eq!(errors.to_string(), "validation failed: a is required; b is bad");
  }
}
