//! Mood categories: the taxonomy tags attached to entries.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// The facet of the taxonomy a category belongs to.
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
pub enum CategoryType {
  /// What the user feels (e.g. "anxious", "grateful").
  Emotion,
  /// What caused it (e.g. "workload", "family").
  Trigger,
  /// What the user was doing (e.g. "meeting", "exercise").
  Activity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodCategory {
  pub id:    Uuid,
  pub name:  String,
  pub slug:  String,
  #[serde(rename = "type")]
  pub kind:  CategoryType,
  pub icon:  Option<String>,
  /// Display position within its type; lower sorts first.
  pub order: i32,
}

/// Input to [`crate::store::MoodStore::create_category`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
  pub name:  String,
  /// Derived from `name` when absent.
  #[serde(default)]
  pub slug:  Option<String>,
  #[serde(rename = "type")]
  pub kind:  CategoryType,
  #[serde(default)]
  pub icon:  Option<String>,
  #[serde(default)]
  pub order: i32,
}

impl NewCategory {
  pub fn new(name: impl Into<String>, kind: CategoryType) -> Self {
    Self { name: name.into(), slug: None, kind, icon: None, order: 0 }
  }

  pub fn with_icon(mut self, icon: &str) -> Self {
    self.icon = Some(icon.to_owned());
    self
  }

  pub fn with_order(mut self, order: i32) -> Self {
    self.order = order;
    self
  }
}

/// Turn a display name into a URL-safe slug: lowercase ASCII alphanumerics
/// with every other run of characters collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  let mut pending_dash = false;
  for c in name.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c.to_ascii_lowercase());
    } else {
      pending_dash = true;
    }
  }
  slug
}

/// The taxonomy a fresh install starts with.
pub fn default_categories() -> Vec<NewCategory> {
  use CategoryType::*;

  let emotions = [
    ("Happy", "😊"),
    ("Grateful", "🙏"),
    ("Calm", "😌"),
    ("Anxious", "😰"),
    ("Frustrated", "😤"),
    ("Sad", "😢"),
    ("Tired", "😴"),
  ];
  let triggers = [
    ("Workload", "📚"),
    ("Team", "👥"),
    ("Family", "🏠"),
    ("Health", "🩺"),
    ("Recognition", "🏆"),
  ];
  let activities = [
    ("Meeting", "🗓️"),
    ("Focus work", "💻"),
    ("Exercise", "🏃"),
    ("Break", "☕"),
  ];

  let mut all = Vec::new();
  for (kind, items) in [
    (Emotion, &emotions[..]),
    (Trigger, &triggers[..]),
    (Activity, &activities[..]),
  ] {
    for (order, (name, icon)) in items.iter().enumerate() {
      all.push(
        NewCategory::new(*name, kind)
          .with_icon(icon)
          .with_order(order as i32),
      );
    }
  }
  all
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn slugify_collapses_separators() {
    assert_eq!(slugify("Focus work"), "focus-work");
    assert_eq!(slugify("  Team -- Lunch!  "), "team-lunch");
    assert_eq!(slugify("Café"), "caf");
  }

  #[test]
  fn default_slugs_are_unique() {
    let defaults = default_categories();
    let slugs: HashSet<_> = defaults.iter().map(|c| slugify(&c.name)).collect();
    assert_eq!(slugs.len(), defaults.len());
  }

  #[test]
  fn category_type_serialises_as_type_field() {
    let json = serde_json::to_value(NewCategory::new("Calm", CategoryType::Emotion))
      .unwrap();
    assert_eq!(json["type"], "emotion");
  }
}
