//! The `MoodStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `moodly-store-sqlite`).
//! Higher layers (`moodly-api`, `moodly-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  category::{CategoryType, MoodCategory, NewCategory},
  entry::{MoodContext, MoodEntry, NewMoodEntry},
  team::{NewTeam, Team},
  user::{BasicUser, NewUser, Role},
  visibility::ViewerContext,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`MoodStore::list_entries`]. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  pub author_id: Option<Uuid>,
  /// Entries tagged with this team or written by one of its members.
  pub team_id:   Option<Uuid>,
  pub context:   Option<MoodContext>,
  /// Inclusive lower bound on `logged_at`.
  pub since:     Option<DateTime<Utc>>,
  /// Exclusive upper bound on `logged_at`.
  pub until:     Option<DateTime<Utc>>,
  /// `None` returns every matching row.
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

impl EntryQuery {
  pub fn by_author(author_id: Uuid) -> Self {
    Self { author_id: Some(author_id), ..Self::default() }
  }

  pub fn by_team(team_id: Uuid) -> Self {
    Self { team_id: Some(team_id), ..Self::default() }
  }

  pub fn since(mut self, since: DateTime<Utc>) -> Self {
    self.since = Some(since);
    self
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Classification a backend error exposes so callers can map it to a
/// response without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// A referenced row (user, team, category) does not exist.
  fn is_not_found(&self) -> bool { false }

  /// A uniqueness constraint was violated.
  fn is_conflict(&self) -> bool { false }

  /// The caller may not make this change, e.g. tag an entry with a team
  /// they do not belong to.
  fn is_forbidden(&self) -> bool { false }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Moodly store backend.
///
/// Mood entries are create-only: there is no update or delete.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MoodStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<BasicUser, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<BasicUser>, Self::Error>> + Send + '_;

  /// List users ordered by username, optionally filtered by role.
  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<BasicUser>, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  /// `input.slug` must already be filled in (see
  /// [`crate::validate::validate_new_category`]).
  fn create_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<MoodCategory, Self::Error>> + Send + '_;

  /// Ordered by type, then `order`, then name.
  fn list_categories(
    &self,
    kind: Option<CategoryType>,
  ) -> impl Future<Output = Result<Vec<MoodCategory>, Self::Error>> + Send + '_;

  /// Insert every default category whose slug is not yet taken. Returns how
  /// many were inserted.
  fn ensure_default_categories(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Teams ─────────────────────────────────────────────────────────────

  fn create_team(
    &self,
    input: NewTeam,
  ) -> impl Future<Output = Result<Team, Self::Error>> + Send + '_;

  fn get_team(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Team>, Self::Error>> + Send + '_;

  fn list_teams(&self) -> impl Future<Output = Result<Vec<Team>, Self::Error>> + Send + '_;

  /// Adding an existing member is a no-op.
  fn add_team_member(
    &self,
    team_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_team_members(
    &self,
    team_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BasicUser>, Self::Error>> + Send + '_;

  fn teams_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Team>, Self::Error>> + Send + '_;

  /// Resolve the relationships needed for visibility decisions. Returns
  /// `None` if the user does not exist.
  fn viewer_context(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<ViewerContext>, Self::Error>> + Send + '_;

  // ── Entries ───────────────────────────────────────────────────────────

  /// Persist a validated entry. Fails without writing anything if the
  /// author, team or any category does not exist.
  fn record_entry(
    &self,
    input: NewMoodEntry,
  ) -> impl Future<Output = Result<MoodEntry, Self::Error>> + Send + '_;

  fn get_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MoodEntry>, Self::Error>> + Send + '_;

  fn list_entries<'a>(
    &'a self,
    query: &'a EntryQuery,
  ) -> impl Future<Output = Result<Vec<MoodEntry>, Self::Error>> + Send + 'a;
}
