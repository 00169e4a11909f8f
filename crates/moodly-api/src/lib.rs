//! JSON REST API for Moodly.
//!
//! Exposes an axum [`Router`] backed by any [`moodly_core::store::MoodStore`].
//! Callers identify themselves with the [`viewer::VIEWER_HEADER`] header;
//! TLS and session handling are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", moodly_api::api_router(ApiState::new(store.clone())))
//! ```

pub mod categories;
pub mod entries;
pub mod error;
pub mod extract;
pub mod history;
pub mod teams;
pub mod users;
pub mod viewer;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use moodly_core::store::MoodStore;
use serde::Deserialize;

pub use error::ApiError;
pub use viewer::Viewer;

/// Window used by `/history` and team dashboards when `?days` is absent.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
/// Longest window a client may ask for.
pub const MAX_WINDOW_DAYS: u32 = 365;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:       Arc<S>,
  pub window_days: u32,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, window_days: DEFAULT_WINDOW_DAYS } }

  pub fn with_window_days(mut self, days: u32) -> Self {
    self.window_days = days.clamp(1, MAX_WINDOW_DAYS);
    self
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), window_days: self.window_days }
  }
}

// ─── Shared query parameters ─────────────────────────────────────────────────

/// `?days=<n>&offsetMinutes=<m>` as accepted by windowed views.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowParams {
  pub days:           Option<u32>,
  /// The client's UTC offset in minutes east, used for calendar days.
  pub offset_minutes: Option<i32>,
}

impl WindowParams {
  pub fn days_or(&self, default: u32) -> u32 {
    self.days.unwrap_or(default).clamp(1, MAX_WINDOW_DAYS)
  }

  pub fn offset(&self) -> chrono::FixedOffset {
    self
      .offset_minutes
      .map(moodly_core::history::offset_from_minutes)
      .unwrap_or_else(moodly_core::history::utc_offset)
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: MoodStore + 'static,
{
  Router::new()
    // Viewer
    .route("/me", get(history::me::<S>))
    .route("/history", get(history::history::<S>))
    // Entries
    .route("/feed", get(entries::feed::<S>))
    .route("/entries", post(entries::create::<S>))
    .route("/entries/{id}", get(entries::get_one::<S>))
    // Teams
    .route("/teams", get(teams::list::<S>).post(teams::create::<S>))
    .route(
      "/teams/{id}/members",
      get(teams::members::<S>).post(teams::add_member::<S>),
    )
    .route("/teams/{id}/dashboard", get(teams::dashboard::<S>))
    // Taxonomy and people
    .route("/categories", get(categories::list::<S>).post(categories::create::<S>))
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .with_state(state)
}
