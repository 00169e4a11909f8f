//! The viewer's own views: profile and mood history.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Profile summary over every entry the viewer logged |
//! | `GET`  | `/history` | Own entries grouped by day; `?days`, `?offsetMinutes` |

use axum::extract::State;
use chrono::Utc;
use moodly_core::{
  history::{HistoryView, ProfileSummary, local_date, window_start},
  store::{EntryQuery, MoodStore},
};

use crate::{
  ApiState, Viewer, WindowParams,
  error::ApiError,
  extract::{Json, Query},
};

/// `GET /me[?offsetMinutes=..]`
pub async fn me<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Query(params): Query<WindowParams>,
) -> Result<Json<ProfileSummary>, ApiError>
where
  S: MoodStore + 'static,
{
  let offset = params.offset();
  let teams = state
    .store
    .teams_for_user(viewer.id())
    .await
    .map_err(ApiError::store)?;
  let query = EntryQuery::by_author(viewer.id());
  let entries = state
    .store
    .list_entries(&query)
    .await
    .map_err(ApiError::store)?;

  let today = local_date(Utc::now(), offset);
  Ok(Json(ProfileSummary::build(
    viewer.0.user,
    teams,
    &entries,
    today,
    offset,
  )))
}

/// `GET /history[?days=..][&offsetMinutes=..]`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Query(params): Query<WindowParams>,
) -> Result<Json<HistoryView>, ApiError>
where
  S: MoodStore + 'static,
{
  let offset = params.offset();
  let days = params.days_or(state.window_days);
  let today = local_date(Utc::now(), offset);

  let query = EntryQuery::by_author(viewer.id()).since(window_start(today, days, offset));
  let entries = state
    .store
    .list_entries(&query)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(HistoryView::build(entries, today, offset)))
}
