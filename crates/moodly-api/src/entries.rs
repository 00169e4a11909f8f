//! Handlers for the feed and `/entries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/feed` | Optional `limit`, `offset`, `context`, `teamId`; projected for the viewer |
//! | `POST` | `/entries` | Body: [`MoodEntryForm`]; returns 201 + the author's view |
//! | `GET`  | `/entries/:id` | 404 if absent or not visible to the viewer |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use moodly_core::{
  entry::MoodContext,
  store::{EntryQuery, MoodStore},
  validate::MoodEntryForm,
  visibility::{EntryView, project, project_all},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState, Viewer,
  error::ApiError,
  extract::{Json, Path, Query},
};

pub const DEFAULT_FEED_LIMIT: usize = 50;
pub const MAX_FEED_LIMIT: usize = 200;

// ─── Feed ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
  pub limit:   Option<usize>,
  #[serde(default)]
  pub offset:  usize,
  pub context: Option<MoodContext>,
  pub team_id: Option<Uuid>,
}

/// `GET /feed[?limit=..][&offset=..][&context=..][&teamId=..]`
///
/// Pagination applies after projection so that hidden entries never consume
/// a page slot.
pub async fn feed<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Query(params): Query<FeedParams>,
) -> Result<Json<Vec<EntryView>>, ApiError>
where
  S: MoodStore + 'static,
{
  // Visibility is decided per entry after loading, so the store cannot page
  // for us; every entry matching the filters is read on each request.
  let query = EntryQuery {
    context: params.context,
    team_id: params.team_id,
    ..EntryQuery::default()
  };
  let entries = state
    .store
    .list_entries(&query)
    .await
    .map_err(ApiError::store)?;

  let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(MAX_FEED_LIMIT);
  let views = project_all(&entries, &viewer.0)
    .into_iter()
    .skip(params.offset)
    .take(limit)
    .collect();
  Ok(Json(views))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /entries`: logs an entry authored by the viewer.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Json(form): Json<MoodEntryForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MoodStore + 'static,
{
  let input = form.validate(viewer.id(), Utc::now())?;
  let entry = state
    .store
    .record_entry(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    entry = %entry.id,
    author = %viewer.id(),
    mood = entry.mood_value.get(),
    "mood entry recorded"
  );

  let view = project(&entry, &viewer.0)
    .ok_or_else(|| ApiError::NotFound(format!("entry {} not found", entry.id)))?;
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /entries/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
) -> Result<Json<EntryView>, ApiError>
where
  S: MoodStore + 'static,
{
  state
    .store
    .get_entry(id)
    .await
    .map_err(ApiError::store)?
    .and_then(|entry| project(&entry, &viewer.0))
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("entry {id} not found")))
}
