//! Handlers for `/teams` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/teams` | All teams |
//! | `POST` | `/teams` | Admin only. Body: `{"name":"..","managerId":".."}` |
//! | `GET`  | `/teams/:id/members` | 404 if the team does not exist |
//! | `POST` | `/teams/:id/members` | Admin only. Body: `{"userId":".."}`; idempotent |
//! | `GET`  | `/teams/:id/dashboard` | Team manager, HR or admin; `?days`, `?offsetMinutes` |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use moodly_core::{
  history::{TeamDashboard, local_date, window_start},
  store::{EntryQuery, MoodStore},
  team::{NewTeam, Team},
  user::BasicUser,
  validate::validate_new_team,
  visibility::project_all,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState, Viewer, WindowParams,
  error::ApiError,
  extract::{Json, Path, Query},
};

async fn find_team<S: MoodStore>(store: &S, id: Uuid) -> Result<Team, ApiError> {
  store
    .get_team(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("team {id} not found")))
}

// ─── List / create ───────────────────────────────────────────────────────────

/// `GET /teams`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _viewer: Viewer,
) -> Result<Json<Vec<Team>>, ApiError>
where
  S: MoodStore + 'static,
{
  let teams = state.store.list_teams().await.map_err(ApiError::store)?;
  Ok(Json(teams))
}

/// `POST /teams`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Json(body): Json<NewTeam>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MoodStore + 'static,
{
  viewer.require_admin()?;
  let input = validate_new_team(body)?;
  let team = state
    .store
    .create_team(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(team = %team.id, name = %team.name, "team created");
  Ok((StatusCode::CREATED, Json(team)))
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// `GET /teams/:id/members`
pub async fn members<S>(
  State(state): State<ApiState<S>>,
  _viewer: Viewer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<BasicUser>>, ApiError>
where
  S: MoodStore + 'static,
{
  find_team(state.store.as_ref(), id).await?;
  let members = state
    .store
    .list_team_members(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(members))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberBody {
  pub user_id: Uuid,
}

/// `POST /teams/:id/members`
pub async fn add_member<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
  Json(body): Json<AddMemberBody>,
) -> Result<StatusCode, ApiError>
where
  S: MoodStore + 'static,
{
  viewer.require_admin()?;
  state
    .store
    .add_team_member(id, body.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(team = %id, user = %body.user_id, "team member added");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// `GET /teams/:id/dashboard[?days=..][&offsetMinutes=..]`
///
/// Aggregates only what the viewer may see of each entry, so per-member rows
/// exist only for authors the viewer's audience level reveals.
pub async fn dashboard<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
  Query(params): Query<WindowParams>,
) -> Result<Json<TeamDashboard>, ApiError>
where
  S: MoodStore + 'static,
{
  let team = find_team(state.store.as_ref(), id).await?;
  if !viewer.0.can_view_team(&team) {
    return Err(ApiError::Forbidden(format!(
      "not allowed to view the dashboard of team {id}"
    )));
  }

  let offset = params.offset();
  let days = params.days_or(state.window_days);
  let today = local_date(Utc::now(), offset);

  let members = state
    .store
    .list_team_members(id)
    .await
    .map_err(ApiError::store)?;
  let query = EntryQuery::by_team(id).since(window_start(today, days, offset));
  let entries = state
    .store
    .list_entries(&query)
    .await
    .map_err(ApiError::store)?;
  let views = project_all(&entries, &viewer.0);

  Ok(Json(TeamDashboard::build(
    team,
    members.len(),
    &views,
    today,
    days,
    offset,
  )))
}
