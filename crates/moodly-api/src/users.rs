//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | HR or admin only. Optional `?role=employee\|manager\|hr\|admin` |
//! | `POST` | `/users` | Admin only. Body: [`NewUser`]; 409 on a taken username |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use moodly_core::{
  store::MoodStore,
  user::{BasicUser, NewUser, Role},
  validate::validate_new_user,
};
use serde::Deserialize;

use crate::{
  ApiState, Viewer,
  error::ApiError,
  extract::{Json, Query},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=<role>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<BasicUser>>, ApiError>
where
  S: MoodStore + 'static,
{
  viewer.require_hr()?;
  let users = state
    .store
    .list_users(params.role)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `POST /users`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MoodStore + 'static,
{
  viewer.require_admin()?;
  let input = validate_new_user(body)?;
  let user = state
    .store
    .create_user(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user = %user.id, username = %user.username, "user created");
  Ok((StatusCode::CREATED, Json(user)))
}
