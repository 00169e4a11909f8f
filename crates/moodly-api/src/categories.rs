//! Handlers for `/categories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | Optional `?type=emotion\|trigger\|activity` |
//! | `POST` | `/categories` | Admin only. Body: [`NewCategory`]; slug defaults to the name |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use moodly_core::{
  category::{CategoryType, MoodCategory, NewCategory},
  store::MoodStore,
  validate::validate_new_category,
};
use serde::Deserialize;

use crate::{
  ApiState, Viewer,
  error::ApiError,
  extract::{Json, Query},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(rename = "type")]
  pub kind: Option<CategoryType>,
}

/// `GET /categories[?type=<type>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _viewer: Viewer,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MoodCategory>>, ApiError>
where
  S: MoodStore + 'static,
{
  let categories = state
    .store
    .list_categories(params.kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(categories))
}

/// `POST /categories`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  viewer: Viewer,
  Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MoodStore + 'static,
{
  viewer.require_admin()?;
  let input = validate_new_category(body)?;
  let category = state
    .store
    .create_category(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(category = %category.slug, "category created");
  Ok((StatusCode::CREATED, Json(category)))
}
