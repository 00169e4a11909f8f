//! The [`Viewer`] extractor: who is making the request and what they relate to.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use moodly_core::{store::MoodStore, user::Role, visibility::ViewerContext};
use uuid::Uuid;

use crate::{ApiError, ApiState};

/// Header carrying the caller's user id.
pub const VIEWER_HEADER: &str = "x-moodly-user";

/// The resolved caller. Present in a handler means the user exists.
#[derive(Debug, Clone)]
pub struct Viewer(pub ViewerContext);

impl Viewer {
  pub fn id(&self) -> Uuid { self.0.id() }

  pub fn role(&self) -> Role { self.0.user.role }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    match self.role() {
      Role::Admin => Ok(()),
      _ => Err(ApiError::Forbidden("admin role required".into())),
    }
  }

  pub fn require_hr(&self) -> Result<(), ApiError> {
    if self.role().is_hr_like() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("hr or admin role required".into()))
    }
  }
}

/// Parse the raw header value into a user id.
pub fn parse_viewer_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
  let raw = headers
    .get(VIEWER_HEADER)
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {VIEWER_HEADER} header")))?
    .to_str()
    .map_err(|_| ApiError::Unauthorized(format!("malformed {VIEWER_HEADER} header")))?;
  Uuid::parse_str(raw.trim())
    .map_err(|_| ApiError::Unauthorized(format!("malformed {VIEWER_HEADER} header")))
}

impl<S> FromRequestParts<ApiState<S>> for Viewer
where
  S: MoodStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let id = parse_viewer_id(&parts.headers)?;
    let context = state
      .store
      .viewer_context(id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized(format!("unknown user {id}")))?;
    Ok(Viewer(context))
  }
}
