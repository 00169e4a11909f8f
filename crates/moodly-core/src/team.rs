//! Teams and membership.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
  pub id:         Uuid,
  pub name:       String,
  pub manager_id: Option<Uuid>,
}

/// Input to [`crate::store::MoodStore::create_team`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
  pub name:       String,
  #[serde(default)]
  pub manager_id: Option<Uuid>,
}
