//! Users and their organisational role.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
pub enum Role {
  #[default]
  Employee,
  Manager,
  Hr,
  Admin,
}

impl Role {
  /// HR and admins see every entry through the HR visibility level.
  pub fn is_hr_like(self) -> bool { matches!(self, Self::Hr | Self::Admin) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicUser {
  pub id:       Uuid,
  pub username: String,
  pub email:    String,
  pub role:     Role,
}

/// Input to [`crate::store::MoodStore::create_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub username: String,
  pub email:    String,
  #[serde(default)]
  pub role:     Role,
}

impl NewUser {
  pub fn new(username: &str, email: &str, role: Role) -> Self {
    Self { username: username.to_owned(), email: email.to_owned(), role }
  }
}
