//! Async HTTP client wrapping the Moodly JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use moodly_core::{
  category::{CategoryType, MoodCategory, NewCategory},
  entry::MoodContext,
  history::{HistoryView, ProfileSummary, TeamDashboard},
  team::{NewTeam, Team},
  user::{BasicUser, NewUser, Role},
  validate::{FieldError, MoodEntryForm},
  visibility::EntryView,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

use crate::render::text;

/// Header the server reads the caller's user id from.
const VIEWER_HEADER: &str = "x-moodly-user";

/// Connection settings for the Moodly API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub user_id:  Option<Uuid>,
}

/// Error body returned by the server.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
  #[serde(default)]
  pub error:  String,
  #[serde(default)]
  pub fields: Vec<FieldError>,
}

impl ErrorBody {
  /// Read a JSON error body, keeping any other text as the message.
  pub fn parse(text: String) -> Self {
    match serde_json::from_str(&text) {
      Ok(body) => body,
      Err(_) => Self { error: text.trim().to_owned(), fields: Vec::new() },
    }
  }

  pub fn describe(&self) -> String {
    if self.fields.is_empty() {
      return self.error.clone();
    }
    let fields: Vec<String> = self
      .fields
      .iter()
      .map(|f| format!("{}: {}", f.field, f.message))
      .collect();
    format!("{} ({})", self.error, fields.join("; "))
  }
}

/// Async HTTP client for the Moodly JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn identify(&self, req: RequestBuilder) -> RequestBuilder {
    match self.config.user_id {
      Some(id) => req.header(VIEWER_HEADER, id.to_string()),
      None => req,
    }
  }

  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    tracing::debug!(what, "request");
    let resp = self
      .identify(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(anyhow!("{what} → {status}: {}", ErrorBody::parse(text).describe()))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let what = format!("GET {path}");
    let resp = self
      .send(self.client.get(self.url(path)).query(query), &what)
      .await?;
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
  where
    B: serde::Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let what = format!("POST {path}");
    let resp = self
      .send(self.client.post(self.url(path)).json(body), &what)
      .await?;
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  // ── Entries ───────────────────────────────────────────────────────────────

  /// `GET /api/feed`
  pub async fn feed(
    &self,
    limit: Option<usize>,
    offset: usize,
    context: Option<MoodContext>,
    team_id: Option<Uuid>,
  ) -> Result<Vec<EntryView>> {
    let mut query = vec![("offset", offset.to_string())];
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    if let Some(context) = context {
      query.push(("context", text(&context).to_owned()));
    }
    if let Some(team_id) = team_id {
      query.push(("teamId", team_id.to_string()));
    }
    self.get("/feed", &query).await
  }

  /// `POST /api/entries`
  pub async fn log_entry(&self, form: &MoodEntryForm) -> Result<EntryView> {
    self.post("/entries", form).await
  }

  /// `GET /api/entries/:id`
  pub async fn get_entry(&self, id: Uuid) -> Result<EntryView> {
    self.get(&format!("/entries/{id}"), &[]).await
  }

  // ── Own views ─────────────────────────────────────────────────────────────

  /// `GET /api/me`
  pub async fn me(&self, offset_minutes: i32) -> Result<ProfileSummary> {
    self
      .get("/me", &[("offsetMinutes", offset_minutes.to_string())])
      .await
  }

  /// `GET /api/history`
  pub async fn history(&self, days: Option<u32>, offset_minutes: i32) -> Result<HistoryView> {
    let mut query = vec![("offsetMinutes", offset_minutes.to_string())];
    if let Some(days) = days {
      query.push(("days", days.to_string()));
    }
    self.get("/history", &query).await
  }

  // ── Teams ─────────────────────────────────────────────────────────────────

  /// `GET /api/teams`
  pub async fn teams(&self) -> Result<Vec<Team>> { self.get("/teams", &[]).await }

  /// `GET /api/teams/:id/members`
  pub async fn team_members(&self, team_id: Uuid) -> Result<Vec<BasicUser>> {
    self.get(&format!("/teams/{team_id}/members"), &[]).await
  }

  /// `GET /api/teams/:id/dashboard`
  pub async fn dashboard(
    &self,
    team_id: Uuid,
    days: Option<u32>,
    offset_minutes: i32,
  ) -> Result<TeamDashboard> {
    let mut query = vec![("offsetMinutes", offset_minutes.to_string())];
    if let Some(days) = days {
      query.push(("days", days.to_string()));
    }
    self
      .get(&format!("/teams/{team_id}/dashboard"), &query)
      .await
  }

  /// `POST /api/teams`
  pub async fn create_team(&self, input: &NewTeam) -> Result<Team> {
    self.post("/teams", input).await
  }

  /// `POST /api/teams/:id/members`
  pub async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
    let path = format!("/teams/{team_id}/members");
    let what = format!("POST {path}");
    self
      .send(
        self.client.post(self.url(&path)).json(&json!({ "userId": user_id })),
        &what,
      )
      .await?;
    Ok(())
  }

  // ── Categories and users ──────────────────────────────────────────────────

  /// `GET /api/categories[?type=..]`
  pub async fn categories(&self, kind: Option<CategoryType>) -> Result<Vec<MoodCategory>> {
    let query: Vec<_> = kind
      .map(|k| ("type", text(&k).to_owned()))
      .into_iter()
      .collect();
    self.get("/categories", &query).await
  }

  /// `POST /api/categories`
  pub async fn create_category(&self, input: &NewCategory) -> Result<MoodCategory> {
    self.post("/categories", input).await
  }

  /// `GET /api/users[?role=..]`
  pub async fn users(&self, role: Option<Role>) -> Result<Vec<BasicUser>> {
    let query: Vec<_> = role
      .map(|r| ("role", text(&r).to_owned()))
      .into_iter()
      .collect();
    self.get("/users", &query).await
  }

  /// `POST /api/users`
  pub async fn create_user(&self, input: &NewUser) -> Result<BasicUser> {
    self.post("/users", input).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_body_lists_fields() {
    let body: ErrorBody = serde_json::from_str(
      r#"{"error":"validation failed","fields":[{"field":"moodValue","message":"is required"}]}"#,
    )
    .unwrap();
    assert_eq!(body.describe(), "validation failed (moodValue: is required)");

    let plain: ErrorBody = serde_json::from_str(r#"{"error":"team 1 not found"}"#).unwrap();
    assert_eq!(plain.describe(), "team 1 not found");
  }

  #[test]
  fn non_json_error_keeps_text() {
    let body = ErrorBody::parse("Method Not Allowed\n".to_string());
    assert_eq!(body.describe(), "Method Not Allowed");

    let body = ErrorBody::parse(r#"{"error":"admin role required"}"#.to_string());
    assert_eq!(body.describe(), "admin role required");
  }

  #[test]
  fn urls_are_joined_under_api() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost:8080/".into(),
      user_id:  None,
    })
    .unwrap();
    assert_eq!(client.url("/feed"), "http://localhost:8080/api/feed");
  }
}
