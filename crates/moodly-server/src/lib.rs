//! HTTP server assembly for Moodly.
//!
//! Loads [`ServerConfig`], wraps the JSON API from `moodly-api` in request
//! tracing, and exposes a liveness probe. The binary in `main.rs` wires this
//! to a SQLite store and a TCP listener.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use moodly_api::{ApiState, DEFAULT_WINDOW_DAYS, api_router};
use moodly_core::store::MoodStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `MOODLY_PORT=9000`.
pub const ENV_PREFIX: &str = "MOODLY";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Insert the default categories on startup when missing.
  #[serde(default = "default_true")]
  pub seed_categories:      bool,
  #[serde(default = "default_history_days")]
  pub default_history_days: u32,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/moodly/moodly.db") }

fn default_true() -> bool { true }

fn default_history_days() -> u32 { DEFAULT_WINDOW_DAYS }

impl ServerConfig {
  /// Layer an optional TOML file under `MOODLY_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application: `/health` plus the API nested under `/api`.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: MoodStore + 'static,
{
  let state = ApiState::new(store).with_window_days(config.default_history_days);
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use moodly_core::user::{NewUser, Role};
  use moodly_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn defaults() -> ServerConfig {
    ServerConfig {
      host:                 default_host(),
      port:                 default_port(),
      store_path:           PathBuf::from(":memory:"),
      seed_categories:      true,
      default_history_days: 14,
    }
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/moodly.toml")).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.default_history_days, DEFAULT_WINDOW_DAYS);
    assert!(cfg.seed_categories);
  }

  #[test]
  fn file_values_are_read() {
    let path = std::env::temp_dir().join(format!("moodly-config-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "port = 9123\nseed_categories = false\nstore_path = \"/tmp/m.db\"").unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(cfg.port, 9123);
    assert!(!cfg.seed_categories);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/m.db"));
    assert_eq!(cfg.address(), "127.0.0.1:9123");
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }

  #[tokio::test]
  async fn health_and_api_are_mounted() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let user = store
      .create_user(NewUser::new("ada", "ada@example.com", Role::Employee))
      .await
      .unwrap();
    let app = app(store, &defaults());

    let resp = app
      .clone()
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::get("/api/history")
      .header(moodly_api::viewer::VIEWER_HEADER, user.id.to_string())
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["entryCount"], 0);
  }
}
