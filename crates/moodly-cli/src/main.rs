//! `moodly`: command-line client for the Moodly API.
//!
//! # Usage
//!
//! ```
//! moodly --url http://localhost:8080 --user <uuid> log --mood 4 --context professional
//! moodly --config ~/.config/moodly/config.toml history --days 14
//! ```

mod client;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{FixedOffset, Local, Offset as _};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use moodly_core::{
  category::{CategoryType, NewCategory},
  entry::MoodContext,
  team::NewTeam,
  user::{NewUser, Role},
  validate::MoodEntryForm,
  visibility::{VisibilityLevel, VisibilitySettings},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "moodly", about = "Log and review moods from the terminal")]
struct Args {
  /// Path to a TOML config file (url, user).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the moodly server (default: http://localhost:8080).
  #[arg(long, env = "MOODLY_URL")]
  url: Option<String>,

  /// Your user id.
  #[arg(long, env = "MOODLY_USER")]
  user: Option<Uuid>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log how you feel right now.
  Log(LogArgs),

  /// Entries from the people you share a team with.
  Feed {
    #[arg(long)]
    limit:   Option<usize>,
    #[arg(long, default_value_t = 0)]
    offset:  usize,
    /// personal, professional or mixed.
    #[arg(long)]
    context: Option<MoodContext>,
    #[arg(long)]
    team:    Option<Uuid>,
  },

  /// Show a single entry.
  Show { id: Uuid },

  /// Your own entries grouped by day.
  History {
    #[arg(long)]
    days: Option<u32>,
  },

  /// A team's mood dashboard (team manager, HR or admin).
  Team {
    id:   Uuid,
    #[arg(long)]
    days: Option<u32>,
  },

  /// List all teams.
  Teams,

  /// List the members of a team.
  Members { team: Uuid },

  /// Your profile summary.
  Profile,

  /// The category taxonomy.
  Categories {
    /// emotion, trigger or activity.
    #[arg(long = "type")]
    kind: Option<CategoryType>,
  },

  /// Administrative commands.
  #[command(subcommand)]
  Admin(AdminCommand),
}

#[derive(clap::Args, Debug)]
struct LogArgs {
  /// Mood from 1 (awful) to 5 (great).
  #[arg(short, long)]
  mood:           i64,
  /// personal, professional or mixed.
  #[arg(long)]
  context:        MoodContext,
  /// Short reason others may see, depending on visibility.
  #[arg(short, long)]
  reason:         Option<String>,
  /// Private note, only ever visible to you.
  #[arg(short, long)]
  note:           Option<String>,
  /// Never reveal your name with this entry.
  #[arg(long)]
  anonymous:      bool,
  /// Category slug; repeat for several.
  #[arg(long = "category", value_name = "SLUG")]
  categories:     Vec<String>,
  #[arg(long)]
  team:           Option<Uuid>,
  /// hidden, anonymized or visible.
  #[arg(long)]
  peers:          Option<VisibilityLevel>,
  #[arg(long)]
  managers:       Option<VisibilityLevel>,
  #[arg(long)]
  hr:             Option<VisibilityLevel>,
  /// Also show the entry to people outside your teams.
  #[arg(long)]
  share_globally: bool,
  /// Share with nobody.
  #[arg(long, conflicts_with_all = ["peers", "managers", "hr", "share_globally"])]
  private:        bool,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
  AddUser {
    username: String,
    email:    String,
    #[arg(long, default_value = "employee")]
    role:     Role,
  },
  AddTeam {
    name:    String,
    #[arg(long)]
    manager: Option<Uuid>,
  },
  AddMember {
    team: Uuid,
    user: Uuid,
  },
  AddCategory {
    name:  String,
    #[arg(long = "type")]
    kind:  CategoryType,
    #[arg(long)]
    slug:  Option<String>,
    #[arg(long)]
    icon:  Option<String>,
    #[arg(long, default_value_t = 0)]
    order: i32,
  },
  ListUsers {
    #[arg(long)]
    role: Option<Role>,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct ConfigFile {
  #[serde(default)]
  url:  Option<String>,
  #[serde(default)]
  user: Option<Uuid>,
}

/// Flags and environment override the config file, which overrides defaults.
fn resolve_config(
  args_url: Option<String>,
  args_user: Option<Uuid>,
  file: ConfigFile,
) -> ApiConfig {
  ApiConfig {
    base_url: args_url
      .or(file.url)
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    user_id:  args_user.or(file.user),
  }
}

fn local_offset() -> FixedOffset { Local::now().offset().fix() }

fn offset_minutes(offset: FixedOffset) -> i32 { offset.local_minus_utc() / 60 }

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let api_config = resolve_config(args.url, args.user, file_cfg);
  if api_config.user_id.is_none() {
    bail!("no user id: pass --user, set MOODLY_USER or add `user` to the config file");
  }

  let client = ApiClient::new(api_config)?;
  let output = run(&client, args.command).await?;
  print!("{output}");
  Ok(())
}

async fn run(client: &ApiClient, command: Command) -> Result<String> {
  let offset = local_offset();
  let minutes = offset_minutes(offset);

  let out = match command {
    Command::Log(log) => {
      let form = build_form(client, log).await?;
      let view = client.log_entry(&form).await?;
      format!("Logged:\n{}", render::entry(&view, offset))
    }
    Command::Feed { limit, offset: skip, context, team } => {
      let views = client.feed(limit, skip, context, team).await?;
      render::feed(&views, offset)
    }
    Command::Show { id } => render::entry(&client.get_entry(id).await?, offset),
    Command::History { days } => render::history(&client.history(days, minutes).await?, offset),
    Command::Team { id, days } => render::dashboard(&client.dashboard(id, days, minutes).await?),
    Command::Teams => render::teams(&client.teams().await?),
    Command::Members { team } => render::users(&client.team_members(team).await?),
    Command::Profile => render::profile(&client.me(minutes).await?, offset),
    Command::Categories { kind } => render::categories(&client.categories(kind).await?),
    Command::Admin(admin) => run_admin(client, admin).await?,
  };
  Ok(out)
}

async fn run_admin(client: &ApiClient, command: AdminCommand) -> Result<String> {
  let out = match command {
    AdminCommand::AddUser { username, email, role } => {
      let user = client.create_user(&NewUser { username, email, role }).await?;
      format!("Created user {} ({})\n", user.username, user.id)
    }
    AdminCommand::AddTeam { name, manager } => {
      let team = client.create_team(&NewTeam { name, manager_id: manager }).await?;
      format!("Created team {} ({})\n", team.name, team.id)
    }
    AdminCommand::AddMember { team, user } => {
      client.add_team_member(team, user).await?;
      format!("Added {user} to {team}\n")
    }
    AdminCommand::AddCategory { name, kind, slug, icon, order } => {
      let category = client
        .create_category(&NewCategory { name, slug, kind, icon, order })
        .await?;
      format!("Created category {} ({})\n", category.slug, category.id)
    }
    AdminCommand::ListUsers { role } => render::users(&client.users(role).await?),
  };
  Ok(out)
}

/// Turn `log` flags into the form the API validates. Category slugs are
/// resolved against the server's taxonomy.
async fn build_form(client: &ApiClient, log: LogArgs) -> Result<MoodEntryForm> {
  let settings = visibility(&log);
  let category_ids = if log.categories.is_empty() {
    Vec::new()
  } else {
    let known = client.categories(None).await?;
    log
      .categories
      .iter()
      .map(|slug| {
        known
          .iter()
          .find(|c| &c.slug == slug)
          .map(|c| c.id)
          .with_context(|| format!("unknown category {slug:?}"))
      })
      .collect::<Result<Vec<_>>>()?
  };

  Ok(MoodEntryForm {
    mood_value: Some(log.mood),
    context: Some(log.context),
    is_anonymous: log.anonymous,
    reason_summary: log.reason,
    note: log.note,
    logged_at: None,
    visibility: Some(settings),
    category_ids,
    team_id: log.team,
  })
}

fn visibility(log: &LogArgs) -> VisibilitySettings {
  if log.private {
    return VisibilitySettings::private();
  }
  let defaults = VisibilitySettings::default();
  VisibilitySettings {
    peers: log.peers.unwrap_or(defaults.peers),
    managers: log.managers.unwrap_or(defaults.managers),
    hr: log.hr.unwrap_or(defaults.hr),
    share_globally: log.share_globally,
    custom_recipients: false,
  }
}
