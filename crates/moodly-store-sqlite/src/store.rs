//! [`SqliteStore`], the SQLite implementation of [`MoodStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use moodly_core::{
  category::{CategoryType, MoodCategory, NewCategory, default_categories, slugify},
  entry::{MoodEntry, NewMoodEntry},
  store::{EntryQuery, MoodStore},
  team::{NewTeam, Team},
  user::{BasicUser, NewUser, Role},
  visibility::ViewerContext,
};

use crate::{
  Error, Result,
  encode::{
    CATEGORY_COLUMNS, ENTRY_COLUMNS, RawCategory, RawEntry, RawTeam, RawUser, TEAM_COLUMNS,
    USER_COLUMNS, decode_uuid, encode_dt, encode_enum, encode_uuid,
  },
  schema::SCHEMA,
};

/// Upper bound on an explicit [`EntryQuery`] page size.
const MAX_LIMIT: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Moodly store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Entries matching `WHERE {filter}` with their categories attached.
  async fn fetch_entries(
    &self,
    filter: String,
    params: Vec<Value>,
  ) -> Result<Vec<MoodEntry>> {
    let (raws, mut categories) = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ENTRY_COLUMNS}
           FROM mood_entries e
           LEFT JOIN users a ON a.id = e.author_id
           {filter}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map(rusqlite::params_from_iter(params), RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let ids: Vec<String> = raws.iter().map(|r| r.id.clone()).collect();
        let categories = categories_for_entries(conn, &ids)?;
        Ok((raws, categories))
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| {
        let cats = categories
          .remove(&raw.id)
          .unwrap_or_default()
          .into_iter()
          .map(RawCategory::into_category)
          .collect::<Result<Vec<_>>>()?;
        raw.into_entry(cats)
      })
      .collect()
  }
}

/// Load the categories of every entry in `entry_ids`, keyed by entry id.
fn categories_for_entries(
  conn: &rusqlite::Connection,
  entry_ids: &[String],
) -> rusqlite::Result<HashMap<String, Vec<RawCategory>>> {
  let mut out: HashMap<String, Vec<RawCategory>> = HashMap::new();
  if entry_ids.is_empty() {
    return Ok(out);
  }

  let placeholders = vec!["?"; entry_ids.len()].join(", ");
  let sql = format!(
    "SELECT ec.entry_id, {CATEGORY_COLUMNS}
     FROM mood_entry_categories ec
     JOIN mood_categories c ON c.id = ec.category_id
     WHERE ec.entry_id IN ({placeholders})
     ORDER BY c.type, c.sort_order, c.name"
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt.query_map(rusqlite::params_from_iter(entry_ids), |row| {
    Ok((row.get::<_, String>(0)?, RawCategory::from_row_at(row, 1)?))
  })?;
  for row in rows {
    let (entry_id, category) = row?;
    out.entry(entry_id).or_default().push(category);
  }
  Ok(out)
}

fn exists(conn: &rusqlite::Connection, sql: &str, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn user_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  exists(conn, "SELECT 1 FROM users WHERE id = ?1", id)
}

fn team_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  exists(conn, "SELECT 1 FROM teams WHERE id = ?1", id)
}

/// Members and the team's manager may tag entries with the team.
fn belongs_to_team(
  conn: &rusqlite::Connection,
  team: &str,
  user: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM team_members WHERE team_id = ?1 AND user_id = ?2
         UNION ALL
         SELECT 1 FROM teams WHERE id = ?1 AND manager_id = ?2",
        rusqlite::params![team, user],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn id_set(
  conn: &rusqlite::Connection,
  sql: &str,
  user_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(sql)?;
  let ids = stmt
    .query_map(rusqlite::params![user_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(ids)
}

// ─── MoodStore impl ──────────────────────────────────────────────────────────

impl MoodStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<BasicUser> {
    let user = BasicUser {
      id:       Uuid::new_v4(),
      username: input.username,
      email:    input.email,
      role:     input.role,
    };

    let id_str   = encode_uuid(user.id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let role_str = encode_enum(user.role);
    let at_str   = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        if exists(conn, "SELECT 1 FROM users WHERE username = ?1", &username)? {
          return Ok(Err(Error::Duplicate(format!("user {username:?}"))));
        }
        conn.execute(
          "INSERT INTO users (id, username, email, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, email, role_str, at_str],
        )?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(user_id = %user.id, username = %user.username, "created user");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<BasicUser>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<BasicUser>> {
    let role_str = role.map(encode_enum);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {USER_COLUMNS} FROM users u
           WHERE ?1 IS NULL OR u.role = ?1
           ORDER BY u.username"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, input: NewCategory) -> Result<MoodCategory> {
    let category = MoodCategory {
      id:    Uuid::new_v4(),
      slug:  input.slug.unwrap_or_else(|| slugify(&input.name)),
      name:  input.name,
      kind:  input.kind,
      icon:  input.icon,
      order: input.order,
    };

    let id_str   = encode_uuid(category.id);
    let name     = category.name.clone();
    let slug     = category.slug.clone();
    let kind_str = encode_enum(category.kind);
    let icon     = category.icon.clone();
    let order    = category.order;

    self
      .conn
      .call(move |conn| {
        if exists(conn, "SELECT 1 FROM mood_categories WHERE slug = ?1", &slug)? {
          return Ok(Err(Error::Duplicate(format!("category {slug:?}"))));
        }
        conn.execute(
          "INSERT INTO mood_categories (id, name, slug, type, icon, sort_order)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, slug, kind_str, icon, order],
        )?;
        Ok(Ok(()))
      })
      .await??;

    Ok(category)
  }

  async fn list_categories(&self, kind: Option<CategoryType>) -> Result<Vec<MoodCategory>> {
    let kind_str = kind.map(encode_enum);

    let raws: Vec<RawCategory> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CATEGORY_COLUMNS} FROM mood_categories c
           WHERE ?1 IS NULL OR c.type = ?1
           ORDER BY c.type, c.sort_order, c.name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str], |row| RawCategory::from_row_at(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn ensure_default_categories(&self) -> Result<usize> {
    let rows: Vec<(String, String, String, String, Option<String>, i32)> =
      default_categories()
        .into_iter()
        .map(|c| {
          (
            encode_uuid(Uuid::new_v4()),
            c.slug.clone().unwrap_or_else(|| slugify(&c.name)),
            c.name,
            encode_enum(c.kind),
            c.icon,
            c.order,
          )
        })
        .collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO mood_categories (id, slug, name, type, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (id, slug, name, kind, icon, order) in &rows {
            inserted += stmt.execute(rusqlite::params![id, slug, name, kind, icon, order])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    if inserted > 0 {
      tracing::info!(inserted, "seeded default mood categories");
    }
    Ok(inserted)
  }

  // ── Teams ─────────────────────────────────────────────────────────────────

  async fn create_team(&self, input: NewTeam) -> Result<Team> {
    let team = Team { id: Uuid::new_v4(), name: input.name, manager_id: input.manager_id };

    let id_str      = encode_uuid(team.id);
    let name        = team.name.clone();
    let manager_id  = team.manager_id;
    let manager_str = manager_id.map(encode_uuid);
    let at_str      = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        if let (Some(id), Some(s)) = (manager_id, &manager_str)
          && !user_exists(conn, s)?
        {
          return Ok(Err(Error::UserNotFound(id)));
        }
        conn.execute(
          "INSERT INTO teams (id, name, manager_id, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, manager_str, at_str],
        )?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(team_id = %team.id, name = %team.name, "created team");
    Ok(team)
  }

  async fn get_team(&self, id: Uuid) -> Result<Option<Team>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTeam> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TEAM_COLUMNS} FROM teams t WHERE t.id = ?1"),
              rusqlite::params![id_str],
              RawTeam::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTeam::into_team).transpose()
  }

  async fn list_teams(&self) -> Result<Vec<Team>> {
    let raws: Vec<RawTeam> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {TEAM_COLUMNS} FROM teams t ORDER BY t.name"))?;
        let rows = stmt
          .query_map([], RawTeam::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTeam::into_team).collect()
  }

  async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
    let team_str = encode_uuid(team_id);
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        if !team_exists(conn, &team_str)? {
          return Ok(Err(Error::TeamNotFound(team_id)));
        }
        if !user_exists(conn, &user_str)? {
          return Ok(Err(Error::UserNotFound(user_id)));
        }
        conn.execute(
          "INSERT OR IGNORE INTO team_members (team_id, user_id, joined_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![team_str, user_str, at_str],
        )?;
        Ok(Ok(()))
      })
      .await??;

    Ok(())
  }

  async fn list_team_members(&self, team_id: Uuid) -> Result<Vec<BasicUser>> {
    let team_str = encode_uuid(team_id);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {USER_COLUMNS} FROM users u
           JOIN team_members tm ON tm.user_id = u.id
           WHERE tm.team_id = ?1
           ORDER BY u.username"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![team_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawTeam> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {TEAM_COLUMNS} FROM teams t
           JOIN team_members tm ON tm.team_id = t.id
           WHERE tm.user_id = ?1
           ORDER BY t.name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawTeam::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTeam::into_team).collect()
  }

  async fn viewer_context(&self, user_id: Uuid) -> Result<Option<ViewerContext>> {
    let user = match self.get_user(user_id).await? {
      Some(u) => u,
      None => return Ok(None),
    };
    let user_str = encode_uuid(user_id);

    let (teammates, managed_teams, managed_members) = self
      .conn
      .call(move |conn| {
        let teammates = id_set(
          conn,
          "SELECT DISTINCT other.user_id
           FROM team_members mine
           JOIN team_members other ON other.team_id = mine.team_id
           WHERE mine.user_id = ?1 AND other.user_id != ?1",
          &user_str,
        )?;
        let managed_teams =
          id_set(conn, "SELECT id FROM teams WHERE manager_id = ?1", &user_str)?;
        let managed_members = id_set(
          conn,
          "SELECT DISTINCT tm.user_id
           FROM teams t
           JOIN team_members tm ON tm.team_id = t.id
           WHERE t.manager_id = ?1 AND tm.user_id != ?1",
          &user_str,
        )?;
        Ok((teammates, managed_teams, managed_members))
      })
      .await?;

    let decode_all = |ids: Vec<String>| {
      ids.iter().map(|s| decode_uuid(s)).collect::<Result<_>>()
    };

    Ok(Some(ViewerContext {
      user,
      teammates: decode_all(teammates)?,
      managed_teams: decode_all(managed_teams)?,
      managed_members: decode_all(managed_members)?,
    }))
  }

  // ── Entries ───────────────────────────────────────────────────────────────

  async fn record_entry(&self, input: NewMoodEntry) -> Result<MoodEntry> {
    let id = Uuid::new_v4();

    let id_str         = encode_uuid(id);
    let author         = input.author_id;
    let author_str     = author.map(encode_uuid);
    let team           = input.team_id;
    let team_str       = team.map(encode_uuid);
    let mood           = i64::from(input.mood_value);
    let context_str    = encode_enum(input.context);
    let is_anonymous   = input.is_anonymous;
    let reason         = input.reason_summary;
    let note           = input.note;
    let logged_str     = encode_dt(input.logged_at);
    let vis            = input.visibility;
    let peers_str      = encode_enum(vis.peers);
    let managers_str   = encode_enum(vis.managers);
    let hr_str         = encode_enum(vis.hr);
    let created_str    = encode_dt(Utc::now());
    let category_ids   = input.category_ids;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let (Some(id), Some(s)) = (author, &author_str)
          && !user_exists(&tx, s)?
        {
          return Ok(Err(Error::UserNotFound(id)));
        }
        if let (Some(id), Some(s)) = (team, &team_str)
          && !team_exists(&tx, s)?
        {
          return Ok(Err(Error::TeamNotFound(id)));
        }
        if let (Some(team), Some(t), Some(user), Some(u)) = (team, &team_str, author, &author_str)
          && !belongs_to_team(&tx, t, u)?
        {
          return Ok(Err(Error::NotTeamMember { team, user }));
        }

        tx.execute(
          "INSERT INTO mood_entries (
             id, author_id, team_id, mood_value, context, is_anonymous,
             reason_summary, note, logged_at,
             peers_visibility, managers_visibility, hr_visibility,
             share_globally, custom_recipients, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          rusqlite::params![
            id_str,
            author_str,
            team_str,
            mood,
            context_str,
            is_anonymous,
            reason,
            note,
            logged_str,
            peers_str,
            managers_str,
            hr_str,
            vis.share_globally,
            vis.custom_recipients,
            created_str,
          ],
        )?;

        for category_id in &category_ids {
          let cat_str = encode_uuid(*category_id);
          if !exists(&tx, "SELECT 1 FROM mood_categories WHERE id = ?1", &cat_str)? {
            // Dropping `tx` rolls back the entry insert.
            return Ok(Err(Error::CategoryNotFound(*category_id)));
          }
          tx.execute(
            "INSERT INTO mood_entry_categories (entry_id, category_id) VALUES (?1, ?2)",
            rusqlite::params![id_str, cat_str],
          )?;
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(entry_id = %id, author = ?author, "recorded mood entry");

    self
      .get_entry(id)
      .await?
      .ok_or(Error::EntryNotFound(id))
  }

  async fn get_entry(&self, id: Uuid) -> Result<Option<MoodEntry>> {
    let mut entries = self
      .fetch_entries("WHERE e.id = ?1".to_owned(), vec![Value::Text(encode_uuid(id))])
      .await?;
    Ok(entries.pop())
  }

  async fn list_entries<'a>(&'a self, query: &'a EntryQuery) -> Result<Vec<MoodEntry>> {
    let mut conds: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(author) = query.author_id {
      params.push(Value::Text(encode_uuid(author)));
      conds.push(format!("e.author_id = ?{}", params.len()));
    }
    if let Some(team) = query.team_id {
      params.push(Value::Text(encode_uuid(team)));
      let n = params.len();
      conds.push(format!(
        "(e.team_id = ?{n} OR e.author_id IN
           (SELECT user_id FROM team_members WHERE team_id = ?{n}))"
      ));
    }
    if let Some(context) = query.context {
      params.push(Value::Text(encode_enum(context)));
      conds.push(format!("e.context = ?{}", params.len()));
    }
    if let Some(since) = query.since {
      params.push(Value::Text(encode_dt(since)));
      conds.push(format!("e.logged_at >= ?{}", params.len()));
    }
    if let Some(until) = query.until {
      params.push(Value::Text(encode_dt(until)));
      conds.push(format!("e.logged_at < ?{}", params.len()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    // SQLite treats a negative LIMIT as unbounded.
    let limit  = query.limit.map_or(-1, |l| l.min(MAX_LIMIT) as i64);
    let offset = query.offset.unwrap_or(0) as i64;
    params.push(Value::Integer(limit));
    params.push(Value::Integer(offset));
    let n = params.len();

    let filter = format!(
      "{where_clause}
       ORDER BY e.logged_at DESC, e.created_at DESC
       LIMIT ?{} OFFSET ?{n}",
      n - 1
    );

    self.fetch_entries(filter, params).await
  }
}
