//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use moodly_core::{
  category::{CategoryType, NewCategory, default_categories},
  entry::{MoodContext, MoodValue, NewMoodEntry},
  store::{EntryQuery, MoodStore, StoreError as _},
  team::NewTeam,
  user::{BasicUser, NewUser, Role},
  visibility::{VisibilityLevel, VisibilitySettings},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str, role: Role) -> BasicUser {
  s.create_user(NewUser::new(name, &format!("{name}@example.com"), role))
    .await
    .unwrap()
}

fn mood(v: i64) -> MoodValue { MoodValue::new(v).unwrap() }

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;
  let ada = user(&s, "ada", Role::Manager).await;

  let fetched = s.get_user(ada.id).await.unwrap().unwrap();
  assert_eq!(fetched, ada);
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
  let s = store().await;
  user(&s, "ada", Role::Employee).await;
  let err = s
    .create_user(NewUser::new("ada", "other@example.com", Role::Employee))
    .await
    .unwrap_err();
  assert!(err.is_conflict());
}

#[tokio::test]
async fn list_users_filters_by_role() {
  let s = store().await;
  user(&s, "zed", Role::Employee).await;
  user(&s, "ada", Role::Employee).await;
  user(&s, "hana", Role::Hr).await;

  let all = s.list_users(None).await.unwrap();
  let names: Vec<_> = all.iter().map(|u| u.username.as_str()).collect();
  assert_eq!(names, ["ada", "hana", "zed"]);

  let hr = s.list_users(Some(Role::Hr)).await.unwrap();
  assert_eq!(hr.len(), 1);
  assert_eq!(hr[0].role, Role::Hr);
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_categories_seed_once() {
  let s = store().await;
  let first = s.ensure_default_categories().await.unwrap();
  assert_eq!(first, default_categories().len());
  assert_eq!(s.ensure_default_categories().await.unwrap(), 0);

  let emotions = s.list_categories(Some(CategoryType::Emotion)).await.unwrap();
  assert!(!emotions.is_empty());
  assert!(emotions.iter().all(|c| c.kind == CategoryType::Emotion));
  assert!(emotions.windows(2).all(|w| w[0].order <= w[1].order));
}

#[tokio::test]
async fn duplicate_category_slug_conflicts() {
  let s = store().await;
  let mut input = NewCategory::new("Calm", CategoryType::Emotion);
  input.slug = Some("calm".into());
  s.create_category(input.clone()).await.unwrap();
  assert!(s.create_category(input).await.unwrap_err().is_conflict());
}

// ─── Teams ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn team_membership_is_idempotent() {
  let s = store().await;
  let boss = user(&s, "boss", Role::Manager).await;
  let ada = user(&s, "ada", Role::Employee).await;
  let team = s
    .create_team(NewTeam { name: "Platform".into(), manager_id: Some(boss.id) })
    .await
    .unwrap();

  s.add_team_member(team.id, ada.id).await.unwrap();
  s.add_team_member(team.id, ada.id).await.unwrap();

  let members = s.list_team_members(team.id).await.unwrap();
  assert_eq!(members.len(), 1);
  assert_eq!(members[0].id, ada.id);

  let teams = s.teams_for_user(ada.id).await.unwrap();
  assert_eq!(teams, vec![team.clone()]);
  assert_eq!(s.get_team(team.id).await.unwrap(), Some(team));
}

#[tokio::test]
async fn membership_requires_existing_rows() {
  let s = store().await;
  let ada = user(&s, "ada", Role::Employee).await;
  let err = s.add_team_member(Uuid::new_v4(), ada.id).await.unwrap_err();
  assert!(matches!(err, crate::Error::TeamNotFound(_)));

  let err = s
    .create_team(NewTeam { name: "Ghosts".into(), manager_id: Some(Uuid::new_v4()) })
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn viewer_context_resolves_relationships() {
  let s = store().await;
  let boss = user(&s, "boss", Role::Manager).await;
  let ada = user(&s, "ada", Role::Employee).await;
  let bob = user(&s, "bob", Role::Employee).await;
  let eve = user(&s, "eve", Role::Employee).await;

  let team = s
    .create_team(NewTeam { name: "Platform".into(), manager_id: Some(boss.id) })
    .await
    .unwrap();
  s.add_team_member(team.id, ada.id).await.unwrap();
  s.add_team_member(team.id, bob.id).await.unwrap();

  let ada_ctx = s.viewer_context(ada.id).await.unwrap().unwrap();
  assert!(ada_ctx.teammates.contains(&bob.id));
  assert!(!ada_ctx.teammates.contains(&ada.id));
  assert!(!ada_ctx.teammates.contains(&eve.id));
  assert!(ada_ctx.managed_members.is_empty());

  let boss_ctx = s.viewer_context(boss.id).await.unwrap().unwrap();
  assert!(boss_ctx.managed_teams.contains(&team.id));
  assert_eq!(boss_ctx.managed_members.len(), 2);
  assert!(boss_ctx.teammates.is_empty());

  assert!(s.viewer_context(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Entries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_entry_round_trips_all_fields() {
  let s = store().await;
  s.ensure_default_categories().await.unwrap();
  let ada = user(&s, "ada", Role::Employee).await;
  let cats = s.list_categories(Some(CategoryType::Trigger)).await.unwrap();

  let mut input = NewMoodEntry::new(ada.id, mood(2), MoodContext::Professional);
  input.reason_summary = Some("release slipped".into());
  input.note = Some("ask for help".into());
  input.is_anonymous = true;
  input.visibility = VisibilitySettings {
    peers:             VisibilityLevel::Hidden,
    managers:          VisibilityLevel::Visible,
    hr:                VisibilityLevel::Anonymized,
    share_globally:    false,
    custom_recipients: true,
  };
  input.category_ids = vec![cats[0].id, cats[1].id];

  let entry = s.record_entry(input.clone()).await.unwrap();
  assert_eq!(entry.mood_value, mood(2));
  assert_eq!(entry.author.as_ref().unwrap().username, "ada");
  assert_eq!(entry.visibility, input.visibility);
  assert_eq!(entry.categories.len(), 2);
  assert!(entry.is_anonymous);
  assert_eq!(entry.note.as_deref(), Some("ask for help"));
  // Stored with microsecond precision.
  assert!((entry.logged_at - input.logged_at).num_microseconds().unwrap().abs() < 1);

  let fetched = s.get_entry(entry.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, entry.id);
  assert_eq!(fetched.categories, entry.categories);
}

#[tokio::test]
async fn unknown_category_writes_nothing() {
  let s = store().await;
  let ada = user(&s, "ada", Role::Employee).await;

  let mut input = NewMoodEntry::new(ada.id, mood(3), MoodContext::Personal);
  input.category_ids = vec![Uuid::new_v4()];
  let err = s.record_entry(input).await.unwrap_err();
  assert!(matches!(err, crate::Error::CategoryNotFound(_)));

  let entries = s.list_entries(&EntryQuery::default()).await.unwrap();
  assert!(entries.is_empty());
}

#[tokio::test]
async fn unknown_author_or_team_rejected() {
  let s = store().await;
  let err = s
    .record_entry(NewMoodEntry::new(Uuid::new_v4(), mood(3), MoodContext::Personal))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::UserNotFound(_)));

  let ada = user(&s, "ada", Role::Employee).await;
  let mut input = NewMoodEntry::new(ada.id, mood(3), MoodContext::Personal);
  input.team_id = Some(Uuid::new_v4());
  assert!(s.record_entry(input).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn list_entries_newest_first_with_filters() {
  let s = store().await;
  let ada = user(&s, "ada", Role::Employee).await;
  let bob = user(&s, "bob", Role::Employee).await;
  let now = Utc::now();

  for (who, v, hours_ago, ctx) in [
    (&ada, 4, 30, MoodContext::Professional),
    (&ada, 2, 2, MoodContext::Personal),
    (&bob, 5, 10, MoodContext::Professional),
  ] {
    let mut input = NewMoodEntry::new(who.id, mood(v), ctx);
    input.logged_at = now - Duration::hours(hours_ago);
    s.record_entry(input).await.unwrap();
  }

  let all = s.list_entries(&EntryQuery::default()).await.unwrap();
  let values: Vec<u8> = all.iter().map(|e| e.mood_value.get()).collect();
  assert_eq!(values, [2, 5, 4]);

  let adas = s.list_entries(&EntryQuery::by_author(ada.id)).await.unwrap();
  assert_eq!(adas.len(), 2);

  let recent = s
    .list_entries(&EntryQuery::default().since(now - Duration::hours(12)))
    .await
    .unwrap();
  assert_eq!(recent.len(), 2);

  let work = s
    .list_entries(&EntryQuery {
      context: Some(MoodContext::Professional),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(work.len(), 2);

  let page = s
    .list_entries(&EntryQuery { limit: Some(1), offset: Some(1), ..EntryQuery::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].mood_value.get(), 5);
}

#[tokio::test]
async fn team_filter_includes_member_entries() {
  let s = store().await;
  let ada = user(&s, "ada", Role::Employee).await;
  let boss = user(&s, "boss", Role::Manager).await;
  let eve = user(&s, "eve", Role::Employee).await;
  let team = s
    .create_team(NewTeam { name: "Platform".into(), manager_id: Some(boss.id) })
    .await
    .unwrap();
  s.add_team_member(team.id, ada.id).await.unwrap();

  // Member entry without a team tag.
  s.record_entry(NewMoodEntry::new(ada.id, mood(4), MoodContext::Mixed))
    .await
    .unwrap();
  // The manager is not a member but may tag the team.
  let mut tagged = NewMoodEntry::new(boss.id, mood(3), MoodContext::Mixed);
  tagged.team_id = Some(team.id);
  s.record_entry(tagged).await.unwrap();
  // Unrelated entry.
  s.record_entry(NewMoodEntry::new(eve.id, mood(1), MoodContext::Mixed))
    .await
    .unwrap();

  let entries = s.list_entries(&EntryQuery::by_team(team.id)).await.unwrap();
  assert_eq!(entries.len(), 2);
  assert!(entries.iter().all(|e| e.mood_value.get() != 1));
}

#[tokio::test]
async fn outsiders_cannot_tag_a_team() {
  let s = store().await;
  let ada = user(&s, "ada", Role::Employee).await;
  let eve = user(&s, "eve", Role::Employee).await;
  let team = s
    .create_team(NewTeam { name: "Platform".into(), manager_id: None })
    .await
    .unwrap();
  s.add_team_member(team.id, ada.id).await.unwrap();

  let mut tagged = NewMoodEntry::new(eve.id, mood(1), MoodContext::Professional);
  tagged.team_id = Some(team.id);
  let err = s.record_entry(tagged).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::NotTeamMember { team: t, user: u } if t == team.id && u == eve.id
  ));
  assert!(err.is_forbidden());

  let entries = s.list_entries(&EntryQuery::by_team(team.id)).await.unwrap();
  assert!(entries.is_empty());
  assert!(s.list_entries(&EntryQuery::by_author(eve.id)).await.unwrap().is_empty());
}
