//! Aggregations behind the history, profile and team dashboard views.
//!
//! Every function here is a single pass over a slice of entries. Calendar days
//! are computed in a caller-supplied UTC offset so that an entry logged late
//! in the evening lands on the user's own day.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{
  DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset as _, TimeZone as _, Utc,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entry::{AuthorRef, MoodEntry, MoodValue},
  team::Team,
  user::BasicUser,
  visibility::EntryView,
};

// ─── Scored ──────────────────────────────────────────────────────────────────

/// Anything that can be aggregated: raw entries and projected views alike.
pub trait Scored {
  fn mood(&self) -> MoodValue;
  fn logged_at(&self) -> DateTime<Utc>;
  /// The author this entry may be attributed to; `None` groups it with the
  /// anonymous entries.
  fn attributed_author(&self) -> Option<&AuthorRef>;
}

impl Scored for MoodEntry {
  fn mood(&self) -> MoodValue { self.mood_value }

  fn logged_at(&self) -> DateTime<Utc> { self.logged_at }

  fn attributed_author(&self) -> Option<&AuthorRef> {
    if self.is_anonymous { None } else { self.author.as_ref() }
  }
}

impl Scored for EntryView {
  fn mood(&self) -> MoodValue { self.mood_value }

  fn logged_at(&self) -> DateTime<Utc> { self.logged_at }

  fn attributed_author(&self) -> Option<&AuthorRef> { self.author.as_ref() }
}

// ─── Primitives ──────────────────────────────────────────────────────────────

/// Round to one decimal place for display.
pub fn round1(x: f64) -> f64 { (x * 10.0).round() / 10.0 }

/// Mean mood score, or `None` for an empty slice.
pub fn average_mood<T: Scored>(entries: &[T]) -> Option<f64> {
  if entries.is_empty() {
    return None;
  }
  let sum: u32 = entries.iter().map(|e| u32::from(e.mood().get())).sum();
  Some(f64::from(sum) / entries.len() as f64)
}

pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
  at.with_timezone(&offset).date_naive()
}

/// Build a [`FixedOffset`] from minutes east of UTC, clamped to ±18h.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
  let seconds = minutes.clamp(-18 * 60 + 1, 18 * 60 - 1) * 60;
  FixedOffset::east_opt(seconds).unwrap_or_else(utc_offset)
}

pub fn utc_offset() -> FixedOffset { Utc.fix() }

/// The UTC instant at which `date` begins in `offset`.
pub fn day_start_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
  let local = date.and_time(NaiveTime::MIN);
  Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset.local_minus_utc()))))
}

/// Start of a window of `days` calendar days ending on (and including) `end`.
pub fn window_start(end: NaiveDate, days: u32, offset: FixedOffset) -> DateTime<Utc> {
  let first = end - Duration::days(i64::from(days.max(1)) - 1);
  day_start_utc(first, offset)
}

// ─── By day ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroup<T> {
  pub date:    NaiveDate,
  pub count:   usize,
  pub average: f64,
  /// Newest first.
  pub entries: Vec<T>,
}

/// Group entries by calendar day, newest day first.
pub fn group_by_day<T: Scored>(entries: Vec<T>, offset: FixedOffset) -> Vec<DayGroup<T>> {
  let mut by_day: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
  for entry in entries {
    by_day
      .entry(local_date(entry.logged_at(), offset))
      .or_default()
      .push(entry);
  }

  by_day
    .into_iter()
    .rev()
    .map(|(date, mut items)| {
      items.sort_by_key(|e| std::cmp::Reverse(e.logged_at()));
      let average = average_mood(&items).map(round1).unwrap_or_default();
      DayGroup { date, count: items.len(), average, entries: items }
    })
    .collect()
}

// ─── By user ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMoodSummary {
  /// `None` for the anonymous bucket.
  pub user_id:        Option<Uuid>,
  pub username:       Option<String>,
  pub entry_count:    usize,
  pub average:        f64,
  pub latest_mood:    MoodValue,
  pub last_logged_at: DateTime<Utc>,
}

impl UserMoodSummary {
  pub fn is_anonymous(&self) -> bool { self.user_id.is_none() }
}

/// One summary per attributable author plus one for anonymous entries,
/// most recently active first.
pub fn group_by_user<T: Scored>(entries: &[T]) -> Vec<UserMoodSummary> {
  struct Acc {
    username: Option<String>,
    count:    usize,
    sum:      u32,
    latest:   (DateTime<Utc>, MoodValue),
  }

  let mut accs: HashMap<Option<Uuid>, Acc> = HashMap::new();
  for entry in entries {
    let author = entry.attributed_author();
    let at = entry.logged_at();
    let acc = accs.entry(author.map(|a| a.id)).or_insert_with(|| Acc {
      username: author.map(|a| a.username.clone()),
      count:    0,
      sum:      0,
      latest:   (at, entry.mood()),
    });
    acc.count += 1;
    acc.sum += u32::from(entry.mood().get());
    if at > acc.latest.0 {
      acc.latest = (at, entry.mood());
    }
  }

  let mut summaries: Vec<UserMoodSummary> = accs
    .into_iter()
    .map(|(user_id, acc)| UserMoodSummary {
      user_id,
      username: acc.username,
      entry_count: acc.count,
      average: round1(f64::from(acc.sum) / acc.count as f64),
      latest_mood: acc.latest.1,
      last_logged_at: acc.latest.0,
    })
    .collect();

  summaries.sort_by(|a, b| {
    b.last_logged_at
      .cmp(&a.last_logged_at)
      .then_with(|| a.username.cmp(&b.username))
  });
  summaries
}

// ─── Trend ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAverage {
  pub date:    NaiveDate,
  pub count:   usize,
  /// `None` on days without entries.
  pub average: Option<f64>,
}

/// Exactly `days` consecutive days ending at `end`, oldest first.
pub fn daily_trend<T: Scored>(
  entries: &[T],
  end: NaiveDate,
  days: u32,
  offset: FixedOffset,
) -> Vec<DailyAverage> {
  if days == 0 {
    return Vec::new();
  }
  let start = end - Duration::days(i64::from(days) - 1);

  let mut sums: HashMap<NaiveDate, (usize, u32)> = HashMap::new();
  for entry in entries {
    let date = local_date(entry.logged_at(), offset);
    if date < start || date > end {
      continue;
    }
    let slot = sums.entry(date).or_default();
    slot.0 += 1;
    slot.1 += u32::from(entry.mood().get());
  }

  start
    .iter_days()
    .take(days as usize)
    .map(|date| match sums.get(&date) {
      Some(&(count, sum)) => DailyAverage {
        date,
        count,
        average: Some(round1(f64::from(sum) / count as f64)),
      },
      None => DailyAverage { date, count: 0, average: None },
    })
    .collect()
}

// ─── Distribution ────────────────────────────────────────────────────────────

/// How many entries carry each mood value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodDistribution {
  /// Index 0 is mood 1.
  pub counts: [usize; 5],
}

impl MoodDistribution {
  pub fn of<T: Scored>(entries: &[T]) -> Self {
    let mut counts = [0; 5];
    for entry in entries {
      counts[usize::from(entry.mood().get() - 1)] += 1;
    }
    Self { counts }
  }

  pub fn count(&self, value: MoodValue) -> usize {
    self.counts[usize::from(value.get() - 1)]
  }

  pub fn total(&self) -> usize { self.counts.iter().sum() }

  /// Fraction of entries with `value`, 0.0 when empty.
  pub fn share(&self, value: MoodValue) -> f64 {
    match self.total() {
      0 => 0.0,
      total => self.count(value) as f64 / total as f64,
    }
  }
}

// ─── Streak ──────────────────────────────────────────────────────────────────

/// Consecutive days with at least one entry, ending today. If nothing has
/// been logged yet today the streak may still end yesterday.
pub fn current_streak<T: Scored>(entries: &[T], today: NaiveDate, offset: FixedOffset) -> u32 {
  let days: HashSet<NaiveDate> = entries
    .iter()
    .map(|e| local_date(e.logged_at(), offset))
    .collect();

  let mut cursor = if days.contains(&today) {
    today
  } else {
    match today.pred_opt() {
      Some(yesterday) => yesterday,
      None => return 0,
    }
  };

  let mut streak = 0;
  while days.contains(&cursor) {
    streak += 1;
    match cursor.pred_opt() {
      Some(prev) => cursor = prev,
      None => break,
    }
  }
  streak
}

// ─── View models ─────────────────────────────────────────────────────────────

/// The history screen: a user's own entries grouped by day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
  pub entry_count:  usize,
  pub average:      Option<f64>,
  pub streak:       u32,
  pub distribution: MoodDistribution,
  pub days:         Vec<DayGroup<MoodEntry>>,
}

impl HistoryView {
  pub fn build(entries: Vec<MoodEntry>, today: NaiveDate, offset: FixedOffset) -> Self {
    Self {
      entry_count:  entries.len(),
      average:      average_mood(&entries).map(round1),
      streak:       current_streak(&entries, today, offset),
      distribution: MoodDistribution::of(&entries),
      days:         group_by_day(entries, offset),
    }
  }
}

/// The manager screen: a team's mood over a window of days.
///
/// Built from entries already projected for the viewer, so per-member rows
/// only exist for authors the viewer may see.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDashboard {
  pub team:         Team,
  pub member_count: usize,
  pub entry_count:  usize,
  pub average:      Option<f64>,
  pub distribution: MoodDistribution,
  pub trend:        Vec<DailyAverage>,
  pub members:      Vec<UserMoodSummary>,
}

impl TeamDashboard {
  pub fn build(
    team: Team,
    member_count: usize,
    views: &[EntryView],
    end: NaiveDate,
    days: u32,
    offset: FixedOffset,
  ) -> Self {
    Self {
      team,
      member_count,
      entry_count: views.len(),
      average: average_mood(views).map(round1),
      distribution: MoodDistribution::of(views),
      trend: daily_trend(views, end, days, offset),
      members: group_by_user(views),
    }
  }
}

/// The profile screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
  pub user:           BasicUser,
  pub teams:          Vec<Team>,
  pub entry_count:    usize,
  pub average:        Option<f64>,
  pub streak:         u32,
  pub last_logged_at: Option<DateTime<Utc>>,
}

impl ProfileSummary {
  pub fn build(
    user: BasicUser,
    teams: Vec<Team>,
    entries: &[MoodEntry],
    today: NaiveDate,
    offset: FixedOffset,
  ) -> Self {
    Self {
      user,
      teams,
      entry_count: entries.len(),
      average: average_mood(entries).map(round1),
      streak: current_streak(entries, today, offset),
      last_logged_at: entries.iter().map(|e| e.logged_at).max(),
    }
  }
}
