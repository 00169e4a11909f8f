//! Plain-text rendering of API responses.

use std::fmt::Write as _;

use chrono::FixedOffset;
use moodly_core::{
  category::MoodCategory,
  entry::{MoodEntry, MoodValue},
  history::{DailyAverage, HistoryView, ProfileSummary, TeamDashboard},
  team::Team,
  user::BasicUser,
  visibility::EntryView,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The lowercase wire name of an enum.
pub fn text<T: AsRef<str>>(value: &T) -> &str { value.as_ref() }

fn bar(width: usize) -> String { "█".repeat(width) }

fn average(avg: Option<f64>) -> String {
  avg.map_or_else(|| "–".to_string(), |a| format!("{a:.1}"))
}

fn category_names(categories: &[MoodCategory]) -> String {
  categories
    .iter()
    .map(|c| match &c.icon {
      Some(icon) => format!("{icon} {}", c.name),
      None => c.name.clone(),
    })
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One entry as seen by the viewer, with a trailing newline.
pub fn entry(view: &EntryView, offset: FixedOffset) -> String {
  let who = match (&view.author, view.is_own) {
    (_, true) => "you".to_string(),
    (Some(author), false) => author.username.clone(),
    (None, false) => "anonymous".to_string(),
  };

  let mut out = format!(
    "{}  {}  {}  {}\n",
    view.mood_value,
    text(&view.context),
    view.logged_at.with_timezone(&offset).format(TIME_FORMAT),
    who,
  );
  if let Some(reason) = &view.reason_summary {
    let _ = writeln!(out, "    “{reason}”");
  }
  if !view.categories.is_empty() {
    let _ = writeln!(out, "    {}", category_names(&view.categories));
  }
  if let Some(note) = &view.note {
    let _ = writeln!(out, "    note: {note}");
  }
  if let Some(visibility) = &view.visibility {
    let _ = writeln!(out, "    shared: {}", visibility.summary());
  }
  out
}

pub fn feed(views: &[EntryView], offset: FixedOffset) -> String {
  if views.is_empty() {
    return "No entries to show.\n".to_string();
  }
  views.iter().map(|v| entry(v, offset)).collect()
}

fn own_entry(e: &MoodEntry, offset: FixedOffset) -> String {
  let mut out = format!(
    "  {}  {}  {}",
    e.logged_at.with_timezone(&offset).format("%H:%M"),
    e.mood_value,
    text(&e.context),
  );
  if e.is_anonymous {
    out.push_str("  (anonymous)");
  }
  out.push('\n');
  if let Some(reason) = &e.reason_summary {
    let _ = writeln!(out, "      “{reason}”");
  }
  if let Some(note) = &e.note {
    let _ = writeln!(out, "      note: {note}");
  }
  out
}

// ─── History and profile ─────────────────────────────────────────────────────

pub fn history(view: &HistoryView, offset: FixedOffset) -> String {
  let mut out = format!(
    "{} entries · average {} · streak {} day(s)\n",
    view.entry_count,
    average(view.average),
    view.streak,
  );

  for value in MoodValue::all().collect::<Vec<_>>().into_iter().rev() {
    let count = view.distribution.count(value);
    let _ = writeln!(out, "  {:<10} {count:>3} {}", value.to_string(), bar(count));
  }

  for day in &view.days {
    let _ = writeln!(
      out,
      "\n{}  ({} · avg {:.1})",
      day.date.format("%a %Y-%m-%d"),
      day.count,
      day.average,
    );
    for e in &day.entries {
      out.push_str(&own_entry(e, offset));
    }
  }
  out
}

pub fn profile(summary: &ProfileSummary, offset: FixedOffset) -> String {
  let user = &summary.user;
  let mut out = format!("{} <{}> · {}\n", user.username, user.email, text(&user.role));
  if !summary.teams.is_empty() {
    let names: Vec<_> = summary.teams.iter().map(|t| t.name.as_str()).collect();
    let _ = writeln!(out, "teams: {}", names.join(", "));
  }
  let _ = writeln!(
    out,
    "{} entries · average {} · streak {} day(s)",
    summary.entry_count,
    average(summary.average),
    summary.streak,
  );
  if let Some(last) = summary.last_logged_at {
    let _ = writeln!(out, "last logged {}", last.with_timezone(&offset).format(TIME_FORMAT));
  }
  out
}

// ─── Team dashboard ──────────────────────────────────────────────────────────

fn trend_line(day: &DailyAverage) -> String {
  match day.average {
    Some(avg) => format!(
      "  {}  {:>3.1} {}",
      day.date.format("%m-%d"),
      avg,
      bar((avg * 2.0).round() as usize),
    ),
    None => format!("  {}    –", day.date.format("%m-%d")),
  }
}

pub fn dashboard(dash: &TeamDashboard) -> String {
  let mut out = format!(
    "{} · {} member(s) · {} entries · average {}\n",
    dash.team.name,
    dash.member_count,
    dash.entry_count,
    average(dash.average),
  );

  out.push_str("\ntrend\n");
  for day in &dash.trend {
    out.push_str(&trend_line(day));
    out.push('\n');
  }

  if !dash.members.is_empty() {
    out.push_str("\nmembers\n");
    for m in &dash.members {
      let _ = writeln!(
        out,
        "  {:<16} {:>3} entries · avg {:.1} · latest {}",
        m.username.as_deref().unwrap_or("anonymous"),
        m.entry_count,
        m.average,
        m.latest_mood,
      );
    }
  }
  out
}

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn categories(categories: &[MoodCategory]) -> String {
  let mut out = String::new();
  let mut current = None;
  for c in categories {
    if current != Some(c.kind) {
      let _ = writeln!(out, "{}", text(&c.kind));
      current = Some(c.kind);
    }
    let _ = writeln!(
      out,
      "  {} {:<16} {}  {}",
      c.icon.as_deref().unwrap_or(" "),
      c.name,
      c.slug,
      c.id,
    );
  }
  out
}

pub fn teams(teams: &[Team]) -> String {
  teams
    .iter()
    .map(|t| format!("{}  {}\n", t.id, t.name))
    .collect()
}

pub fn users(users: &[BasicUser]) -> String {
  users
    .iter()
    .map(|u| format!("{}  {:<16} {:<8} {}\n", u.id, u.username, text(&u.role), u.email))
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};
  use moodly_core::{
    category::CategoryType,
    entry::{AuthorRef, MoodContext},
    history::{MoodDistribution, utc_offset},
    visibility::{Audience, VisibilitySettings},
  };
  use uuid::Uuid;

  use super::*;

  fn view(is_own: bool) -> EntryView {
    EntryView {
      id:             Uuid::new_v4(),
      mood_value:     MoodValue::new(4).unwrap(),
      context:        MoodContext::Professional,
      logged_at:      Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
      categories:     vec![MoodCategory {
        id:    Uuid::new_v4(),
        name:  "Team".into(),
        slug:  "team".into(),
        kind:  CategoryType::Trigger,
        icon:  Some("👥".into()),
        order: 0,
      }],
      team_id:        None,
      author:         None,
      reason_summary: Some("good retro".into()),
      note:           is_own.then(|| "remember this".to_string()),
      is_own,
      viewed_as:      (!is_own).then_some(Audience::Peer),
      visibility:     is_own.then(VisibilitySettings::default),
    }
  }

  #[test]
  fn anonymous_entry_hides_author() {
    let text = entry(&view(false), utc_offset());
    assert!(text.starts_with("🙂 Good  professional  2024-03-01 09:30  anonymous"));
    assert!(text.contains("“good retro”"));
    assert!(text.contains("👥 Team"));
    assert!(!text.contains("note:"));
  }

  #[test]
  fn own_entry_shows_note_and_sharing() {
    let text = entry(&view(true), utc_offset());
    assert!(text.contains("  you\n"));
    assert!(text.contains("note: remember this"));
    assert!(text.contains("shared: Peers: anonymized · Managers: anonymized · HR: hidden"));
  }

  #[test]
  fn named_author_is_shown() {
    let mut v = view(false);
    v.author = Some(AuthorRef { id: Uuid::new_v4(), username: "ada".into() });
    assert!(entry(&v, utc_offset()).contains("  ada\n"));
  }

  #[test]
  fn empty_feed_says_so() {
    assert_eq!(feed(&[], utc_offset()), "No entries to show.\n");
  }

  #[test]
  fn dashboard_marks_empty_days() {
    let dash = TeamDashboard {
      team:         Team { id: Uuid::new_v4(), name: "Platform".into(), manager_id: None },
      member_count: 3,
      entry_count:  2,
      average:      Some(3.5),
      distribution: MoodDistribution::default(),
      trend:        vec![
        DailyAverage {
          date:    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
          count:   2,
          average: Some(3.5),
        },
        DailyAverage {
          date:    NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
          count:   0,
          average: None,
        },
      ],
      members:      vec![],
    };
    let text = dashboard(&dash);
    assert!(text.starts_with("Platform · 3 member(s) · 2 entries · average 3.5"));
    assert!(text.contains("  03-01  3.5 ███████"));
    assert!(text.contains("  03-02    –"));
    assert!(!text.contains("members"));
  }
}
