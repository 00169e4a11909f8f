//! Who sees what of a mood entry.
//!
//! Every entry carries a [`VisibilitySettings`] with one [`VisibilityLevel`]
//! per audience. A viewer's [`Audience`] relative to the author is derived
//! from team membership in a [`ViewerContext`], and [`project`] produces the
//! [`EntryView`] that viewer is allowed to see.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{
  category::MoodCategory,
  entry::{AuthorRef, MoodContext, MoodEntry, MoodValue},
  team::Team,
  user::BasicUser,
};

// ─── Levels and settings ─────────────────────────────────────────────────────

/// How much of an entry's reason text an audience may see.
#[derive(
  Debug,
  Clone,
  Copy,
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
pub enum VisibilityLevel {
  /// The reason is withheld.
  Hidden,
  /// The reason is shown without attribution.
  Anonymized,
  /// The reason is shown together with the author.
  Visible,
}

impl VisibilityLevel {
  pub fn label(self) -> &'static str {
    match self {
      Self::Hidden => "Hidden",
      Self::Anonymized => "Anonymized",
      Self::Visible => "Visible",
    }
  }

  pub fn shows_reason(self) -> bool { !matches!(self, Self::Hidden) }

  pub fn shows_author(self) -> bool { matches!(self, Self::Visible) }
}

impl fmt::Display for VisibilityLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilitySettings {
  pub peers:             VisibilityLevel,
  pub managers:          VisibilityLevel,
  pub hr:                VisibilityLevel,
  /// Also show the entry to viewers outside the author's teams, at the peer
  /// level.
  pub share_globally:    bool,
  pub custom_recipients: bool,
}

impl Default for VisibilitySettings {
  fn default() -> Self {
    Self {
      peers:             VisibilityLevel::Anonymized,
      managers:          VisibilityLevel::Anonymized,
      hr:                VisibilityLevel::Hidden,
      share_globally:    false,
      custom_recipients: false,
    }
  }
}

impl VisibilitySettings {
  /// Nothing is shared with anyone.
  pub fn private() -> Self {
    Self {
      peers:             VisibilityLevel::Hidden,
      managers:          VisibilityLevel::Hidden,
      hr:                VisibilityLevel::Hidden,
      share_globally:    false,
      custom_recipients: false,
    }
  }

  pub fn level_for(&self, audience: Audience) -> VisibilityLevel {
    match audience {
      Audience::Peer => self.peers,
      Audience::Manager => self.managers,
      Audience::Hr => self.hr,
      Audience::Public if self.share_globally => self.peers,
      Audience::Public => VisibilityLevel::Hidden,
    }
  }

  pub fn is_private(&self) -> bool {
    self.peers == VisibilityLevel::Hidden
      && self.managers == VisibilityLevel::Hidden
      && self.hr == VisibilityLevel::Hidden
      && !self.share_globally
      && !self.custom_recipients
  }

  /// One-line human description, e.g.
  /// `Peers: anonymized · Managers: visible · HR: hidden`.
  pub fn summary(&self) -> String {
    if self.is_private() {
      return "Private".to_owned();
    }

    let mut parts = vec![
      format!("Peers: {}", self.peers.label().to_lowercase()),
      format!("Managers: {}", self.managers.label().to_lowercase()),
      format!("HR: {}", self.hr.label().to_lowercase()),
    ];
    if self.share_globally {
      parts.push("Shared globally".to_owned());
    }
    if self.custom_recipients {
      parts.push("Custom recipients".to_owned());
    }
    parts.join(" · ")
  }
}

// ─── Audience ────────────────────────────────────────────────────────────────

/// The viewer's relationship to an entry's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
  Peer,
  Manager,
  Hr,
  /// No relationship; only entries shared globally are visible.
  Public,
}

/// Everything needed to decide what one user may see.
#[derive(Debug, Clone)]
pub struct ViewerContext {
  pub user:            BasicUser,
  /// Users who share at least one team with the viewer.
  pub teammates:       HashSet<Uuid>,
  /// Teams whose manager is the viewer.
  pub managed_teams:   HashSet<Uuid>,
  /// Members of the teams the viewer manages.
  pub managed_members: HashSet<Uuid>,
}

impl ViewerContext {
  /// A viewer with no team relationships.
  pub fn solo(user: BasicUser) -> Self {
    Self {
      user,
      teammates: HashSet::new(),
      managed_teams: HashSet::new(),
      managed_members: HashSet::new(),
    }
  }

  pub fn id(&self) -> Uuid { self.user.id }

  /// Manager outranks HR, which outranks peer.
  pub fn audience_for(&self, author_id: Option<Uuid>) -> Audience {
    if let Some(author) = author_id
      && self.managed_members.contains(&author)
    {
      return Audience::Manager;
    }
    if self.user.role.is_hr_like() {
      return Audience::Hr;
    }
    match author_id {
      Some(author) if self.teammates.contains(&author) => Audience::Peer,
      _ => Audience::Public,
    }
  }

  /// Team dashboards are open to the team's manager, HR and admins.
  pub fn can_view_team(&self, team: &Team) -> bool {
    self.user.role.is_hr_like()
      || self.managed_teams.contains(&team.id)
      || team.manager_id == Some(self.user.id)
  }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// A mood entry as a particular viewer is allowed to see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
  pub id:             Uuid,
  pub mood_value:     MoodValue,
  pub context:        MoodContext,
  pub logged_at:      DateTime<Utc>,
  pub categories:     Vec<MoodCategory>,
  pub team_id:        Option<Uuid>,
  /// `None` when the author is withheld from this viewer.
  pub author:         Option<AuthorRef>,
  pub reason_summary: Option<String>,
  /// Only present for the author.
  pub note:           Option<String>,
  pub is_own:         bool,
  /// The viewer's audience; `None` for the author's own entries.
  pub viewed_as:      Option<Audience>,
  /// The entry's settings; only revealed to the author.
  pub visibility:     Option<VisibilitySettings>,
}

/// Apply the entry's visibility settings for `viewer`.
///
/// Returns `None` when the viewer has no relationship to the author and the
/// entry is not shared globally.
pub fn project(entry: &MoodEntry, viewer: &ViewerContext) -> Option<EntryView> {
  if entry.is_authored_by(viewer.id()) {
    return Some(EntryView {
      id:             entry.id,
      mood_value:     entry.mood_value,
      context:        entry.context,
      logged_at:      entry.logged_at,
      categories:     entry.categories.clone(),
      team_id:        entry.team_id,
      author:         entry.author.clone(),
      reason_summary: entry.reason_summary.clone(),
      note:           entry.note.clone(),
      is_own:         true,
      viewed_as:      None,
      visibility:     Some(entry.visibility),
    });
  }

  let audience = viewer.audience_for(entry.author_id());
  if audience == Audience::Public && !entry.visibility.share_globally {
    return None;
  }

  let level = entry.visibility.level_for(audience);
  let author = if level.shows_author() && !entry.is_anonymous {
    entry.author.clone()
  } else {
    None
  };
  let reason_summary = if level.shows_reason() {
    entry.reason_summary.clone()
  } else {
    None
  };

  Some(EntryView {
    id: entry.id,
    mood_value: entry.mood_value,
    context: entry.context,
    logged_at: entry.logged_at,
    categories: entry.categories.clone(),
    team_id: entry.team_id,
    author,
    reason_summary,
    note: None,
    is_own: false,
    viewed_as: Some(audience),
    visibility: None,
  })
}

/// Project every entry, dropping the ones the viewer may not see.
pub fn project_all<'a>(
  entries: impl IntoIterator<Item = &'a MoodEntry>,
  viewer: &ViewerContext,
) -> Vec<EntryView> {
  entries.into_iter().filter_map(|e| project(e, viewer)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::user::Role;

  fn user(name: &str, role: Role) -> BasicUser {
    BasicUser {
      id: Uuid::new_v4(),
      username: name.to_owned(),
      email: format!("{name}@example.com"),
      role,
    }
  }

  fn entry_by(author: &BasicUser, visibility: VisibilitySettings) -> MoodEntry {
    MoodEntry {
      id: Uuid::new_v4(),
      mood_value: MoodValue::new(2).unwrap(),
      context: MoodContext::Professional,
      is_anonymous: false,
      reason_summary: Some("deadline moved up".into()),
      note: Some("talk to Sam".into()),
      logged_at: Utc::now(),
      visibility,
      categories: vec![],
      author: Some(AuthorRef { id: author.id, username: author.username.clone() }),
      team_id: None,
    }
  }

  fn settings(
    peers: VisibilityLevel,
    managers: VisibilityLevel,
    hr: VisibilityLevel,
  ) -> VisibilitySettings {
    VisibilitySettings {
      peers,
      managers,
      hr,
      share_globally: false,
      custom_recipients: false,
    }
  }

  use VisibilityLevel::{Anonymized, Hidden, Visible};

  #[test]
  fn author_sees_everything() {
    let ada = user("ada", Role::Employee);
    let entry = entry_by(&ada, VisibilitySettings::private());
    let view = project(&entry, &ViewerContext::solo(ada.clone())).unwrap();
    assert!(view.is_own);
    assert_eq!(view.note.as_deref(), Some("talk to Sam"));
    assert_eq!(view.reason_summary.as_deref(), Some("deadline moved up"));
    assert_eq!(view.visibility, Some(VisibilitySettings::private()));
    assert_eq!(view.viewed_as, None);
  }

  #[test]
  fn stranger_sees_nothing_unless_shared_globally() {
    let ada = user("ada", Role::Employee);
    let bob = ViewerContext::solo(user("bob", Role::Employee));

    let entry = entry_by(&ada, settings(Visible, Visible, Visible));
    assert!(project(&entry, &bob).is_none());

    let mut shared = settings(Anonymized, Visible, Hidden);
    shared.share_globally = true;
    let view = project(&entry_by(&ada, shared), &bob).unwrap();
    assert_eq!(view.viewed_as, Some(Audience::Public));
    assert_eq!(view.reason_summary.as_deref(), Some("deadline moved up"));
    assert!(view.author.is_none());
    assert!(view.note.is_none());
  }

  #[test]
  fn peer_levels_control_reason_and_author() {
    let ada = user("ada", Role::Employee);
    let mut bob = ViewerContext::solo(user("bob", Role::Employee));
    bob.teammates.insert(ada.id);

    let hidden = project(&entry_by(&ada, settings(Hidden, Visible, Visible)), &bob)
      .unwrap();
    assert_eq!(hidden.viewed_as, Some(Audience::Peer));
    assert!(hidden.reason_summary.is_none());
    assert!(hidden.author.is_none());
    assert_eq!(hidden.mood_value.get(), 2);

    let anon = project(&entry_by(&ada, settings(Anonymized, Hidden, Hidden)), &bob)
      .unwrap();
    assert!(anon.reason_summary.is_some());
    assert!(anon.author.is_none());

    let visible = project(&entry_by(&ada, settings(Visible, Hidden, Hidden)), &bob)
      .unwrap();
    assert!(visible.reason_summary.is_some());
    assert_eq!(visible.author.unwrap().username, "ada");
    assert!(visible.note.is_none());
  }

  #[test]
  fn manager_relation_outranks_peer_and_hr() {
    let ada = user("ada", Role::Employee);
    let mut boss = ViewerContext::solo(user("boss", Role::Hr));
    boss.teammates.insert(ada.id);
    boss.managed_members.insert(ada.id);

    let entry = entry_by(&ada, settings(Hidden, Visible, Hidden));
    let view = project(&entry, &boss).unwrap();
    assert_eq!(view.viewed_as, Some(Audience::Manager));
    assert!(view.reason_summary.is_some());
  }

  #[test]
  fn hr_sees_every_entry_at_hr_level() {
    let ada = user("ada", Role::Employee);
    let hr = ViewerContext::solo(user("hr", Role::Hr));
    let view = project(&entry_by(&ada, settings(Visible, Visible, Hidden)), &hr)
      .unwrap();
    assert_eq!(view.viewed_as, Some(Audience::Hr));
    assert!(view.reason_summary.is_none());
  }

  #[test]
  fn anonymous_entry_never_reveals_author() {
    let ada = user("ada", Role::Employee);
    let mut bob = ViewerContext::solo(user("bob", Role::Employee));
    bob.teammates.insert(ada.id);

    let mut entry = entry_by(&ada, settings(Visible, Visible, Visible));
    entry.is_anonymous = true;
    let view = project(&entry, &bob).unwrap();
    assert!(view.author.is_none());
    assert!(view.reason_summary.is_some());
  }

  #[test]
  fn summary_labels() {
    assert_eq!(VisibilitySettings::private().summary(), "Private");
    assert_eq!(
      VisibilitySettings::default().summary(),
      "Peers: anonymized · Managers: anonymized · HR: hidden"
    );

    let mut s = settings(Visible, Visible, Hidden);
    s.share_globally = true;
    s.custom_recipients = true;
    assert_eq!(
      s.summary(),
      "Peers: visible · Managers: visible · HR: hidden · Shared globally · Custom recipients"
    );

    let mut only_custom = VisibilitySettings::private();
    only_custom.custom_recipients = true;
    assert_ne!(only_custom.summary(), "Private");
    assert_eq!(Anonymized.to_string(), "Anonymized");
  }

  #[test]
  fn dashboard_access() {
    let boss = user("boss", Role::Manager);
    let team = Team { id: Uuid::new_v4(), name: "core".into(), manager_id: Some(boss.id) };

    assert!(ViewerContext::solo(boss).can_view_team(&team));
    assert!(ViewerContext::solo(user("hr", Role::Hr)).can_view_team(&team));
    assert!(!ViewerContext::solo(user("eve", Role::Manager)).can_view_team(&team));
  }
}
