//! The player's roster of owned servants

use crate::constants::DEFAULT_SERVANT_ID;
use crate::id::ServantId;
use serde::{Deserialize, Serialize};

/// How urgently the player wants to upgrade a servant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
    Unsummoned,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Unsummoned,
    ];
}

/// A current/target pair for one progression axis.
///
/// A missing `current` means the axis' natural starting point. A missing
/// `target` means no goal is set, so the axis costs nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
}

impl Target {
    pub const fn new(current: Option<u32>, target: Option<u32>) -> Self {
        Self { current, target }
    }

    pub const fn between(current: u32, target: u32) -> Self {
        Self::new(Some(current), Some(target))
    }

    /// Both ends are set and equal.
    pub fn is_maxed(&self) -> bool {
        matches!((self.current, self.target), (Some(c), Some(t)) if c == t)
    }

    /// Both ends are equal, treating two absent ends as equal.
    pub fn is_maxed_lax(&self) -> bool {
        self.current == self.target
    }
}

/// A servant owned by the player.
///
/// Entries are identified by `uid` rather than servant id, as the same
/// servant may appear more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedServant {
    pub uid: String,
    pub id: ServantId,
    pub priority: Priority,
    pub level: Target,
    pub ascension: Target,
    pub skills: [Target; 3],
    /// Absent in snapshots taken before append skills existed.
    #[serde(default)]
    pub append_skills: [Target; 3],
}

/// Construct a new roster entry with default values.
pub fn new_servant(id: Option<ServantId>) -> OwnedServant {
    OwnedServant {
        uid: uuid::Uuid::new_v4().to_string(),
        id: id.unwrap_or(DEFAULT_SERVANT_ID),
        priority: Priority::Low,
        level: Target::default(),
        ascension: Target::default(),
        skills: [Target::default(); 3],
        append_skills: [Target::default(); 3],
    }
}

/// Which priorities are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFilter {
    #[serde(rename = "High")]
    pub high: bool,
    #[serde(rename = "Medium")]
    pub medium: bool,
    #[serde(rename = "Low")]
    pub low: bool,
    #[serde(rename = "Unsummoned")]
    pub unsummoned: bool,
}

impl PriorityFilter {
    pub fn allows(&self, priority: Priority) -> bool {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
            Priority::Unsummoned => self.unsummoned,
        }
    }

    pub fn set(&mut self, priority: Priority, shown: bool) {
        match priority {
            Priority::High => self.high = shown,
            Priority::Medium => self.medium = shown,
            Priority::Low => self.low = shown,
            Priority::Unsummoned => self.unsummoned = shown,
        }
    }
}

/// Roster display filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Show servants with nothing left to upgrade.
    pub maxed: bool,
    pub priority: PriorityFilter,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            maxed: true,
            priority: PriorityFilter {
                high: true,
                medium: true,
                low: true,
                unsummoned: true,
            },
        }
    }
}

/// Whether a roster entry passes the given filters.
pub fn matches_filter(filters: &Filters, servant: &OwnedServant) -> bool {
    if !filters.priority.allows(servant.priority) {
        return false;
    }

    filters.maxed
        || !servant.level.is_maxed()
        || !servant.skills.iter().all(Target::is_maxed)
        || !servant.append_skills.iter().all(Target::is_maxed_lax)
}
