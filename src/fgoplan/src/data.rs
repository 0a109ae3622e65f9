//! Dataset types
//!
//! These are the types written by the extraction pipeline and read back by
//! the planner. Field names serialize in camelCase to keep the on-disk
//! dataset stable.

use crate::id::{EventId, ItemId, ServantId, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Lookup of ids to their entry.
pub type IdMap<K, T> = BTreeMap<K, T>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Card colour of a servant's noble phantasm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColour {
    Arts,
    Quick,
    Buster,
}

impl CardColour {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "arts" => Some(CardColour::Arts),
            "quick" => Some(CardColour::Quick),
            "buster" => Some(CardColour::Buster),
            _ => None,
        }
    }
}

/// How an event hands out an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Lottery,
    Shop,
    Mission,
    Quest,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Lottery => write!(f, "lottery"),
            EventKind::Shop => write!(f, "shop"),
            EventKind::Mission => write!(f, "mission"),
            EventKind::Quest => write!(f, "quest"),
        }
    }
}

/// An item granted by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAppearance {
    pub event: EventId,
    pub amount: u64,
    pub kind: EventKind,
}

/// A farming location for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub area: String,
    pub quest: String,
    pub link: String,
    pub ap: f64,
    pub ap_drop: f64,
    /// Drop rate as a percentage
    pub drop: f64,
}

/// An obtainable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub icon: String,
    pub background: String,
    pub priority: i32,
    /// Hidden from the requirements table unless actually needed when false.
    pub always_display: bool,
    #[serde(default)]
    pub events: Vec<EventAppearance>,
    #[serde(default)]
    pub drops: Vec<ItemDrop>,
}

/// An item used as part of an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeItem {
    pub item: ItemId,
    pub amount: u64,
}

/// The cost of advancing one step (a skill level, an ascension stage, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRequirements {
    pub qp: u64,
    pub items: Vec<UpgradeItem>,
}

impl UpgradeRequirements {
    /// Build a requirement, merging duplicate item entries by summation.
    pub fn new(qp: u64, items: impl IntoIterator<Item = UpgradeItem>) -> Self {
        let mut merged: Vec<UpgradeItem> = Vec::new();
        for item in items {
            match merged.iter_mut().find(|x| x.item == item.item) {
                Some(existing) => existing.amount += item.amount,
                None => merged.push(item),
            }
        }
        Self { qp, items: merged }
    }
}

/// A skill usable by a servant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub num: u32,
    pub name: String,
    pub detail: String,
    pub icon: String,
}

/// A playable character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Servant {
    pub id: ServantId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub rarity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub np_type: Option<CardColour>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<ItemId>,
    /// Artwork for ascension stages 1 to 4.
    pub ascensions: Vec<String>,
    /// Index 0 is the cost of reaching skill level 2.
    pub skill_materials: Vec<UpgradeRequirements>,
    /// Index 0 unlocks the append skill, index 1 reaches level 2.
    #[serde(default)]
    pub append_skill_materials: Vec<UpgradeRequirements>,
    /// Absent for servants which ascend for free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascension_materials: Option<Vec<UpgradeRequirements>>,
    /// Maximum level at each ascension stage.
    pub lvl_max: Vec<u32>,
    pub skills: Vec<Vec<Skill>>,
    #[serde(default)]
    pub append_skills: Vec<Vec<Skill>>,
    pub webcrow_id: u32,
}

impl Servant {
    /// Level cap reachable through ascension alone.
    pub fn natural_max_level(&self) -> u32 {
        self.lvl_max.last().copied().unwrap_or(0)
    }
}

/// An event worth surfacing to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: EventId,
    pub name: String,
    pub date: String,
}

/// One application of the overflow consumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrailCost {
    /// Levels added on top of the natural max level, cumulative across tiers.
    pub add: u32,
    pub qp: u64,
}

/// Overflow tier schedules, indexed by rarity.
pub type GrailCosts = Vec<Vec<GrailCost>>;

/// The complete dataset produced by the extraction pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDump {
    pub servants: Vec<Servant>,
    pub items: Vec<Item>,
    pub events: Vec<GameEvent>,
    pub exp_growth: Vec<u64>,
    pub grail_costs: GrailCosts,
}

impl DataDump {
    /// Load a dataset from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the dataset as compact JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}
