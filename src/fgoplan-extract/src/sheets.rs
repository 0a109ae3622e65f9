//! Drop locations from the community farming spreadsheet
//!
//! The sheet lays out two tables side by side. Each table lists an item name
//! in its first column followed by one row per farming quest.

use fgoplan::data::IdMap;
use fgoplan::{Item, ItemDrop, ItemId};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

pub const SPREADSHEET_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets/1_SlTjrVRTgHgfS7sRqx4CeJMqlz687HdSlYqiW-JvQA?ranges=Best%205%20AP%2FDrop%20%28NA%29&fields=sheets";

/// First column of each table in the sheet.
pub const TABLE_COLUMNS: [usize; 2] = [2, 18];

/// Spreadsheet item names which differ from the game's.
const DROP_ALIASES: &[(&str, &str)] = &[
    ("Small Bells of Amnesty", "Small Bell of Amnesty"),
    ("Octuplet Crystal", "Octuplet Crystals"),
    ("Moonlit Tiara", "Shining Silver Crown"),
    ("Shell of Reminiscense", "Shell of Reminiscence"),
    ("Demon Flame Lantern", "Oni Flame Lantern"),
    ("Divine Spirit Particle", "Divine Leyline Spiritron"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Spreadsheets {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub data: Vec<GridData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    #[serde(default)]
    pub row_data: Vec<RowData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowData {
    #[serde(default)]
    pub values: Vec<CellData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EffectiveValue {
    #[serde(rename = "numberValue")]
    pub number: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub effective_value: Option<EffectiveValue>,
    pub formatted_value: Option<String>,
    pub hyperlink: Option<String>,
}

impl RowData {
    fn text(&self, column: usize) -> Option<&str> {
        self.values
            .get(column)?
            .formatted_value
            .as_deref()
            .filter(|x| !x.is_empty())
    }

    fn link(&self, column: usize) -> Option<&str> {
        self.values
            .get(column)?
            .hyperlink
            .as_deref()
            .filter(|x| !x.is_empty())
    }

    fn number(&self, column: usize) -> Option<f64> {
        self.values.get(column)?.effective_value.as_ref()?.number
    }
}

impl Spreadsheets {
    /// Rows of the first grid of the first sheet.
    pub fn rows(&self) -> &[RowData] {
        self.sheets
            .first()
            .and_then(|sheet| sheet.data.first())
            .map(|grid| grid.row_data.as_slice())
            .unwrap_or_default()
    }
}

fn parse_drop(row: &RowData, start: usize) -> Option<ItemDrop> {
    Some(ItemDrop {
        area: row.text(start + 3)?.to_string(),
        quest: row.text(start + 4)?.to_string(),
        link: row.link(start + 4)?.to_string(),
        ap: row.number(start + 6)?,
        ap_drop: row.number(start + 7)?,
        drop: row.number(start + 9)?,
    })
}

/// Attach the drop rows of the table starting at column `start` to their
/// items.
pub fn add_drop_data(items: &mut IdMap<ItemId, Item>, rows: &[RowData], start: usize) {
    let by_name: HashMap<String, ItemId> = items
        .values()
        .map(|item| (item.name.clone(), item.id))
        .collect();
    let resolve = |name: &str| {
        by_name.get(name).copied().or_else(|| {
            DROP_ALIASES
                .iter()
                .find(|(alias, _)| *alias == name)
                .and_then(|(_, official)| by_name.get(*official).copied())
        })
    };

    let mut current: Option<ItemId> = None;
    for row in rows {
        if let Some(name) = row.text(start) {
            current = resolve(name);
            if current.is_none() {
                warn!("Unknown item {}", name);
            }
        }
        let Some(item) = current.and_then(|id| items.get_mut(&id)) else {
            continue;
        };

        match parse_drop(row, start) {
            Some(drop) => item.drops.push(drop),
            None => {
                let area = row.text(start + 3);
                let quest = row.text(start + 4);
                if let (Some(area), Some(quest)) = (area, quest) {
                    if area != "Area" && quest != "Quest" {
                        warn!("Invalid drops for {} in {} / {}, skipping", item.name, area, quest);
                    }
                }
            }
        }
    }
}
