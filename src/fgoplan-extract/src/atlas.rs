//! Upstream content API schema
//!
//! Only the fields the converter reads are modelled. Indexed collections
//! (ascension stages, skill levels, grail tiers) arrive as objects keyed by
//! decimal strings, which deserialize into `BTreeMap<u32, _>`.

use fgoplan::{EventId, ItemId, ServantId, SkillId, WarId};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Sparse keyed collection as sent by the API.
pub type RangedMap<T> = BTreeMap<u32, T>;

/// Servant records which only exist to fill the enemy compendium.
pub const ENEMY_COLLECTION_TYPE: &str = "enemyCollectionDetail";

#[derive(Debug, Clone, Deserialize)]
pub struct AtlasItem {
    pub id: ItemId,
    pub name: String,
    pub icon: String,
    pub background: String,
    pub priority: i32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtlasUpgradeItem {
    pub item: AtlasItem,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtlasUpgrade {
    #[serde(default)]
    pub items: Vec<AtlasUpgradeItem>,
    pub qp: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtlasSkill {
    pub id: SkillId,
    pub num: u32,
    pub name: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasAppendSkill {
    pub num: u32,
    pub skill: AtlasSkill,
    #[serde(default)]
    pub unlock_materials: Vec<AtlasUpgradeItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoblePhantasm {
    pub card: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Faces {
    #[serde(default)]
    pub ascension: RangedMap<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraAssets {
    #[serde(default)]
    pub faces: Faces,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Coin {
    pub item: AtlasItem,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCaps {
    #[serde(default)]
    pub ascension: RangedMap<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AscensionAdd {
    #[serde(default)]
    pub lv_max: LevelCaps,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameChange {
    pub name: String,
}

/// A record from the `nice_servant` exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasServant {
    pub id: ServantId,
    pub collection_no: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: u32,
    #[serde(default)]
    pub extra_assets: ExtraAssets,
    #[serde(default)]
    pub coin: Option<Coin>,
    #[serde(default)]
    pub ascension_materials: RangedMap<AtlasUpgrade>,
    #[serde(default)]
    pub skill_materials: RangedMap<AtlasUpgrade>,
    #[serde(default)]
    pub append_skill_materials: RangedMap<AtlasUpgrade>,
    #[serde(default)]
    pub skills: Vec<AtlasSkill>,
    #[serde(default)]
    pub append_passive: Vec<AtlasAppendSkill>,
    #[serde(default)]
    pub exp_growth: Vec<u64>,
    #[serde(default)]
    pub noble_phantasms: Vec<NoblePhantasm>,
    #[serde(default)]
    pub ascension_add: AscensionAdd,
    #[serde(default)]
    pub svt_change: Vec<NameChange>,
}

/// A record from the `basic_event` export.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: EventId,
    pub name: String,
    pub started_at: i64,
    pub finished_at: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub object_id: ItemId,
    pub num: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopEntry {
    #[serde(default)]
    pub target_ids: Vec<ItemId>,
    pub limit_num: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryBox {
    pub box_index: u32,
    pub max_num: u64,
    #[serde(default)]
    pub gifts: Vec<Reward>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lottery {
    #[serde(default)]
    pub boxes: Vec<LotteryBox>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mission {
    #[serde(default)]
    pub gifts: Vec<Reward>,
}

/// Full event detail from `nice/JP/event/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasEvent {
    #[serde(default)]
    pub war_ids: Vec<WarId>,
    #[serde(default)]
    pub shop: Vec<ShopEntry>,
    #[serde(default)]
    pub lotteries: Vec<Lottery>,
    #[serde(default)]
    pub missions: Vec<Mission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quest {
    #[serde(default)]
    pub gifts: Vec<Reward>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Spot {
    #[serde(default)]
    pub quests: Vec<Quest>,
}

/// Full war detail from `nice/JP/war/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct War {
    #[serde(default)]
    pub spots: Vec<Spot>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasGrailCost {
    pub qp: u64,
    pub add_lv_max: u32,
}

/// Grail tiers keyed by rarity, then by tier number.
pub type AtlasGrailCosts = RangedMap<RangedMap<AtlasGrailCost>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_servant_with_sparse_maps() {
        let json = r#"{
            "id": 100100,
            "collectionNo": 2,
            "name": "Altria Pendragon",
            "type": "normal",
            "rarity": 5,
            "extraAssets": {"faces": {"ascension": {"1": "a1", "2": "a2", "3": "a3", "4": "a4"}}},
            "skillMaterials": {"1": {"items": [], "qp": 20000}},
            "ascensionAdd": {"lvMax": {"ascension": {"0": 50, "1": 60}}},
            "noblePhantasms": [{"card": "buster"}],
            "svtChange": []
        }"#;

        let servant: AtlasServant = serde_json::from_str(json).unwrap();
        assert_eq!(servant.id, ServantId::tag(100100));
        assert_eq!(servant.extra_assets.faces.ascension.get(&3).map(String::as_str), Some("a3"));
        assert_eq!(servant.skill_materials[&1].qp, 20000);
        assert_eq!(servant.ascension_add.lv_max.ascension.get(&1), Some(&60));
        assert!(servant.ascension_materials.is_empty());
        assert!(servant.coin.is_none());
    }

    #[test]
    fn test_grail_costs_by_rarity() {
        let json = r#"{"0": {"1": {"qp": 400000, "addLvMax": 2}}, "5": {"1": {"qp": 3000000, "addLvMax": 2}, "2": {"qp": 4000000, "addLvMax": 4}}}"#;

        let costs: AtlasGrailCosts = serde_json::from_str(json).unwrap();
        assert_eq!(costs[&5].len(), 2);
        assert_eq!(costs[&5][&2].add_lv_max, 4);
    }

    #[test]
    fn test_event_defaults() {
        let event: AtlasEvent = serde_json::from_str(r#"{"warIds": [9033]}"#).unwrap();
        assert_eq!(event.war_ids, vec![WarId::tag(9033)]);
        assert!(event.shop.is_empty() && event.lotteries.is_empty() && event.missions.is_empty());
    }
}
