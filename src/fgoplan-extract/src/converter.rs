//! Merging the regional exports into the dataset model
//!
//! The primary export (JP, English translations) has every servant and the
//! complete material tables. The reference export (NA) contributes official
//! names and skill records. Every item mentioned by an upgrade cost is
//! registered on first sight so the finished catalog never has dangling ids.

use crate::atlas::{
    AtlasItem, AtlasServant, AtlasSkill, AtlasUpgrade, AtlasUpgradeItem, ENEMY_COLLECTION_TYPE,
};
use crate::range::{convert_opt_ranged_map, convert_ranged_map};
use anyhow::{Context, Result};
use fgoplan::constants::EXP_ID;
use fgoplan::data::{CardColour, IdMap};
use fgoplan::{Item, ItemId, Servant, ServantId, Skill, UpgradeItem, UpgradeRequirements};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::iter;
use tracing::warn;

/// Item types hidden from the requirements table unless actually needed.
const BORING_ITEM_TYPES: &[&str] = &["svtCoin", "eventItem", "eventPoint"];

const SKILL_SLOTS: usize = 3;
const FIRST_SKILL_NUM: u32 = 1;
const FIRST_APPEND_SKILL_NUM: u32 = 100;

static ALTRIA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAltria\b").expect("valid regex"));

/// Apply the house spelling of historically inconsistent names.
pub fn normalize_name(name: &str) -> String {
    ALTRIA.replace(name.trim(), "Artoria").into_owned()
}

fn exp_item() -> Item {
    Item {
        id: EXP_ID,
        name: "Blaze of Wisdom".into(),
        icon: "https://static.atlasacademy.io/NA/Faces/f_97704000.png".into(),
        background: "zero".into(),
        priority: 11,
        always_display: true,
        events: vec![],
        drops: vec![],
    }
}

/// Names a servant has been known by, excluding its current name.
///
/// These are the name change history of both regions plus `raw`, the name
/// before spelling normalization.
fn collect_aliases(
    name: &str,
    raw: &str,
    primary: &AtlasServant,
    reference: Option<&AtlasServant>,
) -> Vec<String> {
    let history = reference
        .into_iter()
        .chain(iter::once(primary))
        .flat_map(|servant| servant.svt_change.iter().map(|x| x.name.as_str()));

    let mut aliases: Vec<String> = Vec::new();
    for alias in history.chain(iter::once(raw)).map(str::trim) {
        if alias.is_empty() || alias == name || aliases.iter().any(|x| x == alias) {
            continue;
        }
        aliases.push(alias.to_string());
    }
    aliases
}

/// Group skills into their slots, keeping the first record seen for each id.
fn merge_skills<'a>(
    servant: &str,
    skills: impl IntoIterator<Item = (u32, &'a AtlasSkill)>,
    first_num: u32,
) -> Vec<Vec<Skill>> {
    let mut slots = vec![Vec::new(); SKILL_SLOTS];
    let mut seen = HashSet::new();

    for (num, skill) in skills {
        let Some(slot) = num
            .checked_sub(first_num)
            .and_then(|x| slots.get_mut(x as usize))
        else {
            warn!("Skill {} of {} has unexpected slot {}", skill.id, servant, num);
            continue;
        };
        if !seen.insert(skill.id) {
            continue;
        }

        slot.push(Skill {
            id: skill.id,
            num,
            name: skill.name.clone(),
            detail: skill.detail.clone(),
            icon: skill.icon.clone(),
        });
    }

    slots
}

pub struct Converter {
    exp_growth: Vec<u64>,
    reference_items: HashMap<ItemId, AtlasItem>,
    items: IdMap<ItemId, Item>,
    servants: IdMap<ServantId, Servant>,
}

impl Converter {
    /// Create a converter checking servants against `exp_growth`. Items are
    /// described using `reference_items` where possible.
    pub fn new(exp_growth: Vec<u64>, reference_items: &[AtlasItem]) -> Self {
        let mut items = IdMap::new();
        items.insert(EXP_ID, exp_item());

        Self {
            exp_growth,
            reference_items: reference_items.iter().map(|x| (x.id, x.clone())).collect(),
            items,
            servants: IdMap::new(),
        }
    }

    pub fn items(&self) -> &IdMap<ItemId, Item> {
        &self.items
    }

    pub fn servants(&self) -> &IdMap<ServantId, Servant> {
        &self.servants
    }

    pub fn into_parts(self) -> (IdMap<ServantId, Servant>, IdMap<ItemId, Item>) {
        (self.servants, self.items)
    }

    /// Register an item. The first registration of an id wins.
    ///
    /// `always_display` overrides the type-based default when set.
    pub fn add_item(&mut self, item: &AtlasItem, always_display: Option<bool>) {
        if self.items.contains_key(&item.id) {
            return;
        }

        let source = self.reference_items.get(&item.id).unwrap_or(item);
        let always_display =
            always_display.unwrap_or_else(|| !BORING_ITEM_TYPES.contains(&source.kind.as_str()));

        self.items.insert(
            item.id,
            Item {
                id: item.id,
                name: source.name.trim().to_string(),
                icon: source.icon.clone(),
                background: source.background.clone(),
                priority: source.priority,
                always_display,
                events: vec![],
                drops: vec![],
            },
        );
    }

    fn convert_upgrade_item(&mut self, upgrade: &AtlasUpgradeItem) -> UpgradeItem {
        self.add_item(&upgrade.item, None);
        UpgradeItem {
            item: upgrade.item.id,
            amount: upgrade.amount,
        }
    }

    fn convert_upgrade(&mut self, upgrade: Option<&AtlasUpgrade>) -> UpgradeRequirements {
        let Some(upgrade) = upgrade else {
            return UpgradeRequirements::default();
        };

        let items: Vec<_> = upgrade
            .items
            .iter()
            .map(|x| self.convert_upgrade_item(x))
            .collect();
        UpgradeRequirements::new(upgrade.qp, items)
    }

    /// The unlock cost followed by the cost of each append skill level.
    fn convert_append_materials(
        &mut self,
        primary: &AtlasServant,
        reference: Option<&AtlasServant>,
    ) -> Vec<UpgradeRequirements> {
        let unlock = primary
            .append_passive
            .iter()
            .chain(reference.into_iter().flat_map(|x| &x.append_passive))
            .min_by_key(|x| x.num);
        if unlock.is_none() && primary.append_skill_materials.is_empty() {
            return Vec::new();
        }

        let unlock_items: Vec<_> = unlock
            .into_iter()
            .flat_map(|x| &x.unlock_materials)
            .map(|x| self.convert_upgrade_item(x))
            .collect();

        iter::once(UpgradeRequirements::new(0, unlock_items))
            .chain(convert_opt_ranged_map(
                &primary.append_skill_materials,
                1,
                9,
                |x| self.convert_upgrade(x),
            ))
            .collect()
    }

    /// Merge one servant from the primary export with its reference record.
    ///
    /// Fails if a field the schema guarantees is missing.
    pub fn add_servant(
        &mut self,
        primary: &AtlasServant,
        reference: Option<&AtlasServant>,
    ) -> Result<()> {
        if primary.kind == ENEMY_COLLECTION_TYPE {
            return Ok(());
        }
        if self.servants.contains_key(&primary.id) {
            warn!("Servant #{} appears twice, keeping the first", primary.id);
            return Ok(());
        }

        let raw_name = reference.map_or(&primary.name, |x| &x.name);
        let name = normalize_name(raw_name);
        if reference.is_some() {
            let primary_name = normalize_name(&primary.name);
            if primary_name != name {
                warn!(
                    "Servants for id #{} do not match ({} vs {})",
                    primary.id, primary_name, name
                );
            }
        }

        let aliases = collect_aliases(&name, raw_name, primary, reference);

        let skills = merge_skills(
            &name,
            reference
                .into_iter()
                .chain(iter::once(primary))
                .flat_map(|x| x.skills.iter().map(|skill| (skill.num, skill))),
            FIRST_SKILL_NUM,
        );
        let append_skills = merge_skills(
            &name,
            reference
                .into_iter()
                .chain(iter::once(primary))
                .flat_map(|x| x.append_passive.iter().map(|append| (append.num, &append.skill))),
            FIRST_APPEND_SKILL_NUM,
        );

        let coin = primary
            .coin
            .as_ref()
            .or_else(|| reference.and_then(|x| x.coin.as_ref()))
            .map(|coin| {
                self.add_item(&coin.item, None);
                coin.item.id
            });

        let ascensions =
            convert_ranged_map(&primary.extra_assets.faces.ascension, 1, 4, String::clone)
                .with_context(|| format!("Ascension art of {} (#{})", name, primary.id))?;
        let lvl_max = convert_ranged_map(&primary.ascension_add.lv_max.ascension, 0, 4, |x| *x)
            .with_context(|| format!("Level caps of {} (#{})", name, primary.id))?;

        let skill_materials =
            convert_opt_ranged_map(&primary.skill_materials, 1, 9, |x| self.convert_upgrade(x));
        let append_skill_materials = self.convert_append_materials(primary, reference);
        let ascension_materials = if primary.ascension_materials.is_empty() {
            None
        } else {
            let materials = convert_ranged_map(&primary.ascension_materials, 0, 3, |x| {
                self.convert_upgrade(Some(x))
            })
            .with_context(|| format!("Ascension materials of {} (#{})", name, primary.id))?;
            Some(materials)
        };

        let exp_matches = self
            .exp_growth
            .iter()
            .enumerate()
            .all(|(i, exp)| primary.exp_growth.get(i) == Some(exp));
        if !exp_matches {
            warn!("Exp growth for {} does not match", name);
        }

        let servant = Servant {
            id: primary.id,
            name,
            aliases,
            rarity: primary.rarity,
            np_type: primary
                .noble_phantasms
                .first()
                .and_then(|x| CardColour::from_name(&x.card)),
            coin,
            ascensions,
            skill_materials,
            append_skill_materials,
            ascension_materials,
            lvl_max,
            skills,
            append_skills,
            webcrow_id: primary.collection_no,
        };
        self.servants.insert(servant.id, servant);

        Ok(())
    }
}
