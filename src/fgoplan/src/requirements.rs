//! Material requirements engine
//!
//! Computes the QP, experience and items needed to take a roster entry from
//! its current state to its targets. Everything here is a pure function over
//! explicit inputs: the caller owns the [`Requirements`] accumulator, and
//! requirements are recomputed from scratch whenever a Target changes.

use crate::ascension::ascension_target;
use crate::catalog::Catalog;
use crate::constants::{COINS_PER_TIER, COIN_LEVEL_THRESHOLD, EXP_EFFECTIVE, EXP_NORMAL, GRAIL_ID};
use crate::data::{GrailCosts, Servant, UpgradeRequirements};
use crate::id::ItemId;
use crate::roster::{OwnedServant, Target};
use std::collections::BTreeMap;

/// Accumulated requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    pub qp: u64,
    /// Experience cards needed without class bonus.
    pub exp: u64,
    /// Experience cards needed with class bonus.
    pub exp_bonus: u64,
    pub items: BTreeMap<ItemId, u64>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: ItemId, amount: u64) {
        *self.items.entry(item).or_insert(0) += amount;
    }

    /// Amount of `item` required, zero if not required at all.
    pub fn item(&self, item: ItemId) -> u64 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.qp == 0 && self.exp == 0 && self.exp_bonus == 0 && self.items.is_empty()
    }
}

/// Add the cost of every step between `current` and `target`.
///
/// `materials[i]` is the cost of going from `i + offset` to `i + offset + 1`.
/// An unset `current` starts from `offset`; an unset `target` adds nothing.
/// Steps outside the table contribute nothing.
pub fn add_requirements(
    requirements: &mut Requirements,
    target: Target,
    offset: u32,
    materials: &[UpgradeRequirements],
) {
    let Some(end) = target.target else {
        return;
    };
    let start = target.current.unwrap_or(offset).max(offset);

    for level in start..end {
        let Some(step) = materials.get((level - offset) as usize) else {
            break;
        };

        for item in &step.items {
            requirements.add_item(item.item, item.amount);
        }
        requirements.qp += step.qp;
    }
}

/// Add experience and overflow-tier costs for levelling a servant.
pub fn add_exp_requirements(
    requirements: &mut Requirements,
    exp_growth: &[u64],
    grail_costs: &GrailCosts,
    owned: &OwnedServant,
    details: &Servant,
) {
    let current = owned.level.current.unwrap_or(1);
    let Some(target) = owned.level.target else {
        return;
    };
    if current >= target {
        return;
    }

    let exp_at = |level: u32| level.checked_sub(1).and_then(|i| exp_growth.get(i as usize));
    if let (Some(current_exp), Some(target_exp)) = (exp_at(current), exp_at(target)) {
        let cost = target_exp.saturating_sub(*current_exp);
        requirements.exp += cost.div_ceil(EXP_NORMAL);
        requirements.exp_bonus += cost.div_ceil(EXP_EFFECTIVE);
    }

    let max_level = details.natural_max_level();
    if target <= max_level {
        return;
    }
    let Some(tiers) = grail_costs.get(details.rarity as usize) else {
        return;
    };

    let mut start = 0;
    if current > max_level {
        // Tiers up to and including the one that reached `current` are paid.
        while start < tiers.len() && max_level + tiers[start].add < current {
            start += 1;
        }
        start += 1;
    }

    let mut grails = 0;
    let mut coins = 0;
    for tier in tiers.iter().skip(start) {
        let capped = max_level + tier.add;
        requirements.qp += tier.qp;
        grails += 1;
        if capped > COIN_LEVEL_THRESHOLD {
            coins += COINS_PER_TIER;
        }
        if capped >= target {
            break;
        }
    }

    if grails > 0 {
        requirements.add_item(GRAIL_ID, grails);
    }
    if let Some(coin) = details.coin.filter(|_| coins > 0) {
        requirements.add_item(coin, coins);
    }
}

/// Add a servant's requirements, split into ascension/levelling costs and
/// skill costs.
pub fn add_split_servant_requirements(
    ascension_reqs: &mut Requirements,
    skill_reqs: &mut Requirements,
    catalog: &Catalog,
    owned: &OwnedServant,
    details: &Servant,
) {
    for skill in &owned.skills {
        add_requirements(skill_reqs, *skill, 1, &details.skill_materials);
    }
    for skill in &owned.append_skills {
        add_requirements(skill_reqs, *skill, 0, &details.append_skill_materials);
    }
    if let Some(materials) = &details.ascension_materials {
        add_requirements(ascension_reqs, ascension_target(details, owned), 0, materials);
    }

    add_exp_requirements(
        ascension_reqs,
        catalog.exp_growth(),
        catalog.grail_costs(),
        owned,
        details,
    );
}

/// Add all of a servant's requirements to one accumulator.
pub fn add_servant_requirements(
    requirements: &mut Requirements,
    catalog: &Catalog,
    owned: &OwnedServant,
    details: &Servant,
) {
    let mut skills = Requirements::new();
    add_split_servant_requirements(requirements, &mut skills, catalog, owned, details);

    requirements.qp += skills.qp;
    requirements.exp += skills.exp;
    requirements.exp_bonus += skills.exp_bonus;
    for (item, amount) in skills.items {
        requirements.add_item(item, amount);
    }
}

/// Total requirements of every roster entry accepted by `filter`.
///
/// Entries whose servant is missing from the catalog are skipped.
pub fn compute_requirements_filtered<F>(
    roster: &[OwnedServant],
    catalog: &Catalog,
    mut filter: F,
) -> Requirements
where
    F: FnMut(&OwnedServant, &Servant) -> bool,
{
    let mut requirements = Requirements::new();
    for owned in roster {
        let Some(details) = catalog.servant(owned.id) else {
            continue;
        };
        if filter(owned, details) {
            add_servant_requirements(&mut requirements, catalog, owned, details);
        }
    }
    requirements
}

/// Total requirements of the whole roster.
pub fn compute_requirements(roster: &[OwnedServant], catalog: &Catalog) -> Requirements {
    compute_requirements_filtered(roster, catalog, |_, _| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::QP_ID;
    use crate::fixtures::{self, COIN, FIVE_STAR, FREE_ASCENSION, GEM, LOW_RARITY, MONUMENT};
    use crate::roster::new_servant;

    fn owned(id: crate::id::ServantId) -> OwnedServant {
        new_servant(Some(id))
    }

    fn compute(servant: &OwnedServant) -> Requirements {
        compute_requirements(std::slice::from_ref(servant), &fixtures::catalog())
    }

    #[test]
    fn test_unset_target_adds_nothing() {
        let catalog = fixtures::catalog();
        let details = catalog.servant(LOW_RARITY).unwrap();

        let mut requirements = Requirements::new();
        for current in [None, Some(1), Some(5), Some(10)] {
            add_requirements(
                &mut requirements,
                Target::new(current, None),
                1,
                &details.skill_materials,
            );
        }
        assert!(requirements.is_empty());
    }

    #[test]
    fn test_equal_current_and_target_adds_nothing() {
        let catalog = fixtures::catalog();
        let details = catalog.servant(LOW_RARITY).unwrap();

        let mut requirements = Requirements::new();
        for level in 1..=10 {
            add_requirements(
                &mut requirements,
                Target::between(level, level),
                1,
                &details.skill_materials,
            );
        }
        assert!(requirements.is_empty());
    }

    #[test]
    fn test_skill_materials() {
        let mut servant = owned(LOW_RARITY);
        servant.skills[0] = Target::between(1, 10);

        let requirements = compute(&servant);
        // Steps 1..9 cost i * 100 QP and i gems.
        assert_eq!(requirements.qp, 4500);
        assert_eq!(requirements.item(GEM), 45);
    }

    #[test]
    fn test_skills_default_to_level_one() {
        let mut explicit = owned(LOW_RARITY);
        explicit.skills[0] = Target::between(1, 10);

        let mut implicit = owned(LOW_RARITY);
        implicit.skills[0].target = Some(10);

        assert_eq!(compute(&explicit), compute(&implicit));
    }

    #[test]
    fn test_skills_stack_across_slots() {
        let mut servant = owned(LOW_RARITY);
        servant.skills = [Target::between(1, 2), Target::between(1, 2), Target::between(9, 10)];

        let requirements = compute(&servant);
        assert_eq!(requirements.qp, 100 + 100 + 900);
        assert_eq!(requirements.item(GEM), 1 + 1 + 9);
    }

    #[test]
    fn test_append_skill_unlock_is_first_step() {
        let mut servant = owned(LOW_RARITY);
        servant.append_skills[0].target = Some(1);

        let requirements = compute(&servant);
        assert_eq!(requirements.item(COIN), 120);
        assert_eq!(requirements.qp, 0);

        servant.append_skills[0] = Target::between(0, 3);
        let requirements = compute(&servant);
        assert_eq!(requirements.item(COIN), 120);
        assert_eq!(requirements.item(MONUMENT), 4);
        assert_eq!(requirements.qp, 2000);
    }

    #[test]
    fn test_ascension_materials() {
        let mut servant = owned(LOW_RARITY);
        servant.ascension = Target::between(0, 4);

        let requirements = compute(&servant);
        assert_eq!(requirements.qp, 500 + 1000 + 1500 + 2000);
        assert_eq!(requirements.item(MONUMENT), 10);
    }

    #[test]
    fn test_ascension_defaults_to_zero() {
        let mut explicit = owned(LOW_RARITY);
        explicit.ascension = Target::between(0, 4);

        let mut implicit = owned(LOW_RARITY);
        implicit.ascension.target = Some(4);

        assert_eq!(compute(&explicit), compute(&implicit));
    }

    #[test]
    fn test_ascension_inferred_from_level_target() {
        let mut servant = owned(LOW_RARITY);
        servant.level = Target::between(1, 9);

        // Level 9 needs stage 3, level 1 is stage 0.
        let requirements = compute(&servant);
        assert_eq!(requirements.item(MONUMENT), 1 + 2 + 3);
    }

    #[test]
    fn test_free_ascension_costs_nothing() {
        let mut servant = owned(FREE_ASCENSION);
        servant.ascension = Target::between(0, 4);

        assert!(compute(&servant).is_empty());
    }

    #[test]
    fn test_levelling_exp() {
        let mut servant = owned(FIVE_STAR);
        servant.level = Target::between(1, 90);
        servant.ascension = Target::between(4, 4);

        let requirements = compute(&servant);
        // 890_000 exp at 27_000 and 32_400 per card.
        assert_eq!(requirements.exp, 33);
        assert_eq!(requirements.exp_bonus, 28);
        assert_eq!(requirements.item(GRAIL_ID), 0);
    }

    #[test]
    fn test_level_defaults_to_one() {
        let mut servant = owned(FIVE_STAR);
        servant.level.target = Some(1);
        assert!(compute(&servant).is_empty());

        let mut explicit = owned(FIVE_STAR);
        explicit.level = Target::between(1, 50);
        let mut implicit = owned(FIVE_STAR);
        implicit.level.target = Some(50);
        assert_eq!(compute(&explicit), compute(&implicit));
    }

    #[test]
    fn test_exp_beyond_curve_still_counts_tiers() {
        let catalog = fixtures::catalog();
        let details = catalog.servant(FIVE_STAR).unwrap();
        let mut servant = owned(FIVE_STAR);
        servant.level = Target::between(1, 100);

        let mut requirements = Requirements::new();
        add_exp_requirements(
            &mut requirements,
            &catalog.exp_growth()[..50],
            catalog.grail_costs(),
            &servant,
            details,
        );

        assert_eq!(requirements.exp, 0);
        assert_eq!(requirements.item(GRAIL_ID), 5);
    }

    #[test]
    fn test_natural_max_never_triggers_tiers() {
        let mut servant = owned(FIVE_STAR);
        servant.level = Target::between(1, 90);
        assert_eq!(compute(&servant).item(GRAIL_ID), 0);

        servant.level = Target::between(1, 91);
        let requirements = compute(&servant);
        assert_eq!(requirements.item(GRAIL_ID), 1);
        assert!(requirements.qp >= 1_000_000);
    }

    #[test]
    fn test_grail_resumption() {
        let counts: Vec<u64> = [90, 92, 93]
            .into_iter()
            .map(|current| {
                let mut servant = owned(FIVE_STAR);
                servant.level = Target::between(current, 100);
                compute(&servant).item(GRAIL_ID)
            })
            .collect();

        assert_eq!(counts, vec![5, 4, 3]);
    }

    #[test]
    fn test_grail_coins_past_threshold() {
        let mut servant = owned(FIVE_STAR);
        servant.level = Target::between(100, 104);

        let requirements = compute(&servant);
        assert_eq!(requirements.item(GRAIL_ID), 2);
        assert_eq!(requirements.item(COIN), 60);
        assert_eq!(requirements.qp, 6_000_000 + 7_000_000);
    }

    #[test]
    fn test_tiers_stop_at_schedule_end() {
        let mut servant = owned(FIVE_STAR);
        servant.level = Target::between(1, 200);

        let requirements = compute(&servant);
        assert_eq!(requirements.item(GRAIL_ID), 15);
        assert_eq!(requirements.item(COIN), 10 * 30);
    }

    #[test]
    fn test_increasing_target_is_monotonic() {
        let mut previous = Requirements::new();
        for target in 2..=120 {
            let mut servant = owned(FIVE_STAR);
            servant.level = Target::between(1, target);
            servant.skills[0] = Target::between(1, (target / 12).clamp(1, 10));

            let requirements = compute(&servant);
            assert!(requirements.qp >= previous.qp, "qp decreased at {}", target);
            assert!(requirements.exp >= previous.exp);
            for (item, amount) in &previous.items {
                assert!(requirements.item(*item) >= *amount, "{:?} decreased at {}", item, target);
            }
            previous = requirements;
        }
    }

    #[test]
    fn test_end_to_end_small_schedule() {
        let catalog = fixtures::catalog();
        assert_eq!(catalog.servants().len(), 3);
        assert_eq!(catalog.items().len(), 5);

        let mut servant = owned(LOW_RARITY);
        servant.level = Target::between(1, 14);
        servant.ascension = Target::between(4, 4);

        let requirements = compute_requirements(&[servant], &catalog);
        // 130_000 exp from the curve, two tiers totalling 3000 QP.
        assert_eq!(requirements.exp, 5);
        assert_eq!(requirements.exp_bonus, 5);
        assert_eq!(requirements.item(GRAIL_ID), 2);
        assert_eq!(requirements.qp, 3000);
        assert_eq!(requirements.item(COIN), 0);
        assert_eq!(requirements.item(QP_ID), 0);
    }

    #[test]
    fn test_filtered_roster() {
        let catalog = fixtures::catalog();
        let mut a = owned(LOW_RARITY);
        a.skills[0] = Target::between(1, 2);
        let mut b = owned(LOW_RARITY);
        b.skills[0] = Target::between(1, 3);
        b.priority = crate::roster::Priority::High;
        let missing = owned(crate::id::ServantId::tag(1));

        let roster = [a, b, missing];
        assert_eq!(compute_requirements(&roster, &catalog).item(GEM), 1 + 3);

        let high_only = compute_requirements_filtered(&roster, &catalog, |owned, _| {
            owned.priority == crate::roster::Priority::High
        });
        assert_eq!(high_only.item(GEM), 3);
    }

    #[test]
    fn test_split_requirements() {
        let catalog = fixtures::catalog();
        let details = catalog.servant(LOW_RARITY).unwrap();
        let mut servant = owned(LOW_RARITY);
        servant.ascension = Target::between(0, 1);
        servant.skills[0] = Target::between(1, 2);

        let mut ascension = Requirements::new();
        let mut skills = Requirements::new();
        add_split_servant_requirements(&mut ascension, &mut skills, &catalog, &servant, details);

        assert_eq!(ascension.qp, 500);
        assert_eq!(ascension.item(GEM), 0);
        assert_eq!(skills.qp, 100);
        assert_eq!(skills.item(GEM), 1);
    }
}
