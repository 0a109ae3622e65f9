//! Small synthetic dataset shared by unit tests

use crate::catalog::Catalog;
use crate::constants::{GRAIL_ID, QP_ID};
use crate::data::{DataDump, GrailCost, Item, Servant, UpgradeItem, UpgradeRequirements};
use crate::id::{ItemId, ServantId};

pub const GEM: ItemId = ItemId::tag(6001);
pub const MONUMENT: ItemId = ItemId::tag(7001);
pub const COIN: ItemId = ItemId::tag(9_000_001);

pub const LOW_RARITY: ServantId = ServantId::tag(100100);
pub const FIVE_STAR: ServantId = ServantId::tag(200100);
pub const FREE_ASCENSION: ServantId = ServantId::tag(300100);

fn item(id: ItemId, name: &str, priority: i32) -> Item {
    Item {
        id,
        name: name.into(),
        icon: format!("/{}.png", id),
        background: "gold".into(),
        priority,
        always_display: true,
        events: vec![],
        drops: vec![],
    }
}

fn step(qp: u64, items: &[(ItemId, u64)]) -> UpgradeRequirements {
    UpgradeRequirements::new(
        qp,
        items.iter().map(|&(item, amount)| UpgradeItem { item, amount }),
    )
}

fn servant(id: ServantId, name: &str, rarity: u32, lvl_max: [u32; 5], webcrow_id: u32) -> Servant {
    Servant {
        id,
        name: name.into(),
        aliases: vec![],
        rarity,
        np_type: None,
        coin: Some(COIN),
        ascensions: (1..=4).map(|x| format!("/asc{}.png", x)).collect(),
        skill_materials: (1..=9).map(|i| step(i * 100, &[(GEM, i)])).collect(),
        append_skill_materials: std::iter::once(step(0, &[(COIN, 120)]))
            .chain((1..=9).map(|_| step(1000, &[(MONUMENT, 2)])))
            .collect(),
        ascension_materials: Some((1..=4).map(|i| step(i * 500, &[(MONUMENT, i)])).collect()),
        lvl_max: lvl_max.to_vec(),
        skills: vec![vec![], vec![], vec![]],
        append_skills: vec![vec![], vec![], vec![]],
        webcrow_id,
    }
}

/// Cumulative schedule adding two levels per tier up to level 120.
fn five_star_tiers() -> Vec<GrailCost> {
    (1..=15)
        .map(|i| GrailCost {
            add: i * 2,
            qp: u64::from(i) * 1_000_000,
        })
        .collect()
}

pub fn dump() -> DataDump {
    let mut free = servant(FREE_ASCENSION, "Mash Kyrielight", 3, [40, 50, 60, 70, 80], 1);
    free.ascension_materials = None;

    DataDump {
        servants: vec![
            servant(LOW_RARITY, "Test Servant", 1, [4, 6, 8, 9, 10], 2),
            servant(FIVE_STAR, "Artoria Pendragon", 5, [50, 60, 70, 80, 90], 3),
            free,
        ],
        items: vec![
            item(QP_ID, "QP", 1),
            item(GEM, "Gem of Saber", 100),
            item(MONUMENT, "Saber Monument", 200),
            item(GRAIL_ID, "Holy Grail", 300),
            item(COIN, "Servant Coin", 400),
        ],
        events: vec![],
        exp_growth: (0..120).map(|i| i * 10_000).collect(),
        grail_costs: vec![
            vec![],
            vec![GrailCost { add: 2, qp: 1000 }, GrailCost { add: 4, qp: 2000 }],
            vec![],
            vec![GrailCost { add: 10, qp: 500_000 }, GrailCost { add: 20, qp: 600_000 }],
            vec![],
            five_star_tiers(),
        ],
    }
}

pub fn catalog() -> Catalog {
    Catalog::new(dump())
}
