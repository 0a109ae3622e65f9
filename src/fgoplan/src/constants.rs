//! Well-known ids and tuning constants

use crate::id::{EventId, ItemId, ServantId};

/// QP, the primary currency.
pub const QP_ID: ItemId = ItemId::tag(1);

/// Legacy QP id used by old roster snapshots.
pub const LEGACY_QP_ID: ItemId = ItemId::tag(5);

/// Holy grail, the overflow-tier consumable.
pub const GRAIL_ID: ItemId = ItemId::tag(7999);

/// Synthetic item standing in for experience cards.
pub const EXP_ID: ItemId = ItemId::tag(9770400);

/// Character selected for freshly added roster entries.
pub const DEFAULT_SERVANT_ID: ServantId = ServantId::tag(100100);

/// Experience granted per card without class bonus.
pub const EXP_NORMAL: u64 = 27_000;

/// Experience granted per card with class bonus.
pub const EXP_EFFECTIVE: u64 = 32_400;

/// Overflow tiers whose cap exceeds this level also cost coins.
pub const COIN_LEVEL_THRESHOLD: u32 = 100;

/// Coins consumed per overflow tier past [`COIN_LEVEL_THRESHOLD`].
pub const COINS_PER_TIER: u64 = 30;

/// Event that never carries anything worth planning for.
pub const IGNORED_EVENT_ID: EventId = EventId::tag(80038);
