//! Event reward scanning
//!
//! Builds the reverse index of which upcoming events hand out which items.
//! Dates are shifted from the JP server onto the NA schedule, which trails it
//! by roughly two years.

use crate::atlas::{AtlasEvent, EventSummary, War};
use anyhow::Result;
use chrono::{DateTime, Months, Utc};
use fgoplan::constants::IGNORED_EVENT_ID;
use fgoplan::data::IdMap;
use fgoplan::{EventAppearance, EventId, EventKind, GameEvent, Item, ItemId, QP_ID, WarId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

/// Lottery box whose contents are reported.
const LOTTERY_BOX_INDEX: u32 = 10;

/// Flavour text after a tilde, full-width or not.
static FLAVOUR_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(" *[～~].*$").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Approximate NA date of something happening at `jp` (unix seconds) on JP.
pub fn date_in_na(jp: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(jp, 0)?.checked_add_months(Months::new(24))
}

/// Format a date as e.g. `16 Oct 2026`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%-d %b %Y").to_string()
}

/// Strip flavour text and collapse whitespace in an event name.
pub fn clean_event_name(name: &str) -> String {
    let name = FLAVOUR_TEXT.replace(name, "");
    WHITESPACE.replace_all(&name, " ").into_owned()
}

/// Events still running on NA as of `now`, soonest first.
pub fn recent_events(events: &[EventSummary], now: DateTime<Utc>) -> Vec<&EventSummary> {
    let mut recent: Vec<_> = events
        .iter()
        .filter(|x| x.id != IGNORED_EVENT_ID)
        .filter(|x| date_in_na(x.finished_at).is_some_and(|end| end >= now))
        .collect();
    recent.sort_by_key(|x| x.started_at);
    recent
}

/// Records the rewards of one channel (shop, lottery, ...) of one event.
pub struct RewardScan<'a> {
    items: &'a mut IdMap<ItemId, Item>,
    event: EventId,
    kind: EventKind,
    seen: HashMap<ItemId, usize>,
}

impl<'a> RewardScan<'a> {
    pub fn new(items: &'a mut IdMap<ItemId, Item>, event: EventId, kind: EventKind) -> Self {
        Self {
            items,
            event,
            kind,
            seen: HashMap::new(),
        }
    }

    /// Record that the event grants `amount` of `id`.
    ///
    /// Repeated grants of the same item are summed into one appearance.
    /// Returns whether the grant is worth reporting: QP and items missing from
    /// the catalog are ignored.
    pub fn record(&mut self, id: ItemId, amount: u64) -> bool {
        if id == QP_ID {
            return false;
        }
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };

        if let Some(&index) = self.seen.get(&id) {
            item.events[index].amount += amount;
            return true;
        }

        self.seen.insert(id, item.events.len());
        item.events.push(EventAppearance {
            event: self.event,
            amount,
            kind: self.kind,
        });
        true
    }
}

/// Record every reward of an event onto `items`, returning whether any of
/// them was worth reporting.
///
/// `wars` must provide every war the event references.
pub fn scan_event<'w>(
    name: &str,
    id: EventId,
    detail: &AtlasEvent,
    mut wars: impl FnMut(WarId) -> Result<&'w War>,
    items: &mut IdMap<ItemId, Item>,
) -> Result<bool> {
    let mut useful = false;

    let mut scan = RewardScan::new(items, id, EventKind::Shop);
    for entry in &detail.shop {
        match entry.target_ids.as_slice() {
            [target] => useful |= scan.record(*target, entry.limit_num),
            _ => warn!("Event '{}' has shop item whose length !== 1", name),
        }
    }

    let mut scan = RewardScan::new(items, id, EventKind::Lottery);
    for lottery in &detail.lotteries {
        for lottery_box in &lottery.boxes {
            if lottery_box.box_index != LOTTERY_BOX_INDEX {
                continue;
            }
            match lottery_box.gifts.as_slice() {
                [gift] => useful |= scan.record(gift.object_id, lottery_box.max_num),
                _ => warn!("Event '{}' has lottery whose length !== 1", name),
            }
        }
    }

    let mut scan = RewardScan::new(items, id, EventKind::Mission);
    for mission in &detail.missions {
        for gift in &mission.gifts {
            useful |= scan.record(gift.object_id, gift.num);
        }
    }

    let mut scan = RewardScan::new(items, id, EventKind::Quest);
    for &war_id in &detail.war_ids {
        let war = wars(war_id)?;
        for spot in &war.spots {
            for quest in &spot.quests {
                for gift in &quest.gifts {
                    useful |= scan.record(gift.object_id, gift.num);
                }
            }
        }
    }

    Ok(useful)
}

/// Scan every recent event, returning the useful ones in schedule order.
pub fn useful_events<'w>(
    recent: &[&EventSummary],
    mut details: impl FnMut(EventId) -> Result<AtlasEvent>,
    mut wars: impl FnMut(WarId) -> Result<&'w War>,
    items: &mut IdMap<ItemId, Item>,
) -> Result<Vec<GameEvent>> {
    let mut useful = Vec::new();
    for event in recent {
        let name = clean_event_name(&event.name);
        let detail = details(event.id)?;

        if scan_event(&name, event.id, &detail, &mut wars, items)? {
            let date = date_in_na(event.started_at)
                .map(format_date)
                .unwrap_or_default();
            useful.push(GameEvent {
                id: event.id,
                name,
                date,
            });
        }
    }
    Ok(useful)
}
