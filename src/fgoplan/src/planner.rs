//! The observable planner state
//!
//! A [`Planner`] pairs an immutable [`Catalog`] with the player's mutable
//! state. Every mutation notifies subscribers with a [`PlannerEvent`], after
//! which views recompute what they need. Requirements are never cached: they
//! are derived from the current roster on each call.

use crate::catalog::Catalog;
use crate::constants::{EXP_ID, QP_ID};
use crate::data::Item;
use crate::formats::Snapshot;
use crate::id::ItemId;
use crate::requirements::{compute_requirements, compute_requirements_filtered, Requirements};
use crate::roster::{matches_filter, Filters, OwnedServant, Priority};
use std::collections::BTreeMap;

/// What changed in a [`Planner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerEvent {
    Roster,
    OwnedItems,
    Filters,
}

/// Handle returned by [`Planner::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(PlannerEvent)>;

/// How a requirements table row reads its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAmount {
    Qp,
    /// Experience cards, counted with the class bonus.
    ExpBonus,
    Item(ItemId),
}

impl RowAmount {
    pub fn get(&self, requirements: &Requirements) -> u64 {
        match *self {
            RowAmount::Qp => requirements.qp,
            RowAmount::ExpBonus => requirements.exp_bonus,
            RowAmount::Item(id) => requirements.item(id),
        }
    }
}

/// One row of the requirements table.
#[derive(Debug, Clone, Copy)]
pub struct RequirementRow<'a> {
    pub item: &'a Item,
    pub amount: RowAmount,
}

impl RequirementRow<'_> {
    /// Rows of items nobody needs are hidden unless marked always-displayed.
    pub fn is_visible(&self, total: &Requirements) -> bool {
        self.item.always_display || self.amount.get(total) > 0
    }
}

pub struct Planner {
    catalog: Catalog,
    roster: Vec<OwnedServant>,
    owned_items: BTreeMap<ItemId, u64>,
    filters: Filters,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Planner {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            roster: Vec::new(),
            owned_items: BTreeMap::new(),
            filters: Filters::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn roster(&self) -> &[OwnedServant] {
        &self.roster
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn owned_items(&self) -> &BTreeMap<ItemId, u64> {
        &self.owned_items
    }

    pub fn owned_item(&self, id: ItemId) -> u64 {
        self.owned_items.get(&id).copied().unwrap_or(0)
    }

    /// Register a callback run after every mutation.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(PlannerEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(x, _)| *x != id);
        self.subscribers.len() != before
    }

    fn publish(&mut self, event: PlannerEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    pub fn add_servant(&mut self, servant: OwnedServant) {
        self.roster.push(servant);
        self.publish(PlannerEvent::Roster);
    }

    /// Replace the roster entry with the same uid. Returns false if there is
    /// no such entry.
    pub fn update_servant(&mut self, servant: OwnedServant) -> bool {
        let Some(existing) = self.roster.iter_mut().find(|x| x.uid == servant.uid) else {
            return false;
        };
        *existing = servant;
        self.publish(PlannerEvent::Roster);
        true
    }

    pub fn remove_servant(&mut self, uid: &str) -> Option<OwnedServant> {
        let index = self.roster.iter().position(|x| x.uid == uid)?;
        let removed = self.roster.remove(index);
        self.publish(PlannerEvent::Roster);
        Some(removed)
    }

    pub fn replace_roster(&mut self, roster: Vec<OwnedServant>) {
        self.roster = roster;
        self.publish(PlannerEvent::Roster);
    }

    /// Record how many of an item the player owns. Zero forgets the item.
    pub fn set_owned_item(&mut self, id: ItemId, count: u64) {
        if count == 0 {
            self.owned_items.remove(&id);
        } else {
            self.owned_items.insert(id, count);
        }
        self.publish(PlannerEvent::OwnedItems);
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
        self.publish(PlannerEvent::Filters);
    }

    /// Replace all player state with a decoded snapshot.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        let Snapshot {
            servants,
            items,
            filters,
        } = snapshot;

        self.roster = servants;
        self.owned_items = items;
        self.filters = filters;
        self.publish(PlannerEvent::Roster);
        self.publish(PlannerEvent::OwnedItems);
        self.publish(PlannerEvent::Filters);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            servants: self.roster.clone(),
            items: self.owned_items.clone(),
            filters: self.filters,
        }
    }

    /// Roster entries passing the current filters.
    pub fn visible_servants(&self) -> impl Iterator<Item = &OwnedServant> {
        self.roster
            .iter()
            .filter(|servant| matches_filter(&self.filters, servant))
    }

    /// Requirements of the whole roster.
    pub fn requirements(&self) -> Requirements {
        compute_requirements(&self.roster, &self.catalog)
    }

    /// Requirements of the roster entries accepted by `filter`.
    pub fn requirements_filtered<F>(&self, mut filter: F) -> Requirements
    where
        F: FnMut(&OwnedServant) -> bool,
    {
        compute_requirements_filtered(&self.roster, &self.catalog, |owned, _| filter(owned))
    }

    pub fn requirements_for_priority(&self, priority: Priority) -> Requirements {
        self.requirements_filtered(|owned| owned.priority == priority)
    }

    /// Rows of the requirements table: QP, experience, then every other item
    /// in catalog order.
    pub fn requirement_rows(&self) -> Vec<RequirementRow<'_>> {
        let mut rows = Vec::with_capacity(self.catalog.items().len());
        if let Some(item) = self.catalog.item(QP_ID) {
            rows.push(RequirementRow {
                item,
                amount: RowAmount::Qp,
            });
        }
        if let Some(item) = self.catalog.item(EXP_ID) {
            rows.push(RequirementRow {
                item,
                amount: RowAmount::ExpBonus,
            });
        }

        rows.extend(
            self.catalog
                .items()
                .iter()
                .filter(|item| item.id != QP_ID && item.id != EXP_ID)
                .map(|item| RequirementRow {
                    item,
                    amount: RowAmount::Item(item.id),
                }),
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GRAIL_ID;
    use crate::data::Item;
    use crate::fixtures::{self, GEM, LOW_RARITY};
    use crate::roster::{new_servant, Target};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn planner() -> Planner {
        Planner::new(fixtures::catalog())
    }

    fn recorder(planner: &mut Planner) -> (SubscriptionId, Rc<RefCell<Vec<PlannerEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let id = planner.subscribe(move |event| sink.borrow_mut().push(event));
        (id, events)
    }

    #[test]
    fn test_mutations_notify_subscribers() {
        let mut planner = planner();
        let (_, events) = recorder(&mut planner);

        let servant = new_servant(Some(LOW_RARITY));
        let uid = servant.uid.clone();
        planner.add_servant(servant);
        planner.set_owned_item(GEM, 3);
        planner.set_filters(Filters {
            maxed: false,
            ..Filters::default()
        });
        assert!(planner.remove_servant(&uid).is_some());
        assert!(planner.remove_servant(&uid).is_none());

        assert_eq!(
            *events.borrow(),
            vec![
                PlannerEvent::Roster,
                PlannerEvent::OwnedItems,
                PlannerEvent::Filters,
                PlannerEvent::Roster,
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut planner = planner();
        let (id, events) = recorder(&mut planner);

        assert!(planner.unsubscribe(id));
        assert!(!planner.unsubscribe(id));
        planner.replace_roster(vec![]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_update_servant_by_uid() {
        let mut planner = planner();
        let mut servant = new_servant(Some(LOW_RARITY));
        planner.add_servant(servant.clone());

        servant.skills[0] = Target::between(1, 4);
        assert!(planner.update_servant(servant));
        assert_eq!(planner.requirements().item(GEM), 1 + 2 + 3);

        assert!(!planner.update_servant(new_servant(None)));
        assert_eq!(planner.roster().len(), 1);
    }

    #[test]
    fn test_requirements_by_priority() {
        let mut planner = planner();
        let mut high = new_servant(Some(LOW_RARITY));
        high.priority = Priority::High;
        high.skills[0] = Target::between(1, 2);
        let mut low = new_servant(Some(LOW_RARITY));
        low.skills[0] = Target::between(1, 3);
        planner.replace_roster(vec![high, low]);

        assert_eq!(planner.requirements().item(GEM), 4);
        assert_eq!(planner.requirements_for_priority(Priority::High).item(GEM), 1);
        assert_eq!(planner.requirements_for_priority(Priority::Low).item(GEM), 3);
        assert!(planner.requirements_for_priority(Priority::Medium).is_empty());
    }

    #[test]
    fn test_owned_items() {
        let mut planner = planner();
        planner.set_owned_item(GRAIL_ID, 2);
        assert_eq!(planner.owned_item(GRAIL_ID), 2);

        planner.set_owned_item(GRAIL_ID, 0);
        assert_eq!(planner.owned_item(GRAIL_ID), 0);
        assert!(planner.owned_items().is_empty());
    }

    #[test]
    fn test_visible_servants() {
        let mut planner = planner();
        let mut maxed = new_servant(Some(LOW_RARITY));
        maxed.level = Target::between(10, 10);
        maxed.skills = [Target::between(10, 10); 3];
        planner.replace_roster(vec![maxed, new_servant(Some(LOW_RARITY))]);

        assert_eq!(planner.visible_servants().count(), 2);
        planner.set_filters(Filters {
            maxed: false,
            ..Filters::default()
        });
        assert_eq!(planner.visible_servants().count(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut planner = planner();
        planner.add_servant(new_servant(Some(LOW_RARITY)));
        planner.set_owned_item(GEM, 7);
        let snapshot = planner.snapshot();

        let mut other = Planner::new(fixtures::catalog());
        let (_, events) = recorder(&mut other);
        other.load_snapshot(snapshot.clone());

        assert_eq!(other.snapshot(), snapshot);
        assert_eq!(events.borrow().len(), 3);
    }

    #[test]
    fn test_requirement_rows() {
        let mut dump = fixtures::dump();
        dump.items.insert(
            0,
            Item {
                id: EXP_ID,
                name: "Blaze of Wisdom".into(),
                icon: "/exp.png".into(),
                background: "gold".into(),
                priority: 11,
                always_display: true,
                events: vec![],
                drops: vec![],
            },
        );
        dump.items[3].always_display = false;
        let hidden = dump.items[3].id;
        let mut planner = Planner::new(Catalog::new(dump));

        let mut servant = new_servant(Some(LOW_RARITY));
        servant.level = Target::between(1, 14);
        servant.ascension = Target::between(4, 4);
        planner.add_servant(servant);
        let total = planner.requirements();

        let rows = planner.requirement_rows();
        let amounts: Vec<_> = rows.iter().map(|row| row.amount).collect();
        assert_eq!(amounts[0], RowAmount::Qp);
        assert_eq!(amounts[1], RowAmount::ExpBonus);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].amount.get(&total), 3000);
        assert_eq!(rows[1].amount.get(&total), 5);

        let grail = rows.iter().find(|row| row.item.id == GRAIL_ID).unwrap();
        assert_eq!(grail.amount.get(&total), 2);

        let hidden = rows.iter().find(|row| row.item.id == hidden).unwrap();
        assert!(!hidden.is_visible(&total));
    }
}
