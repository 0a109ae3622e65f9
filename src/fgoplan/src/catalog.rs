//! Indexed, read-only view of a dataset

use crate::data::{DataDump, DatasetError, GameEvent, GrailCosts, Item, Servant};
use crate::id::{EventId, ItemId, ServantId};
use std::collections::HashMap;
use std::path::Path;

/// A loaded dataset with id lookups. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Catalog {
    servants: Vec<Servant>,
    items: Vec<Item>,
    events: Vec<GameEvent>,
    exp_growth: Vec<u64>,
    grail_costs: GrailCosts,
    servant_lookup: HashMap<ServantId, usize>,
    item_lookup: HashMap<ItemId, usize>,
    event_lookup: HashMap<EventId, usize>,
    webcrow_lookup: HashMap<u32, usize>,
}

impl Catalog {
    pub fn new(dump: DataDump) -> Self {
        let DataDump {
            servants,
            items,
            events,
            exp_growth,
            grail_costs,
        } = dump;

        let servant_lookup = servants.iter().enumerate().map(|(i, x)| (x.id, i)).collect();
        let item_lookup = items.iter().enumerate().map(|(i, x)| (x.id, i)).collect();
        let event_lookup = events.iter().enumerate().map(|(i, x)| (x.id, i)).collect();
        let webcrow_lookup = servants
            .iter()
            .enumerate()
            .map(|(i, x)| (x.webcrow_id, i))
            .collect();

        Self {
            servants,
            items,
            events,
            exp_growth,
            grail_costs,
            servant_lookup,
            item_lookup,
            event_lookup,
            webcrow_lookup,
        }
    }

    /// Load and index a dataset file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        Ok(Self::new(DataDump::load(path)?))
    }

    pub fn servants(&self) -> &[Servant] {
        &self.servants
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn exp_growth(&self) -> &[u64] {
        &self.exp_growth
    }

    pub fn grail_costs(&self) -> &GrailCosts {
        &self.grail_costs
    }

    pub fn servant(&self, id: ServantId) -> Option<&Servant> {
        self.servant_lookup.get(&id).map(|&i| &self.servants[i])
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.item_lookup.get(&id).map(|&i| &self.items[i])
    }

    pub fn event(&self, id: EventId) -> Option<&GameEvent> {
        self.event_lookup.get(&id).map(|&i| &self.events[i])
    }

    /// Find a servant by its id in the third-party simulator's numbering.
    pub fn servant_by_webcrow_id(&self, id: u32) -> Option<&Servant> {
        self.webcrow_lookup.get(&id).map(|&i| &self.servants[i])
    }
}
