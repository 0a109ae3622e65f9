//! # fgoplan
//!
//! Servant roster planner library - dataset model and material requirements
//! engine.
//!
//! This library provides functionality to:
//! - Load the compact dataset produced by `fgoplan-extract`
//! - Model a player's roster with current and target progression
//! - Compute the QP, experience and items needed to reach those targets,
//!   including overflow levelling past a servant's natural cap
//! - Read and write roster snapshots (native JSON, CSV, simulator tuples)
//!
//! ## Example
//!
//! ```no_run
//! use fgoplan::{new_servant, Catalog, Planner, Target};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::load("_build/data/dump.json")?;
//! let mut planner = Planner::new(catalog);
//!
//! let mut servant = new_servant(None);
//! servant.level = Target::between(1, 100);
//! servant.skills[0] = Target::between(1, 10);
//! planner.add_servant(servant);
//!
//! let total = planner.requirements();
//! println!("QP: {}, grails: {}", total.qp, total.item(fgoplan::GRAIL_ID));
//! # Ok(())
//! # }
//! ```

pub mod ascension;
pub mod catalog;
pub mod constants;
pub mod data;
pub mod formats;
pub mod id;
pub mod planner;
pub mod requirements;
pub mod roster;

#[cfg(test)]
mod fixtures;

// Re-export commonly used items
#[doc(inline)]
pub use ascension::{actual_ascension, ascension_target};
#[doc(inline)]
pub use catalog::Catalog;
#[doc(inline)]
pub use constants::{EXP_ID, GRAIL_ID, QP_ID};
#[doc(inline)]
pub use data::{
    DataDump, DatasetError, EventAppearance, EventKind, GameEvent, GrailCost, GrailCosts, Item,
    ItemDrop, Servant, Skill, UpgradeItem, UpgradeRequirements,
};
#[doc(inline)]
pub use formats::{FormatError, Snapshot};
#[doc(inline)]
pub use id::{EventId, Id, ItemId, ServantId, SkillId, WarId};
#[doc(inline)]
pub use planner::{Planner, PlannerEvent, RequirementRow, RowAmount, SubscriptionId};
#[doc(inline)]
pub use requirements::{
    add_exp_requirements, add_requirements, add_servant_requirements,
    add_split_servant_requirements, compute_requirements, compute_requirements_filtered,
    Requirements,
};
#[doc(inline)]
pub use roster::{matches_filter, new_servant, Filters, OwnedServant, Priority, Target};
