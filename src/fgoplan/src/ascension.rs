//! Inferring ascension stages from levels

use crate::data::Servant;
use crate::roster::{OwnedServant, Target};

/// The highest ascension stage.
pub const MAX_ASCENSION: u32 = 4;

/// The first ascension stage whose level cap admits `level`.
pub fn actual_ascension(servant: &Servant, level: u32) -> u32 {
    servant
        .lvl_max
        .iter()
        .position(|&max| level <= max)
        .map_or(MAX_ASCENSION, |i| i as u32)
}

/// The ascension Target of a roster entry, filling unset ends from the level
/// Target.
pub fn ascension_target(servant: &Servant, owned: &OwnedServant) -> Target {
    let OwnedServant {
        level, ascension, ..
    } = owned;

    if ascension.current.is_some() && ascension.target.is_some() {
        return *ascension;
    }
    if level.current.is_none() && level.target.is_none() {
        return *ascension;
    }

    Target {
        current: ascension
            .current
            .or_else(|| level.current.map(|x| actual_ascension(servant, x))),
        target: ascension
            .target
            .or_else(|| level.target.map(|x| actual_ascension(servant, x))),
    }
}
