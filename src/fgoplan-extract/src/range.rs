//! Dense arrays from sparse keyed collections

use crate::atlas::RangedMap;
use anyhow::{bail, Result};

/// Convert keys `start..=end` into a dense array, failing if any key is
/// missing.
pub fn convert_ranged_map<T, U, F>(
    map: &RangedMap<T>,
    start: u32,
    end: u32,
    mut f: F,
) -> Result<Vec<U>>
where
    F: FnMut(&T) -> U,
{
    let mut out = Vec::with_capacity(end.saturating_sub(start) as usize + 1);
    for i in start..=end {
        let Some(value) = map.get(&i) else {
            bail!(
                "Undefined key {} in range {}..={} (present: {:?})",
                i,
                start,
                end,
                map.keys().collect::<Vec<_>>()
            );
        };
        out.push(f(value));
    }
    Ok(out)
}

/// Convert keys `start..=end` into a dense array, passing missing keys to
/// `f` as `None`.
pub fn convert_opt_ranged_map<T, U, F>(map: &RangedMap<T>, start: u32, end: u32, f: F) -> Vec<U>
where
    F: FnMut(Option<&T>) -> U,
{
    (start..=end).map(|i| map.get(&i)).map(f).collect()
}
