use std::collections::BTreeMap;

use crate::data::decoration::{DecorationId, DecorationTable};
use crate::data::skill::SkillLevels;
use crate::error::{Result, SearchError};

/// Decoration multiset, by decoration.
pub type DecorationCounts = BTreeMap<DecorationId, u32>;

pub fn decoration_skills(decorations: &DecorationCounts, table: &DecorationTable) -> SkillLevels {
    let mut levels = SkillLevels::new();
    for (&id, &count) in decorations {
        for &(skill, level) in &table.decoration(id).skills {
            let granted = (level as u32 * count).min(u8::MAX as u32) as u8;
            let entry = levels.entry(skill).or_insert(0);
            *entry = entry.saturating_add(granted);
        }
    }
    levels
}

/// Checks that the decorations can be slotted into `slots`.
///
/// Decorations are placed largest first, each into the smallest free slot
/// that fits it.
pub fn check_decorations_fit(
    decorations: &DecorationCounts,
    slots: &[u8],
    table: &DecorationTable,
) -> Result<()> {
    let mut free = [0u32; 4];
    for &slot in slots {
        if (1..=4).contains(&slot) {
            free[slot as usize - 1] += 1;
        }
    }
    let mut needed = [0u32; 4];
    for (&id, &count) in decorations {
        needed[table.decoration(id).slot_size as usize - 1] += count;
    }

    for size in (1..=4u8).rev() {
        let mut remaining = needed[size as usize - 1];
        for usable in size..=4 {
            let take = remaining.min(free[usable as usize - 1]);
            free[usable as usize - 1] -= take;
            remaining -= take;
        }
        if remaining > 0 {
            return Err(SearchError::DecorationFit {
                deficit: remaining,
                size,
            });
        }
    }
    Ok(())
}
