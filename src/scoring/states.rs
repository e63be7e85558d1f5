//! Enumeration of skill-state assignments.
//!
//! A score needs a state for every active stateful skill. Skills without a
//! pinned state are expanded one branch per state, the skill whose display
//! name sorts first being the outermost branch.

use crate::contrib::skills::clip_levels;
use crate::contrib::weapon_values::WeaponFinalValues;
use crate::data::data_registry::Catalog;
use crate::data::skill::{SkillId, SkillLevels, SkillStates, SkillTable};
use crate::error::Result;
use crate::scoring::efr::{lookup_from_skills, LookupValues};

/// One state assignment and the value computed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBranch<T> {
    pub states: SkillStates,
    pub result: T,
}

/// Stateful skills at level > 0 with no entry in `pinned`, sorted by display name.
pub fn missing_stateful_skills(
    levels: &SkillLevels,
    pinned: &SkillStates,
    table: &SkillTable,
) -> Vec<SkillId> {
    let mut missing: Vec<SkillId> = levels
        .iter()
        .filter(|(skill, &level)| {
            level > 0 && table.skill(**skill).is_stateful() && !pinned.contains_key(skill)
        })
        .map(|(&skill, _)| skill)
        .collect();
    missing.sort_by(|a, b| table.skill_name(*a).cmp(table.skill_name(*b)));
    missing
}

pub fn states_fully_defined(levels: &SkillLevels, states: &SkillStates, table: &SkillTable) -> bool {
    missing_stateful_skills(levels, states, table).is_empty()
}

/// Every completion of `pinned` that covers the active stateful skills in
/// `levels`. With nothing missing this is just `pinned`.
pub fn enumerate_state_assignments(
    levels: &SkillLevels,
    pinned: &SkillStates,
    table: &SkillTable,
) -> Vec<SkillStates> {
    let mut assignments = vec![pinned.clone()];
    for skill in missing_stateful_skills(levels, pinned, table) {
        let state_count = table.skill(skill).state_count();
        let mut expanded = Vec::with_capacity(assignments.len() * state_count);
        for assignment in &assignments {
            for state in 0..state_count {
                let mut next = assignment.clone();
                next.insert(skill, state as u8);
                expanded.push(next);
            }
        }
        assignments = expanded;
    }
    assignments
}

/// Scores `skills` under every state assignment, in enumeration order.
pub fn lookup_all_states(
    weapon: &WeaponFinalValues,
    skills: &SkillLevels,
    pinned: &SkillStates,
    catalog: &Catalog,
) -> Result<Vec<StateBranch<LookupValues>>> {
    let clipped = clip_levels(skills, &catalog.skills);
    enumerate_state_assignments(&clipped, pinned, &catalog.skills)
        .into_iter()
        .map(|states| {
            let result = lookup_from_skills(weapon, &clipped, &states, catalog)?;
            Ok(StateBranch { states, result })
        })
        .collect()
}

/// Highest EFR over every state assignment. Pinned states stay fixed.
pub fn best_case_efr(
    weapon: &WeaponFinalValues,
    skills: &SkillLevels,
    pinned: &SkillStates,
    catalog: &Catalog,
) -> Result<f64> {
    let branches = lookup_all_states(weapon, skills, pinned, catalog)?;
    Ok(branches
        .iter()
        .map(|branch| branch.result.efr)
        .fold(f64::NEG_INFINITY, f64::max))
}
