//! Skill level bookkeeping and the numeric effect of the skills that feed EFR.

use crate::data::skill::{SetBonusId, SetBonusPieces, SkillId, SkillLevels, SkillStates, SkillTable};
use crate::error::{Result, SearchError};

pub const ATTACK_BOOST_ATTACK_POWER: [u16; 8] = [0, 3, 6, 9, 12, 15, 18, 21];
pub const ATTACK_BOOST_AFFINITY: [i32; 8] = [0, 0, 0, 0, 5, 5, 5, 5];

pub const CRITICAL_EYE_AFFINITY: [i32; 8] = [0, 5, 10, 15, 20, 25, 30, 40];

pub const CRITICAL_BOOST_CRIT_MULTIPLIER: [f64; 4] = [1.25, 1.30, 1.35, 1.40];

pub const WEAKNESS_EXPLOIT_WEAKPOINT_AFFINITY: [i32; 4] = [0, 10, 15, 30];
pub const WEAKNESS_EXPLOIT_WOUNDED_EXTRA_AFFINITY: [i32; 4] = [0, 5, 15, 20];

pub const AGITATOR_ATTACK_POWER: [u16; 8] = [0, 4, 8, 12, 16, 20, 24, 28];
pub const AGITATOR_AFFINITY: [i32; 8] = [0, 5, 5, 7, 7, 10, 15, 20];

pub const PEAK_PERFORMANCE_ATTACK_POWER: [u16; 4] = [0, 5, 10, 20];

pub const NON_ELEMENTAL_BOOST_MULTIPLIER: f64 = 1.05;

pub const HANDICRAFT_MAX_LEVEL: u8 = 5;

/// Handles of the skills the scoring function knows about. Any of them may be
/// missing from a catalog, in which case it simply never contributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringSkills {
    pub handicraft: Option<SkillId>,
    pub critical_boost: Option<SkillId>,
    pub critical_eye: Option<SkillId>,
    pub attack_boost: Option<SkillId>,
    pub weakness_exploit: Option<SkillId>,
    pub agitator: Option<SkillId>,
    pub peak_performance: Option<SkillId>,
    pub non_elemental_boost: Option<SkillId>,
}

impl ScoringSkills {
    pub fn resolve(skills: &SkillTable) -> Self {
        Self {
            handicraft: skills.find("HANDICRAFT"),
            critical_boost: skills.find("CRITICAL_BOOST"),
            critical_eye: skills.find("CRITICAL_EYE"),
            attack_boost: skills.find("ATTACK_BOOST"),
            weakness_exploit: skills.find("WEAKNESS_EXPLOIT"),
            agitator: skills.find("AGITATOR"),
            peak_performance: skills.find("PEAK_PERFORMANCE"),
            non_elemental_boost: skills.find("NON_ELEMENTAL_BOOST"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillsContribution {
    pub handicraft_level: u8,
    pub added_attack: u16,
    pub added_affinity: i32,
    pub weapon_raw_multiplier: f64,
    pub raw_crit_multiplier: f64,
}

pub fn level_of(levels: &SkillLevels, skill: Option<SkillId>) -> u8 {
    skill.and_then(|s| levels.get(&s).copied()).unwrap_or(0)
}

fn at_level<T: Copy>(table: &[T], level: u8) -> T {
    table[(level as usize).min(table.len() - 1)]
}

/// State of an active stateful skill. Inactive skills report `None`.
fn active_state(
    levels: &SkillLevels,
    states: &SkillStates,
    skill: Option<SkillId>,
    table: &SkillTable,
) -> Result<Option<(u8, u8)>> {
    let Some(skill) = skill else { return Ok(None) };
    let level = level_of(levels, Some(skill));
    if level == 0 {
        return Ok(None);
    }
    match states.get(&skill) {
        Some(&state) => Ok(Some((level, state))),
        None => Err(SearchError::MissingSkillState(
            table.skill(skill).name.clone(),
        )),
    }
}

pub fn calculate_skills_contribution(
    levels: &SkillLevels,
    states: &SkillStates,
    weapon_is_raw: bool,
    table: &SkillTable,
    scoring: &ScoringSkills,
) -> Result<SkillsContribution> {
    let mut added_attack = 0u16;
    let mut added_affinity = 0i32;

    let attack_boost = level_of(levels, scoring.attack_boost);
    added_attack += at_level(&ATTACK_BOOST_ATTACK_POWER, attack_boost);
    added_affinity += at_level(&ATTACK_BOOST_AFFINITY, attack_boost);

    added_affinity += at_level(&CRITICAL_EYE_AFFINITY, level_of(levels, scoring.critical_eye));

    if let Some((level, state)) = active_state(levels, states, scoring.weakness_exploit, table)? {
        if state >= 1 {
            added_affinity += at_level(&WEAKNESS_EXPLOIT_WEAKPOINT_AFFINITY, level);
        }
        if state == 2 {
            added_affinity += at_level(&WEAKNESS_EXPLOIT_WOUNDED_EXTRA_AFFINITY, level);
        }
    }

    if let Some((level, 1)) = active_state(levels, states, scoring.agitator, table)? {
        added_attack += at_level(&AGITATOR_ATTACK_POWER, level);
        added_affinity += at_level(&AGITATOR_AFFINITY, level);
    }

    if let Some((level, 1)) = active_state(levels, states, scoring.peak_performance, table)? {
        added_attack += at_level(&PEAK_PERFORMANCE_ATTACK_POWER, level);
    }

    let weapon_raw_multiplier =
        if weapon_is_raw && level_of(levels, scoring.non_elemental_boost) == 1 {
            NON_ELEMENTAL_BOOST_MULTIPLIER
        } else {
            1.0
        };

    Ok(SkillsContribution {
        handicraft_level: level_of(levels, scoring.handicraft).min(HANDICRAFT_MAX_LEVEL),
        added_attack,
        added_affinity,
        weapon_raw_multiplier,
        raw_crit_multiplier: at_level(
            &CRITICAL_BOOST_CRIT_MULTIPLIER,
            level_of(levels, scoring.critical_boost),
        ),
    })
}

/// Adds `from` onto `into`, saturating at `u8::MAX`.
pub fn merge_levels(into: &mut SkillLevels, from: &SkillLevels) {
    for (&skill, &level) in from {
        if level > 0 {
            let entry = into.entry(skill).or_insert(0);
            *entry = entry.saturating_add(level);
        }
    }
}

/// Clips every level to the skill's limit and drops zero levels.
pub fn clip_levels(levels: &SkillLevels, table: &SkillTable) -> SkillLevels {
    levels
        .iter()
        .filter(|(_, &level)| level > 0)
        .map(|(&skill, &level)| (skill, level.min(table.skill(skill).limit)))
        .collect()
}

/// Like [clip_levels], but against the extended limit.
pub fn clip_levels_extended(levels: &SkillLevels, table: &SkillTable) -> SkillLevels {
    levels
        .iter()
        .filter(|(_, &level)| level > 0)
        .map(|(&skill, &level)| (skill, level.min(table.skill(skill).extended_limit)))
        .collect()
}

/// Skills granted by the set bonus stages that `pieces` meet. A weapon with
/// a set bonus counts as one extra piece towards it.
pub fn set_bonus_skills(
    pieces: &SetBonusPieces,
    weapon_bonus: Option<SetBonusId>,
    table: &SkillTable,
) -> SkillLevels {
    let mut counts = pieces.clone();
    if let Some(bonus) = weapon_bonus {
        *counts.entry(bonus).or_insert(0) += 1;
    }
    let mut granted = SkillLevels::new();
    for (&bonus, &count) in &counts {
        for &(required, skill) in &table.set_bonus(bonus).stages {
            if required <= count {
                granted.insert(skill, 1);
            }
        }
    }
    granted
}
