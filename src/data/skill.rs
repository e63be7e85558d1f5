//! Skills and set bonuses.
//!
//! Both are data-defined, so they live in a [SkillTable] and are referred to
//! everywhere else by the `Copy` handles [SkillId] and [SetBonusId].

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::data::validate::{check_non_empty, check_range, UniqueSet, ValidationReport};
use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkillId(pub(crate) u16);

impl SkillId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetBonusId(pub(crate) u16);

impl SetBonusId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Skill levels, without zero entries.
pub type SkillLevels = BTreeMap<SkillId, u8>;
/// Pinned or enumerated state index per stateful skill.
pub type SkillStates = BTreeMap<SkillId, u8>;
/// Number of equipped pieces counting towards each set bonus.
pub type SetBonusPieces = BTreeMap<SetBonusId, u8>;

#[derive(Debug, Clone)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub limit: u8,
    /// Highest obtainable level, including secret-skill extensions. Never below `limit`.
    pub extended_limit: u8,
    pub states: Option<Vec<String>>,
    pub zeroth_state_can_be_blank: bool,
    pub tooltip: String,
    pub info: String,
    pub previous_name: Option<String>,
}

impl Skill {
    pub fn is_stateful(&self) -> bool {
        self.states.is_some()
    }

    pub fn state_count(&self) -> usize {
        self.states.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone)]
pub struct SetBonus {
    pub id: String,
    pub name: String,
    /// `(pieces, skill)` ordered by ascending piece count.
    pub stages: Vec<(u8, SkillId)>,
}

#[derive(Debug, Clone, Default)]
pub struct SkillTable {
    skills: Vec<Skill>,
    by_id: HashMap<String, SkillId>,
    set_bonuses: Vec<SetBonus>,
    set_bonus_by_id: HashMap<String, SetBonusId>,
}

impl SkillTable {
    pub fn skill(&self, id: SkillId) -> &Skill {
        &self.skills[id.index()]
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn ids(&self) -> impl Iterator<Item = SkillId> + '_ {
        (0..self.skills.len()).map(|i| SkillId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<SkillId> {
        self.by_id.get(id).copied()
    }

    pub fn resolve(&self, id: &str) -> Result<SkillId> {
        self.find(id).ok_or_else(|| SearchError::unknown("skill", id))
    }

    pub fn set_bonus(&self, id: SetBonusId) -> &SetBonus {
        &self.set_bonuses[id.index()]
    }

    pub fn set_bonuses(&self) -> &[SetBonus] {
        &self.set_bonuses
    }

    pub fn set_bonus_ids(&self) -> impl Iterator<Item = SetBonusId> + '_ {
        (0..self.set_bonuses.len()).map(|i| SetBonusId(i as u16))
    }

    pub fn find_set_bonus(&self, id: &str) -> Option<SetBonusId> {
        self.set_bonus_by_id.get(id).copied()
    }

    pub fn resolve_set_bonus(&self, id: &str) -> Result<SetBonusId> {
        self.find_set_bonus(id)
            .ok_or_else(|| SearchError::unknown("set bonus", id))
    }

    pub fn skill_name(&self, id: SkillId) -> &str {
        &self.skill(id).name
    }

    /// Set bonuses that have a stage granting `skill`.
    pub fn set_bonuses_granting(&self, skill: SkillId) -> impl Iterator<Item = SetBonusId> + '_ {
        self.set_bonus_ids().filter(move |&bonus| {
            self.set_bonus(bonus)
                .stages
                .iter()
                .any(|&(_, granted)| granted == skill)
        })
    }
}

#[derive(Debug, Deserialize)]
struct SkillsFile {
    skills: BTreeMap<String, SkillRecord>,
    #[serde(default)]
    set_bonuses: BTreeMap<String, SetBonusRecord>,
}

#[derive(Debug, Deserialize)]
struct SkillRecord {
    name: String,
    limit: i64,
    #[serde(default)]
    extended_limit: Option<i64>,
    #[serde(default)]
    states: Option<Vec<String>>,
    #[serde(default)]
    zeroth_state_can_be_blank: bool,
    #[serde(default)]
    tooltip: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    previous_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetBonusRecord {
    name: String,
    stages: Vec<StageRecord>,
}

#[derive(Debug, Deserialize)]
struct StageRecord {
    parts: i64,
    skill: String,
}

/// Parses and validates the skills catalog. Entries that fail validation are
/// reported and left out of the table.
pub fn skill_table_from_json(raw: &str, report: &mut ValidationReport) -> Result<SkillTable> {
    let file: SkillsFile = serde_json::from_str(raw)?;
    let mut table = SkillTable::default();
    let mut names = UniqueSet::new("skill name");

    for (id, record) in file.skills {
        let context = format!("skill '{id}'");
        let mut ok = check_non_empty(report, &context, "name", &record.name);
        ok &= names.check(report, &context, record.name.clone());
        ok &= check_range(report, &context, "limit", record.limit, 1, u8::MAX as i64);
        let extended = record.extended_limit.unwrap_or(record.limit);
        if extended < record.limit {
            report.error(&context, "extended_limit must not be below limit");
            ok = false;
        }
        ok &= check_range(report, &context, "extended_limit", extended, 1, u8::MAX as i64);
        if let Some(states) = &record.states {
            if states.len() < 2 {
                report.error(&context, "a stateful skill needs at least 2 states");
                ok = false;
            }
            if states.iter().any(|s| s.trim().is_empty()) {
                report.error(&context, "state names must not be empty");
                ok = false;
            }
        }
        ok &= check_non_empty(report, &context, "tooltip", &record.tooltip);
        if !ok {
            continue;
        }

        let handle = SkillId(table.skills.len() as u16);
        table.by_id.insert(id.clone(), handle);
        table.skills.push(Skill {
            id,
            name: record.name,
            limit: record.limit as u8,
            extended_limit: extended as u8,
            states: record.states,
            zeroth_state_can_be_blank: record.zeroth_state_can_be_blank,
            tooltip: record.tooltip,
            info: record.info,
            previous_name: record.previous_name,
        });
    }

    let mut bonus_names = UniqueSet::new("set bonus name");
    for (id, record) in file.set_bonuses {
        let context = format!("set bonus '{id}'");
        let mut ok = check_non_empty(report, &context, "name", &record.name);
        ok &= bonus_names.check(report, &context, record.name.clone());
        if table.by_id.contains_key(&id) {
            report.error(&context, "set bonus id collides with a skill id");
            ok = false;
        }
        if record.stages.is_empty() {
            report.error(&context, "a set bonus needs at least one stage");
            ok = false;
        }
        let mut stages = Vec::with_capacity(record.stages.len());
        for (index, stage) in record.stages.iter().enumerate() {
            let stage_context = format!("{context} stage[{index}]");
            ok &= check_range(report, &stage_context, "parts", stage.parts, 1, 5);
            match table.find(&stage.skill) {
                Some(skill) => stages.push((stage.parts.clamp(1, 5) as u8, skill)),
                None => {
                    report.error(&stage_context, format!("unknown skill '{}'", stage.skill));
                    ok = false;
                }
            }
        }
        if !ok {
            continue;
        }
        stages.sort();

        let handle = SetBonusId(table.set_bonuses.len() as u16);
        table.set_bonus_by_id.insert(id.clone(), handle);
        table.set_bonuses.push(SetBonus {
            id,
            name: record.name,
            stages,
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "skills": {
            "AGITATOR": {"name": "Agitator", "limit": 5, "extended_limit": 7,
                         "states": ["Calm", "Enraged"], "tooltip": "Attack up while enraged"},
            "MASTERS_TOUCH": {"name": "Master's Touch", "limit": 1, "tooltip": "Less sharpness loss on crit"}
        },
        "set_bonuses": {
            "TEOSTRA_TECHNIQUE": {"name": "Teostra Technique",
                                  "stages": [{"parts": 2, "skill": "MASTERS_TOUCH"}]}
        }
    }"#;

    #[test]
    fn parses_skills_and_set_bonuses() {
        let mut report = ValidationReport::default();
        let table = skill_table_from_json(SAMPLE, &mut report).unwrap();
        assert!(!report.has_errors(), "{:?}", report.diagnostics);

        let agitator = table.resolve("AGITATOR").unwrap();
        assert_eq!(table.skill(agitator).extended_limit, 7);
        assert_eq!(table.skill(agitator).state_count(), 2);

        let touch = table.resolve("MASTERS_TOUCH").unwrap();
        assert_eq!(table.skill(touch).extended_limit, 1);
        assert!(!table.skill(touch).is_stateful());

        let bonus = table.resolve_set_bonus("TEOSTRA_TECHNIQUE").unwrap();
        assert_eq!(table.set_bonus(bonus).stages, vec![(2, touch)]);
        assert_eq!(table.set_bonuses_granting(touch).collect::<Vec<_>>(), vec![bonus]);
    }

    #[test]
    fn rejects_bad_entries() {
        let raw = r#"{
            "skills": {
                "A": {"name": "Same", "limit": 0, "tooltip": "x"},
                "B": {"name": "Same", "limit": 3, "tooltip": "x"},
                "C": {"name": "Stateful", "limit": 1, "states": ["Only"], "tooltip": "x"}
            },
            "set_bonuses": {
                "B": {"name": "Collides", "stages": [{"parts": 6, "skill": "NOPE"}]}
            }
        }"#;
        let mut report = ValidationReport::default();
        let table = skill_table_from_json(raw, &mut report).unwrap();
        assert!(report.has_errors());
        assert!(report.error_count() >= 5);
        assert!(table.find("A").is_none());
        assert!(table.find("C").is_none());
        assert!(table.find_set_bonus("B").is_none());
    }

    #[test]
    fn unknown_skill_is_an_error() {
        let table = SkillTable::default();
        let err = table.resolve("ATTACK_BOOST").unwrap_err();
        assert_eq!(err.to_string(), "unknown skill 'ATTACK_BOOST'");
    }
}
