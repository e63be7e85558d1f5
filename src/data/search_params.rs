//! Search parameters as read from a JSON or YAML file, and their resolved form.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::armour::Tier;
use crate::data::data_registry::Catalog;
use crate::data::decoration::DecorationId;
use crate::data::skill::{SkillId, SkillStates, SkillTable};
use crate::data::weapon::WeaponClass;
use crate::error::{Result, SearchError};

pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_SHUFFLE_ROUNDS: usize = 1;

/// How armour combinations are generated before the weapon loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmourStrategy {
    /// Add one body slot at a time, filling that piece's decoration slots and
    /// deduplicating by reachable skills.
    #[default]
    SlotBySlot,
    /// Enumerate whole five-piece combinations, prune them by dominance, then
    /// fill every slot at once per weapon.
    PrunedCombinations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParametersFile {
    #[serde(default)]
    pub selected_armour_tier: Option<Tier>,
    pub selected_weapon_class: WeaponClass,
    #[serde(default)]
    pub selected_skills: BTreeMap<String, u8>,
    #[serde(default)]
    pub selected_set_bonus_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_decorations: Option<Vec<String>>,
    #[serde(default)]
    pub min_health_regen_augment_level: u8,
    #[serde(default)]
    pub skill_states: BTreeMap<String, u8>,
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_shuffle_rounds")]
    pub shuffle_rounds: usize,
    #[serde(default)]
    pub armour_strategy: ArmourStrategy,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_shuffle_rounds() -> usize {
    DEFAULT_SHUFFLE_ROUNDS
}

/// Runtime knobs that do not change the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTuning {
    /// Worker threads. 0 uses one per core.
    pub workers: usize,
    pub batch_size: usize,
    pub shuffle_rounds: usize,
    pub armour_strategy: ArmourStrategy,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle_rounds: DEFAULT_SHUFFLE_ROUNDS,
            armour_strategy: ArmourStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    pub armour_tier: Option<Tier>,
    pub weapon_class: WeaponClass,
    /// Minimum level per in-scope skill. A minimum of 0 keeps the skill in
    /// scope without requiring it.
    pub skill_minimums: BTreeMap<SkillId, u8>,
    pub set_bonus_skills: BTreeSet<SkillId>,
    /// Candidate decorations. `None` means every decoration granting an
    /// in-scope skill.
    pub decorations: Option<Vec<DecorationId>>,
    pub health_regen_minimum: u8,
    pub skill_states: SkillStates,
    pub tuning: SearchTuning,
}

impl SearchParameters {
    pub fn new(weapon_class: WeaponClass) -> Self {
        Self {
            armour_tier: None,
            weapon_class,
            skill_minimums: BTreeMap::new(),
            set_bonus_skills: BTreeSet::new(),
            decorations: None,
            health_regen_minimum: 0,
            skill_states: SkillStates::new(),
            tuning: SearchTuning::default(),
        }
    }

    /// Skills the search tracks.
    pub fn skill_subset(&self) -> BTreeSet<SkillId> {
        self.skill_minimums.keys().copied().collect()
    }

    /// Reads parameters from `path`, as YAML for `.yaml`/`.yml` files and JSON otherwise.
    pub fn load(path: &Path, catalog: &Catalog) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Self::from_yaml_str(&raw, catalog)
        } else {
            Self::from_json_str(&raw, catalog)
        }
    }

    pub fn from_json_str(raw: &str, catalog: &Catalog) -> Result<Self> {
        let file: SearchParametersFile = serde_json::from_str(raw)?;
        Self::resolve(&file, catalog)
    }

    pub fn from_yaml_str(raw: &str, catalog: &Catalog) -> Result<Self> {
        let file: SearchParametersFile = serde_yaml::from_str(raw)?;
        Self::resolve(&file, catalog)
    }

    pub fn resolve(file: &SearchParametersFile, catalog: &Catalog) -> Result<Self> {
        let skills = &catalog.skills;

        let mut skill_minimums = BTreeMap::new();
        for (id, &level) in &file.selected_skills {
            let skill = skills.resolve(id)?;
            let info = skills.skill(skill);
            if level > info.extended_limit {
                return Err(SearchError::InvalidParameters(format!(
                    "minimum {level} for '{id}' is above its maximum level {}",
                    info.extended_limit
                )));
            }
            skill_minimums.insert(skill, level);
        }

        let mut set_bonus_skills = BTreeSet::new();
        for id in &file.selected_set_bonus_skills {
            let skill = skills.resolve(id)?;
            if skills.set_bonuses_granting(skill).next().is_none() {
                return Err(SearchError::InvalidParameters(format!(
                    "'{id}' is not granted by any set bonus"
                )));
            }
            set_bonus_skills.insert(skill);
        }

        let decorations = file
            .selected_decorations
            .as_ref()
            .map(|ids| {
                ids.iter()
                    .map(|id| catalog.decorations.resolve(id))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        let mut skill_states = SkillStates::new();
        for (id, &state) in &file.skill_states {
            let skill = skills.resolve(id)?;
            validate_state(skills, skill, state)?;
            skill_states.insert(skill, state);
        }

        if file.min_health_regen_augment_level > 4 {
            return Err(SearchError::InvalidParameters(format!(
                "health regen augment level {} is above 4",
                file.min_health_regen_augment_level
            )));
        }
        if file.batch_size == 0 {
            return Err(SearchError::InvalidParameters(
                "batch_size must be positive".to_string(),
            ));
        }

        Ok(Self {
            armour_tier: file.selected_armour_tier,
            weapon_class: file.selected_weapon_class,
            skill_minimums,
            set_bonus_skills,
            decorations,
            health_regen_minimum: file.min_health_regen_augment_level,
            skill_states,
            tuning: SearchTuning {
                workers: file.workers,
                batch_size: file.batch_size,
                shuffle_rounds: file.shuffle_rounds,
                armour_strategy: file.armour_strategy,
            },
        })
    }

    pub fn to_file(&self, catalog: &Catalog) -> SearchParametersFile {
        let skills = &catalog.skills;
        SearchParametersFile {
            selected_armour_tier: self.armour_tier,
            selected_weapon_class: self.weapon_class,
            selected_skills: self
                .skill_minimums
                .iter()
                .map(|(&s, &l)| (skills.skill(s).id.clone(), l))
                .collect(),
            selected_set_bonus_skills: self
                .set_bonus_skills
                .iter()
                .map(|&s| skills.skill(s).id.clone())
                .collect(),
            selected_decorations: self.decorations.as_ref().map(|ids| {
                ids.iter()
                    .map(|&d| catalog.decorations.decoration(d).id.clone())
                    .collect()
            }),
            min_health_regen_augment_level: self.health_regen_minimum,
            skill_states: self
                .skill_states
                .iter()
                .map(|(&s, &state)| (skills.skill(s).id.clone(), state))
                .collect(),
            workers: self.tuning.workers,
            batch_size: self.tuning.batch_size,
            shuffle_rounds: self.tuning.shuffle_rounds,
            armour_strategy: self.tuning.armour_strategy,
        }
    }

    pub fn to_json_pretty(&self, catalog: &Catalog) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_file(catalog))?)
    }
}

/// Checks that `skill` has states and that `state` is one of them.
pub fn validate_state(skills: &SkillTable, skill: SkillId, state: u8) -> Result<()> {
    let info = skills.skill(skill);
    if !info.is_stateful() {
        return Err(SearchError::StatelessSkill(info.name.clone()));
    }
    if state as usize >= info.state_count() {
        return Err(SearchError::InvalidSkillState {
            skill: info.name.clone(),
            state,
            count: info.state_count(),
        });
    }
    Ok(())
}
