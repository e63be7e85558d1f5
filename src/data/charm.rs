use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;

use crate::data::skill::{SkillId, SkillLevels, SkillTable};
use crate::data::validate::{check_non_empty, UniqueSet, ValidationReport};
use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharmId(pub(crate) u16);

impl CharmId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Charm {
    pub id: String,
    pub name: String,
    pub max_level: u8,
    pub skills: Vec<SkillId>,
}

impl Charm {
    /// Every skill the charm grants, at the charm's maximum level.
    pub fn skills_at_max_level(&self) -> SkillLevels {
        self.skills.iter().map(|&s| (s, self.max_level)).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CharmTable {
    charms: Vec<Charm>,
    by_id: HashMap<String, CharmId>,
}

impl CharmTable {
    pub fn charm(&self, id: CharmId) -> &Charm {
        &self.charms[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = CharmId> + '_ {
        (0..self.charms.len()).map(|i| CharmId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.charms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charms.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<CharmId> {
        self.by_id.get(id).copied()
    }

    pub fn resolve(&self, id: &str) -> Result<CharmId> {
        self.find(id).ok_or_else(|| SearchError::unknown("charm", id))
    }

    /// Charms granting at least one skill in `subset`.
    pub fn charms_for_skills(&self, subset: &BTreeSet<SkillId>) -> Vec<CharmId> {
        self.ids()
            .filter(|&id| self.charm(id).skills.iter().any(|s| subset.contains(s)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CharmsFile {
    charms: BTreeMap<String, CharmRecord>,
}

#[derive(Debug, Deserialize)]
struct CharmRecord {
    name: String,
    max_level: i64,
    skills: Vec<String>,
}

pub fn charm_table_from_json(
    raw: &str,
    skills: &SkillTable,
    report: &mut ValidationReport,
) -> Result<CharmTable> {
    let file: CharmsFile = serde_json::from_str(raw)?;
    let mut table = CharmTable::default();
    let mut names = UniqueSet::new("charm name");
    let mut skill_sets: HashMap<Vec<SkillId>, String> = HashMap::new();

    for (id, record) in file.charms {
        let context = format!("charm '{id}'");
        let mut ok = check_non_empty(report, &context, "name", &record.name);
        ok &= names.check(report, &context, record.name.clone());
        if record.max_level <= 0 {
            report.error(&context, "max_level must be positive");
            ok = false;
        } else if record.max_level > 8 {
            report.warning(
                &context,
                format!("max_level {} is unusually high", record.max_level),
            );
            if record.max_level > u8::MAX as i64 {
                ok = false;
            }
        }
        if record.skills.is_empty() || record.skills.len() > 2 {
            report.error(&context, "a charm grants one or two skills");
            ok = false;
        }

        let mut granted = Vec::with_capacity(record.skills.len());
        for skill in &record.skills {
            match skills.find(skill) {
                Some(handle) if granted.contains(&handle) => {
                    report.error(&context, format!("skill '{skill}' listed twice"));
                    ok = false;
                }
                Some(handle) => granted.push(handle),
                None => {
                    report.error(&context, format!("unknown skill '{skill}'"));
                    ok = false;
                }
            }
        }
        if !ok {
            continue;
        }

        let mut key = granted.clone();
        key.sort();
        if let Some(existing) = skill_sets.get(&key) {
            report.error(
                &context,
                format!("grants the same skills as charm '{existing}'"),
            );
            continue;
        }
        skill_sets.insert(key, id.clone());

        let handle = CharmId(table.charms.len() as u16);
        table.by_id.insert(id.clone(), handle);
        table.charms.push(Charm {
            id,
            name: record.name,
            max_level: record.max_level as u8,
            skills: granted,
        });
    }

    Ok(table)
}
