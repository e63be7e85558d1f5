use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::data::skill::{SkillId, SkillTable};
use crate::data::validate::{check_non_empty, check_range, UniqueSet, ValidationReport};
use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationId(pub(crate) u16);

impl DecorationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub id: String,
    pub name: String,
    pub slot_size: u8,
    /// `(skill, level)` ordered by skill.
    pub skills: Vec<(SkillId, u8)>,
}

#[derive(Debug, Clone, Default)]
pub struct DecorationTable {
    decorations: Vec<Decoration>,
    by_id: HashMap<String, DecorationId>,
    simple_size_by_skill: HashMap<SkillId, u8>,
}

impl DecorationTable {
    pub fn decoration(&self, id: DecorationId) -> &Decoration {
        &self.decorations[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = DecorationId> + '_ {
        (0..self.decorations.len()).map(|i| DecorationId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<DecorationId> {
        self.by_id.get(id).copied()
    }

    pub fn resolve(&self, id: &str) -> Result<DecorationId> {
        self.find(id)
            .ok_or_else(|| SearchError::unknown("decoration", id))
    }

    /// Slot size of the one-skill, level-1 decoration for `skill`, if it has one.
    pub fn simple_size(&self, skill: SkillId) -> Option<u8> {
        self.simple_size_by_skill.get(&skill).copied()
    }
}

#[derive(Debug, Deserialize)]
struct DecorationsFile {
    simple_decorations: BTreeMap<String, SimpleRecord>,
    #[serde(default, rename = "4slot_compound_decorations_batch_definitions")]
    compound_batches: BTreeMap<String, CompoundBatchRecord>,
    #[serde(default, rename = "4slot_single_skill_decorations")]
    single_skill: BTreeMap<String, Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct SimpleRecord {
    name: String,
    slot: i64,
    skill: String,
}

#[derive(Debug, Deserialize)]
struct CompoundBatchRecord {
    left_side: Vec<String>,
    right_side: Vec<String>,
}

struct Builder<'a> {
    table: DecorationTable,
    names: UniqueSet<String>,
    skills: &'a SkillTable,
}

impl Builder<'_> {
    fn push(&mut self, report: &mut ValidationReport, decoration: Decoration) {
        let context = format!("decoration '{}'", decoration.id);
        if self.table.by_id.contains_key(&decoration.id) {
            report.error(&context, "duplicate decoration id");
            return;
        }
        if !self.names.check(report, &context, decoration.name.clone()) {
            return;
        }
        let handle = DecorationId(self.table.decorations.len() as u16);
        self.table.by_id.insert(decoration.id.clone(), handle);
        self.table.decorations.push(decoration);
    }
}

/// Expands the simple decorations and the size-4 generation rules into the
/// full decoration table.
pub fn decoration_table_from_json(
    raw: &str,
    skills: &SkillTable,
    report: &mut ValidationReport,
) -> Result<DecorationTable> {
    let file: DecorationsFile = serde_json::from_str(raw)?;
    let mut builder = Builder {
        table: DecorationTable::default(),
        names: UniqueSet::new("decoration name"),
        skills,
    };

    // Simple decoration id -> (display name, skill).
    let mut simple: HashMap<String, (String, SkillId)> = HashMap::new();
    let mut simple_skills = UniqueSet::new("simple decoration skill");

    for (id, record) in &file.simple_decorations {
        let context = format!("decoration '{id}'");
        let mut ok = check_non_empty(report, &context, "name", &record.name);
        ok &= check_range(report, &context, "slot", record.slot, 1, 3);
        let skill = match builder.skills.find(&record.skill) {
            Some(skill) => Some(skill),
            None => {
                report.error(&context, format!("unknown skill '{}'", record.skill));
                None
            }
        };
        let Some(skill) = skill else { continue };
        ok &= simple_skills.check(report, &context, record.skill.clone());
        if !ok {
            continue;
        }
        let size = record.slot as u8;
        simple.insert(id.clone(), (record.name.clone(), skill));
        builder.table.simple_size_by_skill.insert(skill, size);
        builder.push(
            report,
            Decoration {
                id: id.clone(),
                name: format!("{} Jewel {}", record.name, size),
                slot_size: size,
                skills: vec![(skill, 1)],
            },
        );
    }

    for (batch, record) in &file.compound_batches {
        for left in &record.left_side {
            for right in &record.right_side {
                let context = format!("compound batch '{batch}' ({left}, {right})");
                let (Some((left_name, left_skill)), Some((right_name, right_skill))) =
                    (simple.get(left), simple.get(right))
                else {
                    report.error(&context, "compound sides must name simple decorations");
                    continue;
                };
                if left == right {
                    report.error(&context, "left and right side must differ");
                    continue;
                }
                let id = format!("COMPOUND_{left}_{right}");
                if builder.table.by_id.contains_key(&format!("COMPOUND_{right}_{left}")) {
                    report.error(&context, "the flipped compound decoration already exists");
                    continue;
                }
                let mut granted = vec![(*left_skill, 1), (*right_skill, 1)];
                granted.sort();
                builder.push(
                    report,
                    Decoration {
                        id,
                        name: format!("{left_name}/{right_name} Jewel 4"),
                        slot_size: 4,
                        skills: granted,
                    },
                );
            }
        }
    }

    for (base, versions) in &file.single_skill {
        let context = format!("single skill decoration '{base}'");
        let Some((name, skill)) = simple.get(base) else {
            report.error(&context, "must name a simple decoration");
            continue;
        };
        for &version in versions {
            let (id, display) = match version {
                2 => (format!("{base}_X2"), format!("{name} Jewel+ 4")),
                3 => (format!("{base}_X3"), format!("Hard {name} Jewel 4")),
                other => {
                    report.error(&context, format!("unsupported version {other}"));
                    continue;
                }
            };
            builder.push(
                report,
                Decoration {
                    id,
                    name: display,
                    slot_size: 4,
                    skills: vec![(*skill, version as u8)],
                },
            );
        }
    }

    Ok(builder.table)
}
