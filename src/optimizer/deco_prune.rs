//! Candidate decorations for a search, pruned and grouped by slot size.

use std::collections::BTreeSet;

use tracing::debug;

use crate::data::decoration::{Decoration, DecorationId, DecorationTable};
use crate::data::skill::SkillId;
use crate::optimizer::prune::{percent_kept, prune_by_supersedes};

/// `d1` makes `d2` redundant when it fits wherever `d2` fits and grants at
/// least as much of every in-scope skill.
pub fn decoration_supersedes(
    d1: &Decoration,
    d2: &Decoration,
    subset: &BTreeSet<SkillId>,
) -> Option<bool> {
    if d1.slot_size > d2.slot_size {
        return Some(false);
    }
    let level = |d: &Decoration, skill: SkillId| {
        d.skills
            .iter()
            .find(|(s, _)| *s == skill)
            .map_or(0, |&(_, l)| l)
    };
    let mut strictly_better = d1.slot_size < d2.slot_size;
    for &skill in subset {
        let (a, b) = (level(d1, skill), level(d2, skill));
        if a < b {
            return Some(false);
        }
        strictly_better |= a > b;
    }
    if strictly_better {
        Some(true)
    } else {
        None
    }
}

/// Decorations granting at least one skill in `subset`, from `candidates`
/// when given or the whole table otherwise.
pub fn decorations_for_skills(
    subset: &BTreeSet<SkillId>,
    candidates: Option<&[DecorationId]>,
    table: &DecorationTable,
) -> Vec<DecorationId> {
    let pool: Vec<DecorationId> = match candidates {
        Some(ids) => {
            let unique: BTreeSet<DecorationId> = ids.iter().copied().collect();
            unique.into_iter().collect()
        }
        None => table.ids().collect(),
    };
    pool.into_iter()
        .filter(|&id| {
            table
                .decoration(id)
                .skills
                .iter()
                .any(|(skill, _)| subset.contains(skill))
        })
        .collect()
}

pub fn pruned_decoration_set(
    subset: &BTreeSet<SkillId>,
    candidates: Option<&[DecorationId]>,
    table: &DecorationTable,
) -> Vec<DecorationId> {
    let relevant = decorations_for_skills(subset, candidates, table);
    let before = relevant.len();
    let pruned = prune_by_supersedes(relevant, |&l, &r| {
        decoration_supersedes(table.decoration(l), table.decoration(r), subset)
    });
    debug!(
        "decoration pruning: {before} --> {} ({:.2}% kept)",
        pruned.len(),
        percent_kept(before, pruned.len())
    );
    pruned
}

/// Decorations usable in a slot of each size. Entry `k - 1` lists those of
/// size at most `k`, largest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationsBySize {
    by_max_size: [Vec<DecorationId>; 4],
}

impl DecorationsBySize {
    pub fn new(decorations: &[DecorationId], table: &DecorationTable) -> Self {
        let mut sorted = decorations.to_vec();
        sorted.sort_by(|a, b| {
            table
                .decoration(*b)
                .slot_size
                .cmp(&table.decoration(*a).slot_size)
                .then(a.cmp(b))
        });
        let by_max_size = [1u8, 2, 3, 4].map(|max| {
            sorted
                .iter()
                .copied()
                .filter(|&d| table.decoration(d).slot_size <= max)
                .collect()
        });
        Self { by_max_size }
    }

    /// Decorations that fit a slot of `size`.
    pub fn fitting(&self, size: u8) -> &[DecorationId] {
        let index = (size as usize).clamp(1, 4) - 1;
        &self.by_max_size[index]
    }

    pub fn is_empty(&self) -> bool {
        self.by_max_size[3].is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_registry::shipped_catalog;

    #[test]
    fn smaller_equal_decoration_supersedes() {
        let catalog = shipped_catalog();
        let attack = catalog.skills.resolve("ATTACK_BOOST").unwrap();
        let subset: BTreeSet<SkillId> = [attack].into();
        let ids = pruned_decoration_set(&subset, None, &catalog.decorations);
        // Only decorations that give more Attack Boost than any smaller one survive.
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    assert_ne!(
                        decoration_supersedes(
                            catalog.decorations.decoration(a),
                            catalog.decorations.decoration(b),
                            &subset
                        ),
                        Some(true)
                    );
                }
            }
        }
        assert!(ids.iter().all(|&d| catalog
            .decorations
            .decoration(d)
            .skills
            .iter()
            .any(|(s, _)| *s == attack)));
    }

    #[test]
    fn larger_decoration_never_supersedes_smaller() {
        let catalog = shipped_catalog();
        let attack = catalog.skills.resolve("ATTACK_BOOST").unwrap();
        let subset: BTreeSet<SkillId> = [attack].into();
        let table = &catalog.decorations;
        let simple = table.resolve("ATTACK").unwrap();
        let hard = table.resolve("ATTACK_X3").unwrap();
        assert_eq!(
            decoration_supersedes(table.decoration(hard), table.decoration(simple), &subset),
            Some(false)
        );
        assert_eq!(
            decoration_supersedes(table.decoration(simple), table.decoration(hard), &subset),
            Some(false)
        );
    }

    #[test]
    fn grouping_by_size_is_cumulative_and_sorted() {
        let catalog = shipped_catalog();
        let all: Vec<DecorationId> = catalog.decorations.ids().collect();
        let grouped = DecorationsBySize::new(&all, &catalog.decorations);
        let sizes = |k: u8| -> Vec<u8> {
            grouped
                .fitting(k)
                .iter()
                .map(|&d| catalog.decorations.decoration(d).slot_size)
                .collect()
        };
        assert!(sizes(1).iter().all(|&s| s == 1));
        for k in 1..=4 {
            let s = sizes(k);
            assert!(s.windows(2).all(|w| w[0] >= w[1]));
            assert!(s.iter().all(|&x| x <= k));
        }
        assert_eq!(grouped.fitting(4).len(), all.len());
    }
}
