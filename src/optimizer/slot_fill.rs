//! Decoration slot filling and the seen-set used to deduplicate partial builds.

use std::collections::{HashMap, HashSet};

use crate::data::decoration::{DecorationId, DecorationTable};
use crate::data::skill::{SetBonusId, SetBonusPieces, SkillId, SkillLevels, SkillTable};
use crate::optimizer::deco_prune::DecorationsBySize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoFill {
    pub decorations: Vec<DecorationId>,
    pub skills: SkillLevels,
}

/// Skill-increasing ways to fill `slots` starting from `skills`.
///
/// Copies of a decoration are only added while one of its skills is still
/// below its extended limit. When at least one fill uses every slot, only
/// those fills are returned; otherwise every partial fill is, including the
/// empty one.
pub fn generate_deco_additions(
    slots: &[u8],
    skills: &SkillLevels,
    decorations: &DecorationsBySize,
    decoration_table: &DecorationTable,
    skill_table: &SkillTable,
) -> Vec<DecoFill> {
    if slots.is_empty() {
        return vec![DecoFill {
            decorations: Vec::new(),
            skills: skills.clone(),
        }];
    }
    let mut slots = slots.to_vec();
    slots.sort_unstable_by(|a, b| b.cmp(a));

    // (decorations, remaining slots largest first, skills)
    let mut incomplete: Vec<(Vec<DecorationId>, Vec<u8>, SkillLevels)> =
        vec![(Vec::new(), slots.clone(), skills.clone())];
    let mut complete: Vec<DecoFill> = Vec::new();

    for &id in decorations.fitting(slots[0]) {
        let decoration = decoration_table.decoration(id);
        let mut next_incomplete = incomplete.clone();

        for (fill, remaining, current) in &incomplete {
            let max_to_add = decoration
                .skills
                .iter()
                .map(|&(skill, level)| {
                    let cap = skill_table.skill(skill).extended_limit as f64;
                    let have = current.get(&skill).copied().unwrap_or(0) as f64;
                    ((cap - have) / level as f64).ceil()
                })
                .fold(f64::NEG_INFINITY, f64::max);
            if max_to_add <= 0.0 {
                continue;
            }

            let mut fill = fill.clone();
            let mut remaining = remaining.clone();
            let mut current = current.clone();
            for _ in 0..max_to_add as usize {
                if remaining[0] < decoration.slot_size {
                    break;
                }
                fill.push(id);
                remaining.remove(0);
                for &(skill, level) in &decoration.skills {
                    let entry = current.entry(skill).or_insert(0);
                    *entry = entry.saturating_add(level);
                }
                if remaining.is_empty() {
                    complete.push(DecoFill {
                        decorations: fill.clone(),
                        skills: current.clone(),
                    });
                    break;
                }
                next_incomplete.push((fill.clone(), remaining.clone(), current.clone()));
            }
        }
        incomplete = next_incomplete;
    }

    if complete.is_empty() {
        incomplete
            .into_iter()
            .map(|(decorations, _, skills)| DecoFill { decorations, skills })
            .collect()
    } else {
        complete
    }
}

type SeenKey = (Vec<(SkillId, u8)>, Vec<(SetBonusId, u8)>);

fn seen_key(skills: &SkillLevels, set_bonuses: &SetBonusPieces) -> SeenKey {
    (
        skills.iter().filter(|(_, &l)| l > 0).map(|(&s, &l)| (s, l)).collect(),
        set_bonuses.iter().filter(|(_, &n)| n > 0).map(|(&b, &n)| (b, n)).collect(),
    )
}

/// Keeps one object per (skills, set bonuses) key, dropping any key that is
/// reachable from another by lowering levels or piece counts.
///
/// Adding a key marks every key below it as seen. Stored objects whose key
/// falls below a later addition are removed.
#[derive(Debug)]
pub struct SeenSet<T> {
    seen: HashSet<SeenKey>,
    index: HashMap<SeenKey, usize>,
    items: Vec<Option<T>>,
}

impl<T> Default for SeenSet<T> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            index: HashMap::new(),
            items: Vec::new(),
        }
    }
}

impl<T> SeenSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, skills: &SkillLevels, set_bonuses: &SetBonusPieces, object: T) {
        let key = seen_key(skills, set_bonuses);
        if self.seen.contains(&key) {
            return;
        }
        self.mark_power_set(key.clone());
        self.index.insert(key, self.items.len());
        self.items.push(Some(object));
    }

    fn mark_power_set(&mut self, top: SeenKey) {
        let mut worklist = vec![top];
        while let Some(key) = worklist.pop() {
            if !self.seen.insert(key.clone()) {
                if let Some(i) = self.index.remove(&key) {
                    self.items[i] = None;
                }
                continue;
            }
            let (skills, bonuses) = &key;
            for i in 0..skills.len() {
                let mut lower = skills.clone();
                if lower[i].1 > 1 {
                    lower[i].1 -= 1;
                } else {
                    lower.remove(i);
                }
                worklist.push((lower, bonuses.clone()));
            }
            for i in 0..bonuses.len() {
                let mut lower = bonuses.clone();
                if lower[i].1 > 1 {
                    lower[i].1 -= 1;
                } else {
                    lower.remove(i);
                }
                worklist.push((skills.clone(), lower));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Surviving objects in insertion order.
    pub fn into_items(self) -> Vec<T> {
        self.items.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_registry::{shipped_catalog, Catalog};

    fn subset_decorations(catalog: &Catalog, ids: &[&str]) -> DecorationsBySize {
        let ids: Vec<DecorationId> = ids
            .iter()
            .map(|id| catalog.decorations.resolve(id).unwrap())
            .collect();
        DecorationsBySize::new(&ids, &catalog.decorations)
    }

    #[test]
    fn no_slots_yields_the_input() {
        let catalog = shipped_catalog();
        let decorations = subset_decorations(&catalog, &["ATTACK"]);
        let fills = generate_deco_additions(
            &[],
            &SkillLevels::new(),
            &decorations,
            &catalog.decorations,
            &catalog.skills,
        );
        assert_eq!(fills.len(), 1);
        assert!(fills[0].decorations.is_empty());
    }

    #[test]
    fn complete_fills_are_preferred() {
        let catalog = shipped_catalog();
        let attack = catalog.skills.resolve("ATTACK_BOOST").unwrap();
        let decorations = subset_decorations(&catalog, &["ATTACK"]);
        let fills = generate_deco_additions(
            &[1, 2],
            &SkillLevels::new(),
            &decorations,
            &catalog.decorations,
            &catalog.skills,
        );
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].decorations.len(), 2);
        assert_eq!(fills[0].skills[&attack], 2);
    }

    #[test]
    fn capped_skill_leaves_slots_open() {
        let catalog = shipped_catalog();
        let attack = catalog.skills.resolve("ATTACK_BOOST").unwrap();
        let limit = catalog.skills.skill(attack).extended_limit;
        let decorations = subset_decorations(&catalog, &["ATTACK"]);
        let start: SkillLevels = [(attack, limit - 1)].into_iter().collect();
        let fills = generate_deco_additions(
            &[1, 1, 1],
            &start,
            &decorations,
            &catalog.decorations,
            &catalog.skills,
        );
        // Nothing can fill all three slots, so the partial fills come back.
        assert_eq!(fills.len(), 2);
        assert!(fills.iter().any(|f| f.decorations.is_empty()));
        assert!(fills.iter().any(|f| f.skills[&attack] == limit));
    }

    #[test]
    fn larger_decorations_skip_small_slots() {
        let catalog = shipped_catalog();
        let decorations = subset_decorations(&catalog, &["ATTACK_X3"]);
        let fills = generate_deco_additions(
            &[1],
            &SkillLevels::new(),
            &decorations,
            &catalog.decorations,
            &catalog.skills,
        );
        assert_eq!(fills.len(), 1);
        assert!(fills[0].decorations.is_empty());
    }

    #[test]
    fn seen_set_drops_dominated_keys() {
        let catalog = shipped_catalog();
        let attack = catalog.skills.resolve("ATTACK_BOOST").unwrap();
        let eye = catalog.skills.resolve("CRITICAL_EYE").unwrap();
        let none = SetBonusPieces::new();

        let mut seen = SeenSet::new();
        seen.add(&[(attack, 1)].into_iter().collect(), &none, "low");
        seen.add(&[(attack, 2), (eye, 1)].into_iter().collect(), &none, "high");
        seen.add(&[(attack, 2)].into_iter().collect(), &none, "dominated");
        seen.add(&[(eye, 2)].into_iter().collect(), &none, "other");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen.into_items(), vec!["high", "other"]);
    }

    #[test]
    fn seen_set_distinguishes_set_bonus_pieces() {
        let catalog = shipped_catalog();
        let bonus = catalog.skills.set_bonus_ids().next().unwrap();
        let skills = SkillLevels::new();
        let one: SetBonusPieces = [(bonus, 1)].into_iter().collect();
        let two: SetBonusPieces = [(bonus, 2)].into_iter().collect();

        let mut seen = SeenSet::new();
        seen.add(&skills, &two, 2);
        seen.add(&skills, &one, 1);
        assert_eq!(seen.into_items(), vec![2]);
    }
}
