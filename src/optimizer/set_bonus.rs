//! Planning the set bonus piece counts a search has to reach.

use std::collections::BTreeSet;

use crate::data::skill::{SetBonusId, SetBonusPieces, SkillId, SkillTable};

/// Minimal piece requirements that grant every skill in `required`.
///
/// Each requirement maps a set bonus to the pieces it needs. Requirements
/// that ask for at least as much as another one are dropped. With nothing
/// required the result is a single empty requirement.
pub fn possible_set_bonus_combos(
    required: &BTreeSet<SkillId>,
    skills: &SkillTable,
) -> Vec<SetBonusPieces> {
    let mut combos = vec![SetBonusPieces::new()];
    for &skill in required {
        let mut options: Vec<(SetBonusId, u8)> = Vec::new();
        for bonus in skills.set_bonuses_granting(skill) {
            for &(pieces, granted) in &skills.set_bonus(bonus).stages {
                if granted == skill {
                    options.push((bonus, pieces));
                }
            }
        }
        let mut expanded = Vec::with_capacity(combos.len() * options.len());
        for combo in &combos {
            for &(bonus, pieces) in &options {
                let mut next = combo.clone();
                let entry = next.entry(bonus).or_insert(0);
                *entry = (*entry).max(pieces);
                expanded.push(next);
            }
        }
        combos = expanded;
    }
    minimal_combos(combos)
}

fn covers(a: &SetBonusPieces, b: &SetBonusPieces) -> bool {
    b.iter()
        .all(|(bonus, &pieces)| a.get(bonus).copied().unwrap_or(0) >= pieces)
}

fn minimal_combos(combos: Vec<SetBonusPieces>) -> Vec<SetBonusPieces> {
    let mut unique: Vec<SetBonusPieces> = Vec::new();
    for combo in combos {
        if !unique.contains(&combo) {
            unique.push(combo);
        }
    }
    let mut minimal = Vec::new();
    for (i, combo) in unique.iter().enumerate() {
        let dominated = unique
            .iter()
            .enumerate()
            .any(|(j, other)| i != j && covers(combo, other));
        if !dominated {
            minimal.push(combo.clone());
        }
    }
    minimal
}

/// Adds, for each requirement, every variant needing one piece fewer of a
/// single set bonus. A weapon carrying that set bonus covers the difference.
pub fn relax_set_bonus_combos(combos: &[SetBonusPieces]) -> Vec<SetBonusPieces> {
    let mut relaxed: Vec<SetBonusPieces> = Vec::new();
    let mut push = |combo: SetBonusPieces| {
        if !relaxed.contains(&combo) {
            relaxed.push(combo);
        }
    };
    for combo in combos {
        push(combo.clone());
        for (&bonus, &pieces) in combo {
            let mut lower = combo.clone();
            if pieces > 1 {
                lower.insert(bonus, pieces - 1);
            } else {
                lower.remove(&bonus);
            }
            push(lower);
        }
    }
    relaxed
}

/// Pieces still missing to reach the closest requirement in `targets`.
pub fn distance_to_nearest(current: &SetBonusPieces, targets: &[SetBonusPieces]) -> u32 {
    targets
        .iter()
        .map(|target| {
            target
                .iter()
                .map(|(bonus, &pieces)| {
                    pieces.saturating_sub(current.get(bonus).copied().unwrap_or(0)) as u32
                })
                .sum::<u32>()
        })
        .min()
        .unwrap_or(0)
}

/// Every set bonus that appears in any requirement.
pub fn set_bonus_subset(combos: &[SetBonusPieces]) -> BTreeSet<SetBonusId> {
    combos.iter().flat_map(|c| c.keys().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_registry::shipped_catalog;

    #[test]
    fn nothing_required_is_one_empty_combo() {
        let catalog = shipped_catalog();
        let combos = possible_set_bonus_combos(&BTreeSet::new(), &catalog.skills);
        assert_eq!(combos, vec![SetBonusPieces::new()]);
        assert_eq!(distance_to_nearest(&SetBonusPieces::new(), &combos), 0);
    }

    #[test]
    fn required_skill_maps_to_its_stage() {
        let catalog = shipped_catalog();
        let skill = catalog.skills.resolve("MASTERS_TOUCH").unwrap();
        let bonus = catalog.skills.resolve_set_bonus("TEOSTRA_TECHNIQUE").unwrap();
        let combos = possible_set_bonus_combos(&[skill].into(), &catalog.skills);
        assert_eq!(combos, vec![[(bonus, 3)].into_iter().collect::<SetBonusPieces>()]);

        let relaxed = relax_set_bonus_combos(&combos);
        assert_eq!(relaxed.len(), 2);
        assert!(relaxed.contains(&[(bonus, 2)].into_iter().collect()));

        let two: SetBonusPieces = [(bonus, 2)].into_iter().collect();
        assert_eq!(distance_to_nearest(&two, &combos), 1);
        assert_eq!(distance_to_nearest(&two, &relaxed), 0);
        assert_eq!(set_bonus_subset(&combos), [bonus].into());
    }

    #[test]
    fn dominated_requirements_are_dropped() {
        let catalog = shipped_catalog();
        let bonus = catalog.skills.set_bonus_ids().next().unwrap();
        let small: SetBonusPieces = [(bonus, 2)].into_iter().collect();
        let large: SetBonusPieces = [(bonus, 4)].into_iter().collect();
        assert_eq!(minimal_combos(vec![large, small.clone(), small.clone()]), vec![small]);
    }
}
