//! Dominance pruning of armour pieces and five-piece armour combinations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use crate::contrib::armour::calculate_armour_contribution;
use crate::contrib::skills::set_bonus_skills;
use crate::data::armour::{ArmourPieceId, ArmourSlot, ArmourTable, Tier};
use crate::data::data_registry::Catalog;
use crate::data::decoration::DecorationTable;
use crate::data::skill::{SetBonusId, SetBonusPieces, SkillId, SkillLevels};
use crate::optimizer::prune::{percent_kept, prune_by_supersedes};

/// Number of slots of each size 1..=4.
pub type SlotCounts = [u32; 4];

pub fn slot_counts(slots: &[u8]) -> SlotCounts {
    let mut counts = [0; 4];
    for &slot in slots {
        if (1..=4).contains(&slot) {
            counts[slot as usize - 1] += 1;
        }
    }
    counts
}

/// `a - b` over slot sizes 1..=3. A shortfall at one size is taken from the
/// next size up; `None` if size 3 cannot cover it.
fn subtract_slots(a: [u32; 3], b: [u32; 3]) -> Option<[u32; 3]> {
    let mut a = a;
    let mut b = b;
    for size in 0..3 {
        if a[size] >= b[size] {
            a[size] -= b[size];
        } else if size < 2 {
            b[size + 1] += b[size] - a[size];
            a[size] = 0;
        } else {
            return None;
        }
    }
    Some(a)
}

/// Whether `p1` can always recreate everything `p2` offers, through skills
/// and decoration slots. Only skills in `subset` are compared when given.
pub fn skills_and_slots_supersedes(
    p1_skills: &SkillLevels,
    p1_slots: &SlotCounts,
    p2_skills: &SkillLevels,
    p2_slots: &SlotCounts,
    subset: Option<&BTreeSet<SkillId>>,
    decorations: &DecorationTable,
) -> Option<bool> {
    // Size 4 slots count as one size 3 for p1 and two for p2.
    let p1_underestimate = [p1_slots[0], p1_slots[1], p1_slots[2] + p1_slots[3]];
    let p2_overestimate = [p2_slots[0], p2_slots[1], p2_slots[2] + 2 * p2_slots[3]];

    let in_scope = |skill: &SkillId| subset.map_or(true, |s| s.contains(skill));
    let all_skills: BTreeSet<SkillId> = p1_skills
        .keys()
        .chain(p2_skills.keys())
        .copied()
        .filter(in_scope)
        .collect();

    let mut p1_has_unique = false;
    let mut p2_required = [0u32; 3];
    for skill in all_skills {
        let p1_level = p1_skills.get(&skill).copied().unwrap_or(0);
        let p2_level = p2_skills.get(&skill).copied().unwrap_or(0);
        if p1_level > p2_level {
            p1_has_unique = true;
        } else if p2_level > p1_level {
            let Some(size) = decorations.simple_size(skill) else {
                return Some(false);
            };
            p2_required[(size as usize).clamp(1, 3) - 1] += (p2_level - p1_level) as u32;
        }
    }

    let Some(remaining) = subtract_slots(p1_underestimate, p2_overestimate) else {
        return Some(false);
    };
    let p1_has_more_slots = remaining.iter().any(|&n| n > 0);
    if subtract_slots(remaining, p2_required).is_none() {
        return Some(false);
    }

    if p1_has_more_slots || p1_has_unique {
        Some(true)
    } else {
        None
    }
}

/// Piece-level relation for two pieces of the same body slot.
pub fn armour_piece_supersedes(
    p1: ArmourPieceId,
    p2: ArmourPieceId,
    subset: Option<&BTreeSet<SkillId>>,
    armour: &ArmourTable,
    decorations: &DecorationTable,
) -> Option<bool> {
    let p1_bonus = armour.set_of(p1).set_bonus;
    let p2_bonus = armour.set_of(p2).set_bonus;
    if p2_bonus.is_some() && p1_bonus != p2_bonus {
        return Some(false);
    }
    let a = armour.piece(p1);
    let b = armour.piece(p2);
    skills_and_slots_supersedes(
        &a.skills,
        &slot_counts(&a.decoration_slots),
        &b.skills,
        &slot_counts(&b.decoration_slots),
        subset,
        decorations,
    )
}

/// Per body slot, the pieces of `tier` that no other piece supersedes.
pub fn prune_armour_pieces(
    tier: Option<Tier>,
    subset: Option<&BTreeSet<SkillId>>,
    catalog: &Catalog,
) -> [Vec<ArmourPieceId>; 5] {
    let mut total_before = 0;
    let pruned = ArmourSlot::ALL.map(|slot| {
        let pieces = catalog.armour.pieces_for_slot(slot, tier);
        total_before += pieces.len();
        prune_by_supersedes(pieces, |&l, &r| {
            armour_piece_supersedes(l, r, subset, &catalog.armour, &catalog.decorations)
        })
    });
    let total_after: usize = pruned.iter().map(Vec::len).sum();
    debug!(
        "armour piece pruning: {total_before} --> {total_after} ({:.2}% kept)",
        percent_kept(total_before, total_after)
    );
    pruned
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArmourCombination {
    pub pieces: [ArmourPieceId; 5],
    /// Regular skills plus set bonus skills the five pieces meet on their own.
    pub skills: SkillLevels,
    pub set_bonuses: SetBonusPieces,
    pub slots: Vec<u8>,
    pub slot_counts: SlotCounts,
}

impl ArmourCombination {
    pub fn new(pieces: [ArmourPieceId; 5], catalog: &Catalog) -> Self {
        let contribution = calculate_armour_contribution(&pieces, &catalog.armour);
        let mut skills = contribution.skills;
        skills.extend(set_bonus_skills(&contribution.set_bonuses, None, &catalog.skills));
        Self {
            pieces,
            skills,
            set_bonuses: contribution.set_bonuses,
            slot_counts: slot_counts(&contribution.decoration_slots),
            slots: contribution.decoration_slots,
        }
    }

    /// Regular skills only, without set bonus skills.
    pub fn regular_skills(&self, catalog: &Catalog) -> SkillLevels {
        calculate_armour_contribution(&self.pieces, &catalog.armour).skills
    }

    pub fn set_bonus(&self, bonus: SetBonusId) -> u8 {
        self.set_bonuses.get(&bonus).copied().unwrap_or(0)
    }
}

/// Every combination of the pruned pieces that grants the required set bonus
/// skills, pruned by the skills-and-slots relation.
pub fn generate_and_prune_armour_combinations(
    pieces: &[Vec<ArmourPieceId>; 5],
    subset: Option<&BTreeSet<SkillId>>,
    required_set_bonus_skills: &BTreeSet<SkillId>,
    catalog: &Catalog,
) -> Vec<ArmourCombination> {
    let mut combinations = Vec::new();
    for &head in &pieces[0] {
        for &chest in &pieces[1] {
            for &arms in &pieces[2] {
                for &waist in &pieces[3] {
                    for &legs in &pieces[4] {
                        combinations.push(ArmourCombination::new(
                            [head, chest, arms, waist, legs],
                            catalog,
                        ));
                    }
                }
            }
        }
    }
    let generated = combinations.len();
    combinations.retain(|c| {
        required_set_bonus_skills
            .iter()
            .all(|s| c.skills.contains_key(s))
    });
    let filtered = combinations.len();

    let result = prune_by_supersedes(combinations, |l, r| {
        skills_and_slots_supersedes(
            &l.skills,
            &l.slot_counts,
            &r.skills,
            &r.slot_counts,
            subset,
            &catalog.decorations,
        )
    });

    debug!(
        "armour combination set bonus filter: {generated} --> {filtered} ({:.2}% kept)",
        percent_kept(generated, filtered)
    );
    debug!(
        "armour combination pruning: {filtered} --> {} ({:.2}% kept)",
        result.len(),
        percent_kept(filtered, result.len())
    );
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PruneKey {
    tier: Option<Tier>,
    subset: BTreeSet<SkillId>,
    required_set_bonus_skills: BTreeSet<SkillId>,
}

/// Pruned armour combinations per (tier, skill subset, required set bonus
/// skills). Entries live as long as the cache.
#[derive(Debug, Default)]
pub struct PruneCache {
    entries: HashMap<PruneKey, Arc<Vec<ArmourCombination>>>,
}

impl PruneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pruned_armour_combinations(
        &mut self,
        tier: Option<Tier>,
        subset: &BTreeSet<SkillId>,
        required_set_bonus_skills: &BTreeSet<SkillId>,
        catalog: &Catalog,
    ) -> Arc<Vec<ArmourCombination>> {
        let key = PruneKey {
            tier,
            subset: subset.clone(),
            required_set_bonus_skills: required_set_bonus_skills.clone(),
        };
        if let Some(hit) = self.entries.get(&key) {
            debug!("armour combination cache hit");
            return Arc::clone(hit);
        }
        let pieces = prune_armour_pieces(tier, Some(subset), catalog);
        let combinations = Arc::new(generate_and_prune_armour_combinations(
            &pieces,
            Some(subset),
            required_set_bonus_skills,
            catalog,
        ));
        info!(combinations = combinations.len(), "pruned armour combinations");
        self.entries.insert(key, Arc::clone(&combinations));
        combinations
    }
}
