//! The build search: armour and charm combinations built slot by slot, then
//! crossed with weapon configurations in descending ceiling order.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::build::Build;
use crate::contrib::armour::calculate_armour_contribution;
use crate::contrib::decorations::{check_decorations_fit, decoration_skills, DecorationCounts};
use crate::contrib::skills::{clip_levels_extended, merge_levels, set_bonus_skills};
use crate::data::armour::{ArmourPieceId, ArmourSlot};
use crate::data::charm::CharmId;
use crate::data::data_registry::Catalog;
use crate::data::search_params::{ArmourStrategy, SearchParameters};
use crate::data::skill::{SetBonusId, SetBonusPieces, SkillId, SkillLevels, SkillStates};
use crate::error::{Result, SearchError};
use crate::optimizer::armour_prune::{prune_armour_pieces, PruneCache};
use crate::optimizer::deco_prune::{pruned_decoration_set, DecorationsBySize};
use crate::optimizer::prune::percent_kept;
use crate::optimizer::set_bonus::{
    distance_to_nearest, possible_set_bonus_combos, relax_set_bonus_combos, set_bonus_subset,
};
use crate::optimizer::slot_fill::{generate_deco_additions, SeenSet};
use crate::optimizer::weapon_prune::{pruned_weapon_configs, WeaponConfig};
use crate::parallel::progress::Progress;
use crate::scoring::efr::LookupValues;
use crate::scoring::states::{best_case_efr, lookup_all_states, StateBranch};

/// Set bonus distance allowed after adding each body slot, HEAD to LEGS.
const SET_BONUS_ALLOWANCES: [u32; 5] = [5, 4, 3, 2, 1];

fn log_reduction(name: &str, pre: usize, post: usize) {
    debug!("{name}: {pre} --> {post} ({:.2}% kept)", percent_kept(pre, post));
}

/// Best build of a search. `efr`, `affinity` and `skills` count only the
/// searched skills and the tracked set bonuses, the measure every candidate is
/// compared in. [Build::calculate_performance_all_states] gives the figures
/// for everything the build has.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub build: Build,
    pub efr: f64,
    pub affinity: i32,
    pub skills: SkillLevels,
    /// State assignment the score was reached under.
    pub states: SkillStates,
}

/// Highest scoring branch. Ties keep the earlier branch.
fn top_branch(branches: Vec<StateBranch<LookupValues>>) -> Option<StateBranch<LookupValues>> {
    branches
        .into_iter()
        .reduce(|a, b| if b.result.efr > a.result.efr { b } else { a })
}

/// Charm, armour and decorations chosen so far, with the in-scope skills
/// they grant.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialBuild {
    pub charm: Option<CharmId>,
    /// Pieces in [ArmourSlot::ALL] order.
    pub armour: Vec<ArmourPieceId>,
    pub decorations: DecorationCounts,
    pub skills: SkillLevels,
    /// Piece counts of the set bonuses that required skills can come from.
    pub set_bonuses: SetBonusPieces,
    /// Armour slots left for the weapon stage to fill.
    pub open_slots: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponCandidate {
    pub config: WeaponConfig,
    /// Best EFR the configuration reaches with every in-scope skill at its limit.
    pub ceiling: f64,
}

/// Receives improvements found while exploring and supplies the bound to beat.
pub trait BestBound {
    /// Score a candidate has to exceed.
    fn current(&self) -> f64;

    /// Reports a build beating the bound. Returns the new bound.
    fn report(&mut self, found: SearchResult) -> Result<f64>;
}

/// Bound held by a single-threaded search. Improvements are rescored from
/// the complete build.
#[derive(Debug)]
pub struct LocalBest<'p, 'a> {
    plan: &'p SearchPlan<'a>,
    best: Option<SearchResult>,
}

impl<'p, 'a> LocalBest<'p, 'a> {
    pub fn new(plan: &'p SearchPlan<'a>) -> Self {
        Self { plan, best: None }
    }

    pub fn into_best(self) -> Option<SearchResult> {
        self.best
    }
}

impl BestBound for LocalBest<'_, '_> {
    fn current(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |b| b.efr)
    }

    fn report(&mut self, found: SearchResult) -> Result<f64> {
        let rescored = self.plan.score_in_scope(found.build)?;
        if rescored.efr != found.efr {
            warn!(reported = found.efr, rescored = rescored.efr, "candidate score changed on rescoring");
        }
        if rescored.efr > self.current() {
            let catalog = self.plan.catalog;
            info!("{}", rescored.build.to_humanreadable(self.plan.pinned_states(), catalog)?);
            self.best = Some(rescored);
        }
        Ok(self.current())
    }
}

/// Everything the weapon stage needs, prepared once per search.
#[derive(Debug)]
pub struct SearchPlan<'a> {
    catalog: &'a Catalog,
    params: &'a SearchParameters,
    subset: BTreeSet<SkillId>,
    minimums: BTreeMap<SkillId, u8>,
    bonus_subset: BTreeSet<SetBonusId>,
    decorations: DecorationsBySize,
    pub weapons: Vec<WeaponCandidate>,
    pub combinations: Vec<PartialBuild>,
}

fn restrict(skills: &SkillLevels, subset: &BTreeSet<SkillId>) -> SkillLevels {
    skills
        .iter()
        .filter(|(skill, &level)| level > 0 && subset.contains(skill))
        .map(|(&skill, &level)| (skill, level))
        .collect()
}

impl<'a> SearchPlan<'a> {
    pub fn prepare(
        params: &'a SearchParameters,
        catalog: &'a Catalog,
        cache: &mut PruneCache,
    ) -> Result<Self> {
        let subset = params.skill_subset();
        let minimums: BTreeMap<SkillId, u8> = params
            .skill_minimums
            .iter()
            .filter(|(_, &level)| level > 0)
            .map(|(&skill, &level)| (skill, level))
            .collect();
        let bonus_combos = possible_set_bonus_combos(&params.set_bonus_skills, &catalog.skills);
        if bonus_combos.is_empty() {
            return Err(SearchError::InvalidParameters(
                "no set bonus grants the required set bonus skills".to_string(),
            ));
        }
        let relaxed = relax_set_bonus_combos(&bonus_combos);
        let bonus_subset = set_bonus_subset(&bonus_combos);

        let decoration_ids =
            pruned_decoration_set(&subset, params.decorations.as_deref(), &catalog.decorations);
        let decorations = DecorationsBySize::new(&decoration_ids, &catalog.decorations);

        let weapons = weapon_candidates(params, &subset, &bonus_subset, catalog)?;
        info!("Weapon combinations: {}", weapons.len());

        let mut plan = Self {
            catalog,
            params,
            subset,
            minimums,
            bonus_subset,
            decorations,
            weapons,
            combinations: Vec::new(),
        };
        plan.combinations = match params.tuning.armour_strategy {
            ArmourStrategy::SlotBySlot => plan.slot_by_slot_combinations(&relaxed),
            ArmourStrategy::PrunedCombinations => plan.pruned_combinations(cache),
        };
        info!(combinations = plan.combinations.len(), "armour and charm combinations ready");
        Ok(plan)
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn pinned_states(&self) -> &'a SkillStates {
        &self.params.skill_states
    }

    /// Scores `build` the way candidates are scored while exploring: regular
    /// skills restricted to the searched subset, plus the skills of tracked
    /// set bonuses, at the most favourable states.
    pub fn score_in_scope(&self, build: Build) -> Result<SearchResult> {
        let catalog = self.catalog;
        let values = build.weapon_values(catalog)?;
        check_decorations_fit(&build.decorations, &build.usable_slots(catalog)?, &catalog.decorations)?;

        let armour = calculate_armour_contribution(&build.armour, &catalog.armour);
        let mut regular = armour.skills;
        if let Some(charm) = build.charm {
            merge_levels(&mut regular, &catalog.charms.charm(charm).skills_at_max_level());
        }
        merge_levels(&mut regular, &decoration_skills(&build.decorations, &catalog.decorations));
        let mut skills = clip_levels_extended(&restrict(&regular, &self.subset), &catalog.skills);

        let pieces: SetBonusPieces = armour
            .set_bonuses
            .iter()
            .filter(|(bonus, _)| self.bonus_subset.contains(bonus))
            .map(|(&bonus, &n)| (bonus, n))
            .collect();
        let weapon_bonus = values.set_bonus.filter(|b| self.bonus_subset.contains(b));
        skills.extend(set_bonus_skills(&pieces, weapon_bonus, &catalog.skills));

        let branches = lookup_all_states(&values, &skills, &self.params.skill_states, catalog)?;
        let top = top_branch(branches).ok_or(SearchError::NoStateBranch)?;
        Ok(SearchResult {
            build,
            efr: top.result.efr,
            affinity: top.result.affinity,
            skills: top.result.skills,
            states: top.states,
        })
    }

    fn bonus_pieces(&self, bonus: Option<SetBonusId>) -> SetBonusPieces {
        bonus
            .filter(|b| self.bonus_subset.contains(b))
            .map(|b| [(b, 1)].into_iter().collect())
            .unwrap_or_default()
    }

    fn charm_combinations(&self) -> Vec<PartialBuild> {
        let charms = self.catalog.charms.charms_for_skills(&self.subset);
        let start = |charm: Option<CharmId>| PartialBuild {
            charm,
            armour: Vec::new(),
            decorations: DecorationCounts::new(),
            skills: charm
                .map(|c| restrict(&self.catalog.charms.charm(c).skills_at_max_level(), &self.subset))
                .unwrap_or_default(),
            set_bonuses: SetBonusPieces::new(),
            open_slots: Vec::new(),
        };
        let collection: Vec<PartialBuild> = if charms.is_empty() {
            vec![start(None)]
        } else {
            charms.into_iter().map(|c| start(Some(c))).collect()
        };
        info!("Charms: {}", collection.len());
        collection
    }

    fn slot_by_slot_combinations(&self, relaxed: &[SetBonusPieces]) -> Vec<PartialBuild> {
        let pieces = prune_armour_pieces(self.params.armour_tier, Some(&self.subset), self.catalog);
        let mut collection = self.charm_combinations();
        for (slot, allowance) in ArmourSlot::ALL.into_iter().zip(SET_BONUS_ALLOWANCES) {
            collection =
                self.add_armour_slot(collection, slot, &pieces[slot.index()], relaxed, allowance);
        }
        collection
    }

    fn add_armour_slot(
        &self,
        collection: Vec<PartialBuild>,
        slot: ArmourSlot,
        pieces: &[ArmourPieceId],
        relaxed: &[SetBonusPieces],
        allowance: u32,
    ) -> Vec<PartialBuild> {
        let catalog = self.catalog;

        let progress = Progress::new(format!("GENERATING {slot} PIECE COMBINATIONS -"), pieces.len())
            .with_granularity(100);
        let mut seen = SeenSet::new();
        let mut stage1_pre = 0;
        for &id in pieces {
            let piece = catalog.armour.piece(id);
            let bonuses = self.bonus_pieces(catalog.armour.set_of(id).set_bonus);
            let fills = generate_deco_additions(
                &piece.decoration_slots,
                &piece.skills,
                &self.decorations,
                &catalog.decorations,
                &catalog.skills,
            );
            stage1_pre += fills.len();
            for fill in fills {
                let skills = restrict(&clip_levels_extended(&fill.skills, &catalog.skills), &self.subset);
                seen.add(&skills, &bonuses, (id, fill.decorations, skills.clone(), bonuses.clone()));
            }
            progress.advance(1);
        }
        let piece_combos = seen.into_items();
        let stage1_post = piece_combos.len();

        let stage2_pre = collection.len() * piece_combos.len();
        let progress =
            Progress::new(format!("COMBINING {slot} PIECES -"), stage2_pre).with_granularity(5000);
        let mut seen = SeenSet::new();
        for partial in collection {
            for (id, decorations, skills, bonuses) in &piece_combos {
                progress.advance(1);
                let mut set_bonuses = partial.set_bonuses.clone();
                for (&bonus, &n) in bonuses {
                    *set_bonuses.entry(bonus).or_insert(0) += n;
                }
                if distance_to_nearest(&set_bonuses, relaxed) > allowance {
                    continue;
                }
                let mut merged = partial.skills.clone();
                merge_levels(&mut merged, skills);
                let merged = clip_levels_extended(&restrict(&merged, &self.subset), &catalog.skills);

                let mut next = partial.clone();
                next.armour.push(*id);
                for &decoration in decorations {
                    *next.decorations.entry(decoration).or_insert(0) += 1;
                }
                next.skills = merged;
                next.set_bonuses = set_bonuses;
                let (skills, set_bonuses) = (next.skills.clone(), next.set_bonuses.clone());
                seen.add(&skills, &set_bonuses, next);
            }
        }
        let combined = seen.into_items();

        log_reduction(&format!("{slot} piece+deco combination reduction"), stage1_pre, stage1_post);
        log_reduction(&format!("{slot} full combining reduction"), stage2_pre, combined.len());
        combined
    }

    fn pruned_combinations(&self, cache: &mut PruneCache) -> Vec<PartialBuild> {
        let armour = cache.pruned_armour_combinations(
            self.params.armour_tier,
            &self.subset,
            &self.params.set_bonus_skills,
            self.catalog,
        );
        let charms = self.charm_combinations();
        let mut collection = Vec::with_capacity(charms.len() * armour.len());
        for charm in &charms {
            for combination in armour.iter() {
                let mut skills = charm.skills.clone();
                merge_levels(&mut skills, &restrict(&combination.regular_skills(self.catalog), &self.subset));
                let set_bonuses = combination
                    .set_bonuses
                    .iter()
                    .filter(|(bonus, _)| self.bonus_subset.contains(bonus))
                    .map(|(&bonus, &n)| (bonus, n))
                    .collect();
                collection.push(PartialBuild {
                    charm: charm.charm,
                    armour: combination.pieces.to_vec(),
                    decorations: DecorationCounts::new(),
                    skills: clip_levels_extended(&skills, &self.catalog.skills),
                    set_bonuses,
                    open_slots: combination.slots.clone(),
                });
            }
        }
        collection
    }

    /// Crosses `combinations` with the weapon candidates, reporting every
    /// candidate that beats the bound.
    pub fn explore(
        &self,
        combinations: &[PartialBuild],
        bound: &mut dyn BestBound,
        progress: Option<&Progress>,
    ) -> Result<()> {
        let catalog = self.catalog;
        let pinned = &self.params.skill_states;
        let mut weapons: Vec<&WeaponCandidate> = self.weapons.iter().collect();
        let mut pruned_at = bound.current();

        for partial in combinations {
            let mut best = bound.current();
            for weapon in &weapons {
                if weapon.ceiling <= best {
                    break;
                }
                let values = &weapon.config.values;
                let weapon_bonus = values.set_bonus.filter(|b| self.bonus_subset.contains(b));
                let bonus_skills = set_bonus_skills(&partial.set_bonuses, weapon_bonus, &catalog.skills);
                if !self
                    .params
                    .set_bonus_skills
                    .iter()
                    .all(|s| bonus_skills.get(s).copied().unwrap_or(0) > 0)
                {
                    continue;
                }

                let mut slots = values.slots.clone();
                slots.extend_from_slice(&partial.open_slots);
                let fills = generate_deco_additions(
                    &slots,
                    &partial.skills,
                    &self.decorations,
                    &catalog.decorations,
                    &catalog.skills,
                );
                for fill in fills {
                    let mut skills =
                        clip_levels_extended(&restrict(&fill.skills, &self.subset), &catalog.skills);
                    skills.extend(bonus_skills.iter().map(|(&s, &l)| (s, l)));
                    if !self
                        .minimums
                        .iter()
                        .all(|(s, &min)| skills.get(s).copied().unwrap_or(0) >= min)
                    {
                        continue;
                    }

                    let branches = lookup_all_states(values, &skills, pinned, catalog)?;
                    let Some(top) = top_branch(branches) else {
                        continue;
                    };
                    if top.result.efr <= best {
                        continue;
                    }

                    let mut decorations = partial.decorations.clone();
                    for decoration in fill.decorations {
                        *decorations.entry(decoration).or_insert(0) += 1;
                    }
                    let armour: [ArmourPieceId; 5] =
                        partial.armour.clone().try_into().map_err(|_| {
                            SearchError::InvalidParameters(
                                "armour combination is missing a body slot".to_string(),
                            )
                        })?;
                    let found = SearchResult {
                        build: Build {
                            weapon: weapon.config.weapon,
                            armour,
                            charm: partial.charm,
                            augments: weapon.config.augments.clone(),
                            upgrades: weapon.config.upgrades.clone(),
                            decorations,
                        },
                        efr: top.result.efr,
                        affinity: top.result.affinity,
                        skills: top.result.skills,
                        states: top.states,
                    };
                    best = bound.report(found)?.max(top.result.efr);
                }
            }
            if let Some(progress) = progress {
                progress.advance(1);
            }

            let best = bound.current().max(best);
            if best > pruned_at {
                let before = weapons.len();
                weapons.retain(|w| w.ceiling > best);
                pruned_at = best;
                debug!(
                    "New number of weapon configurations: {} out of {before}",
                    weapons.len()
                );
            }
        }
        Ok(())
    }
}

/// Weapon configurations with their ceilings, highest first. The ceiling puts
/// every searched skill and every tracked set bonus skill at its limit, so no
/// candidate on that weapon scores above it.
fn weapon_candidates(
    params: &SearchParameters,
    subset: &BTreeSet<SkillId>,
    bonus_subset: &BTreeSet<SetBonusId>,
    catalog: &Catalog,
) -> Result<Vec<WeaponCandidate>> {
    let bonus_skills = bonus_subset
        .iter()
        .flat_map(|&bonus| catalog.skills.set_bonus(bonus).stages.iter().map(|&(_, skill)| skill));
    let all_at_limit: SkillLevels = subset
        .iter()
        .copied()
        .chain(bonus_skills)
        .map(|skill| (skill, catalog.skills.skill(skill).limit))
        .collect();
    let mut candidates = pruned_weapon_configs(params.weapon_class, params.health_regen_minimum, catalog)?
        .into_iter()
        .map(|config| {
            let ceiling = best_case_efr(&config.values, &all_at_limit, &params.skill_states, catalog)?;
            Ok(WeaponCandidate { config, ceiling })
        })
        .collect::<Result<Vec<_>>>()?;
    candidates.sort_by(|a, b| b.ceiling.total_cmp(&a.ceiling));
    Ok(candidates)
}

/// Runs the whole search on the calling thread.
pub fn find_highest_efr_build(params: &SearchParameters, catalog: &Catalog) -> Result<Option<SearchResult>> {
    find_highest_efr_build_with_cache(params, catalog, &mut PruneCache::new())
}

pub fn find_highest_efr_build_with_cache(
    params: &SearchParameters,
    catalog: &Catalog,
    cache: &mut PruneCache,
) -> Result<Option<SearchResult>> {
    let plan = SearchPlan::prepare(params, catalog, cache)?;
    let progress =
        Progress::new("COMBINING WEAPONS -", plan.combinations.len()).with_granularity(1000);
    let mut best = LocalBest::new(&plan);
    plan.explore(&plan.combinations, &mut best, Some(&progress))?;
    progress.finish();
    Ok(best.into_best())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contrib::weapon_augments::WeaponAugments;
    use crate::contrib::weapon_upgrades::WeaponUpgrades;
    use crate::data::armour::{ArmourDiscriminator, ArmourVariant};
    use crate::data::data_registry::shipped_catalog;
    use crate::data::weapon::WeaponClass;

    fn params(catalog: &Catalog, skills: &[(&str, u8)]) -> SearchParameters {
        let mut params = SearchParameters::new(WeaponClass::Greatsword);
        for &(id, min) in skills {
            params
                .skill_minimums
                .insert(catalog.skills.resolve(id).unwrap(), min);
        }
        params
    }

    #[test]
    fn finds_a_build_meeting_minimums() {
        let catalog = shipped_catalog();
        let params = params(&catalog, &[("ATTACK_BOOST", 2), ("CRITICAL_EYE", 0)]);
        let result = find_highest_efr_build(&params, &catalog).unwrap().unwrap();
        let attack = catalog.skills.resolve("ATTACK_BOOST").unwrap();
        assert!(result.skills.get(&attack).copied().unwrap_or(0) >= 2);
        assert!(result.efr > 0.0);

        let plan = SearchPlan::prepare(&params, &catalog, &mut PruneCache::new()).unwrap();
        let rescored = plan.score_in_scope(result.build.clone()).unwrap();
        assert_eq!(rescored.efr, result.efr);

        // Skills outside the search only ever add to the full figure.
        let full = result
            .build
            .calculate_performance_all_states(&params.skill_states, &catalog)
            .unwrap()
            .into_iter()
            .map(|branch| branch.result.efr)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(full + 1e-9 >= result.efr);
    }

    #[test]
    fn out_of_scope_skills_do_not_count() {
        let catalog = shipped_catalog();
        let params = params(&catalog, &[("ATTACK_BOOST", 0)]);
        let plan = SearchPlan::prepare(&params, &catalog, &mut PruneCache::new()).unwrap();
        let piece = |slot| {
            catalog
                .armour
                .find("Kaiser", ArmourDiscriminator::MasterRank, ArmourVariant::MrAlphaPlus, slot)
                .unwrap()
        };
        let weapon = catalog.weapons.resolve("ACID_SHREDDER_II").unwrap();
        let info = catalog.weapons.weapon(weapon);
        let build = Build {
            weapon,
            armour: ArmourSlot::ALL.map(piece),
            charm: None,
            augments: WeaponAugments::for_weapon(info).unwrap(),
            upgrades: WeaponUpgrades::for_weapon(info),
            decorations: DecorationCounts::new(),
        };
        // Kaiser carries Critical Eye and Critical Boost, neither of which is searched.
        let scoped = plan.score_in_scope(build.clone()).unwrap();
        assert!(scoped.skills.is_empty());
        let values = build.weapon_values(&catalog).unwrap();
        let bare = best_case_efr(&values, &SkillLevels::new(), &SkillStates::new(), &catalog).unwrap();
        assert_eq!(scoped.efr, bare);
    }

    #[test]
    fn unreachable_minimum_finds_nothing() {
        let catalog = shipped_catalog();
        let mut params = params(&catalog, &[("NON_ELEMENTAL_BOOST", 1)]);
        params.decorations = Some(Vec::new());
        assert_eq!(find_highest_efr_build(&params, &catalog).unwrap(), None);
    }

    #[test]
    fn strategies_agree_on_the_best_score() {
        let catalog = shipped_catalog();
        let mut params = params(&catalog, &[("ATTACK_BOOST", 0), ("CRITICAL_BOOST", 0)]);
        params.decorations = Some(vec![catalog.decorations.resolve("ATTACK").unwrap()]);
        let slot_by_slot = find_highest_efr_build(&params, &catalog).unwrap().unwrap();
        params.tuning.armour_strategy = ArmourStrategy::PrunedCombinations;
        let mut cache = PruneCache::new();
        let pruned = find_highest_efr_build_with_cache(&params, &catalog, &mut cache)
            .unwrap()
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!((slot_by_slot.efr - pruned.efr).abs() < 1e-9);
    }

    #[test]
    fn weapon_candidates_are_sorted_by_ceiling() {
        let catalog = shipped_catalog();
        let params = params(&catalog, &[("ATTACK_BOOST", 0), ("CRITICAL_EYE", 0)]);
        let weapons =
            weapon_candidates(&params, &params.skill_subset(), &BTreeSet::new(), &catalog).unwrap();
        assert!(!weapons.is_empty());
        assert!(weapons.windows(2).all(|w| w[0].ceiling >= w[1].ceiling));
    }
}
