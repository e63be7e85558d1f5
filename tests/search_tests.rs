use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use mhwi_build_search::build::Build;
use mhwi_build_search::contrib::decorations::{check_decorations_fit, DecorationCounts};
use mhwi_build_search::data::armour::{ArmourSlot, Tier};
use mhwi_build_search::data::data_registry::Catalog;
use mhwi_build_search::data::search_params::{ArmourStrategy, SearchParameters};
use mhwi_build_search::data::skill::{SkillId, SkillLevels, SkillStates};
use mhwi_build_search::data::weapon::WeaponClass;
use mhwi_build_search::optimizer::weapon_prune::pruned_weapon_configs;
use mhwi_build_search::optimizer::{optimize, ExecutionMode, PruneCache};
use mhwi_build_search::scoring::states::best_case_efr;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn catalog() -> Arc<Catalog> {
    Catalog::load_from_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
        .expect("shipped catalog should load")
}

fn params(catalog: &Catalog, class: WeaponClass, skills: &[(&str, u8)]) -> SearchParameters {
    let mut params = SearchParameters::new(class);
    for &(id, min) in skills {
        let skill = catalog.skills.resolve(id).expect("skill should exist");
        params.skill_minimums.insert(skill, min);
    }
    params
}

#[test]
fn sequential_search_is_deterministic() {
    let catalog = catalog();
    let params = params(
        &catalog,
        WeaponClass::Greatsword,
        &[("ATTACK_BOOST", 0), ("CRITICAL_EYE", 0), ("CRITICAL_BOOST", 0)],
    );
    let first = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    let second = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    assert_eq!(first.efr, second.efr);
    assert_eq!(
        first.build.serialize(&catalog).expect("serialize"),
        second.build.serialize(&catalog).expect("serialize")
    );
}

#[test]
fn parallel_search_matches_sequential_score() {
    let catalog = catalog();
    let mut params = params(
        &catalog,
        WeaponClass::Greatsword,
        &[("ATTACK_BOOST", 1), ("CRITICAL_EYE", 0), ("WEAKNESS_EXPLOIT", 0)],
    );
    params.tuning.workers = 2;
    params.tuning.batch_size = 4;

    let sequential = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    let parallel = optimize(&params, &catalog, ExecutionMode::Parallel, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    assert!(
        approx_eq(sequential.efr, parallel.efr, 1e-9),
        "sequential {} vs parallel {}",
        sequential.efr,
        parallel.efr
    );
}

#[test]
fn pinned_state_never_scores_above_the_free_search() {
    let catalog = catalog();
    let free = params(
        &catalog,
        WeaponClass::Greatsword,
        &[("AGITATOR", 1), ("ATTACK_BOOST", 0)],
    );
    let mut pinned = free.clone();
    let agitator = catalog.skills.resolve("AGITATOR").expect("agitator");
    pinned.skill_states.insert(agitator, 0);

    let free = optimize(&free, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    let calm = optimize(&pinned, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    assert!(calm.efr <= free.efr + 1e-9);
    assert_eq!(calm.states.get(&agitator), Some(&0));
    assert!(calm.skills.get(&agitator).copied().unwrap_or(0) >= 1);
}

#[test]
fn required_set_bonus_skill_is_met() {
    let catalog = catalog();
    let mut params = params(&catalog, WeaponClass::Greatsword, &[("CRITICAL_EYE", 0)]);
    let touch = catalog.skills.resolve("MASTERS_TOUCH").expect("master's touch");
    params.set_bonus_skills.insert(touch);

    let result = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    assert_eq!(result.skills.get(&touch), Some(&1));
}

#[test]
fn pruned_combinations_reuse_the_cache_across_runs() {
    let catalog = catalog();
    let mut params = params(&catalog, WeaponClass::Greatsword, &[("ATTACK_BOOST", 0)]);
    params.tuning.armour_strategy = ArmourStrategy::PrunedCombinations;
    params.decorations = Some(vec![catalog.decorations.resolve("ATTACK").expect("attack")]);

    let mut cache = PruneCache::new();
    let first = optimize(&params, &catalog, ExecutionMode::Sequential, &mut cache)
        .expect("search should run")
        .expect("a build should exist");
    let second = optimize(&params, &catalog, ExecutionMode::Parallel, &mut cache)
        .expect("search should run")
        .expect("a build should exist");
    assert_eq!(cache.len(), 1);
    assert!(approx_eq(first.efr, second.efr, 1e-9));
}

#[test]
fn bow_builds_have_no_sharpness() {
    let catalog = catalog();
    let params = params(&catalog, WeaponClass::Bow, &[("ATTACK_BOOST", 0)]);
    let result = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    let weapon = catalog.weapons.weapon(result.build.weapon);
    assert_eq!(weapon.class, WeaponClass::Bow);
    let values = result.build.weapon_values(&catalog).expect("weapon values");
    assert!(values.maximum_sharpness.is_none());
}

/// Score over the searched skills, or `None` when the decorations do not fit.
fn scoped_efr(build: &Build, subset: &BTreeSet<SkillId>, minimums: &SkillLevels, catalog: &Catalog) -> Option<f64> {
    let slots = build.usable_slots(catalog).expect("slots");
    if check_decorations_fit(&build.decorations, &slots, &catalog.decorations).is_err() {
        return None;
    }
    let skills: SkillLevels = build
        .skills(catalog)
        .expect("skills")
        .into_iter()
        .filter(|(skill, _)| subset.contains(skill))
        .collect();
    if minimums
        .iter()
        .any(|(skill, &min)| skills.get(skill).copied().unwrap_or(0) < min)
    {
        return None;
    }
    let values = build.weapon_values(catalog).expect("weapon values");
    Some(best_case_efr(&values, &skills, &SkillStates::new(), catalog).expect("efr"))
}

#[test]
fn search_finds_the_exhaustive_maximum() {
    let catalog = catalog();
    let mut params = params(
        &catalog,
        WeaponClass::Greatsword,
        &[("ATTACK_BOOST", 1), ("CRITICAL_EYE", 0)],
    );
    params.armour_tier = Some(Tier::HighRank);
    let attack = catalog.decorations.resolve("ATTACK").expect("attack");
    let expert = catalog.decorations.resolve("EXPERT").expect("expert");
    params.decorations = Some(vec![attack, expert]);
    params.tuning.workers = 2;
    params.tuning.batch_size = 3;

    // Every high rank piece, charm, weapon configuration and decoration split.
    let subset = params.skill_subset();
    let minimums: SkillLevels = params.skill_minimums.clone().into_iter().collect();
    let pieces: Vec<_> = ArmourSlot::ALL
        .iter()
        .map(|&slot| catalog.armour.pieces_for_slot(slot, Some(Tier::HighRank)))
        .collect();
    let mut charms: Vec<_> = catalog.charms.charms_for_skills(&subset).into_iter().map(Some).collect();
    charms.push(None);
    let weapons = pruned_weapon_configs(params.weapon_class, params.health_regen_minimum, &catalog)
        .expect("weapon configs");

    let mut exhaustive = 0.0f64;
    for &head in &pieces[0] {
        for &chest in &pieces[1] {
            for &arms in &pieces[2] {
                for &waist in &pieces[3] {
                    for &legs in &pieces[4] {
                        for &charm in &charms {
                            for config in &weapons {
                                let mut build = Build {
                                    weapon: config.weapon,
                                    armour: [head, chest, arms, waist, legs],
                                    charm,
                                    augments: config.augments.clone(),
                                    upgrades: config.upgrades.clone(),
                                    decorations: DecorationCounts::new(),
                                };
                                let slots = build.usable_slots(&catalog).expect("slots").len() as u32;
                                for attacks in 0..=slots {
                                    for experts in 0..=slots - attacks {
                                        build.decorations = [(attack, attacks), (expert, experts)]
                                            .into_iter()
                                            .filter(|&(_, n)| n > 0)
                                            .collect();
                                        if let Some(efr) = scoped_efr(&build, &subset, &minimums, &catalog) {
                                            exhaustive = exhaustive.max(efr);
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    assert!(exhaustive > 0.0);

    let slot_by_slot = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    let parallel = optimize(&params, &catalog, ExecutionMode::Parallel, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");
    params.tuning.armour_strategy = ArmourStrategy::PrunedCombinations;
    let pruned = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())
        .expect("search should run")
        .expect("a build should exist");

    for (name, found) in [("slot by slot", &slot_by_slot), ("parallel", &parallel), ("pruned", &pruned)] {
        assert!(
            approx_eq(found.efr, exhaustive, 1e-9),
            "{name}: {} vs exhaustive {exhaustive}",
            found.efr
        );
        let rescored = scoped_efr(&found.build, &subset, &minimums, &catalog).expect("result should fit");
        assert!(approx_eq(rescored, found.efr, 1e-9), "{name}: {rescored} vs {}", found.efr);
    }
}
