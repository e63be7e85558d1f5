//! EFR lookup, decoration slot filling and armour combination pruning.
//!
//! Run with: `cargo bench --bench lookup`

use std::collections::BTreeSet;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mhwi_build_search::contrib::weapon_augments::WeaponAugments;
use mhwi_build_search::contrib::weapon_upgrades::WeaponUpgrades;
use mhwi_build_search::contrib::weapon_values::calculate_final_weapon_values;
use mhwi_build_search::data::armour::Tier;
use mhwi_build_search::data::data_registry::Catalog;
use mhwi_build_search::data::skill::{SkillId, SkillLevels, SkillStates};
use mhwi_build_search::optimizer::armour_prune::PruneCache;
use mhwi_build_search::optimizer::deco_prune::{pruned_decoration_set, DecorationsBySize};
use mhwi_build_search::optimizer::slot_fill::generate_deco_additions;
use mhwi_build_search::scoring::states::best_case_efr;

fn load() -> std::sync::Arc<Catalog> {
    Catalog::load_from_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
        .expect("shipped catalog should load")
}

fn skills(catalog: &Catalog, pairs: &[(&str, u8)]) -> SkillLevels {
    pairs
        .iter()
        .map(|&(id, level)| (catalog.skills.resolve(id).expect("skill"), level))
        .collect()
}

fn bench_lookup(c: &mut Criterion) {
    let catalog = load();
    let id = catalog.weapons.resolve("ROYAL_VENUS_BLADE").expect("weapon");
    let info = catalog.weapons.weapon(id);
    let weapon = calculate_final_weapon_values(
        id,
        info,
        &WeaponAugments::for_weapon(info).expect("augments"),
        &WeaponUpgrades::for_weapon(info),
        &catalog.skills,
    )
    .expect("weapon values");
    let levels = skills(
        &catalog,
        &[
            ("CRITICAL_EYE", 4),
            ("ATTACK_BOOST", 3),
            ("PEAK_PERFORMANCE", 3),
            ("AGITATOR", 2),
            ("WEAKNESS_EXPLOIT", 1),
        ],
    );

    c.bench_function("best_case_efr", |b| {
        b.iter(|| {
            black_box(best_case_efr(
                black_box(&weapon),
                black_box(&levels),
                &SkillStates::new(),
                &catalog,
            ))
        });
    });
}

fn bench_slot_fill(c: &mut Criterion) {
    let catalog = load();
    let subset: BTreeSet<SkillId> = ["ATTACK_BOOST", "CRITICAL_EYE", "CRITICAL_BOOST"]
        .iter()
        .map(|id| catalog.skills.resolve(id).expect("skill"))
        .collect();
    let ids = pruned_decoration_set(&subset, None, &catalog.decorations);
    let by_size = DecorationsBySize::new(&ids, &catalog.decorations);

    c.bench_function("generate_deco_additions", |b| {
        b.iter(|| {
            black_box(generate_deco_additions(
                black_box(&[4, 4, 2, 1, 1]),
                &SkillLevels::new(),
                &by_size,
                &catalog.decorations,
                &catalog.skills,
            ))
        });
    });
}

fn bench_armour_prune(c: &mut Criterion) {
    let catalog = load();
    let subset: BTreeSet<SkillId> = ["ATTACK_BOOST", "CRITICAL_EYE"]
        .iter()
        .map(|id| catalog.skills.resolve(id).expect("skill"))
        .collect();

    let mut group = c.benchmark_group("armour_prune");
    group.sample_size(20);
    group.bench_function("master_rank", |b| {
        b.iter(|| {
            let mut cache = PruneCache::new();
            black_box(cache.pruned_armour_combinations(
                Some(Tier::MasterRank),
                &subset,
                &BTreeSet::new(),
                &catalog,
            ))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_slot_fill, bench_armour_prune);
criterion_main!(benches);
