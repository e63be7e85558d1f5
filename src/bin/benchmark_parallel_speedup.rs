//! Run one search sequentially and once in parallel, then print timings and speedup.
//!
//! Usage: cargo run --release --bin benchmark_parallel_speedup [params.json|yaml]
//!
//! Run from the project root so the data/ catalogs are available.

use std::path::Path;
use std::time::Instant;

use mhwi_build_search::data::data_registry::Catalog;
use mhwi_build_search::data::search_params::SearchParameters;
use mhwi_build_search::data::weapon::WeaponClass;
use mhwi_build_search::optimizer::{optimize, ExecutionMode, PruneCache};

const DEFAULT_SKILLS: [(&str, u8); 6] = [
    ("ATTACK_BOOST", 0),
    ("CRITICAL_EYE", 0),
    ("CRITICAL_BOOST", 0),
    ("WEAKNESS_EXPLOIT", 0),
    ("AGITATOR", 0),
    ("HANDICRAFT", 0),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load()?;
    let params = match std::env::args().nth(1) {
        Some(path) => SearchParameters::load(Path::new(&path), &catalog)?,
        None => {
            let mut params = SearchParameters::new(WeaponClass::Greatsword);
            for (id, min) in DEFAULT_SKILLS {
                params.skill_minimums.insert(catalog.skills.resolve(id)?, min);
            }
            params
        }
    };

    println!(
        "Search: {} with {} tracked skills",
        params.weapon_class.name(),
        params.skill_minimums.len()
    );
    println!();

    // Sequential
    let t0 = Instant::now();
    let seq = optimize(&params, &catalog, ExecutionMode::Sequential, &mut PruneCache::new())?;
    let elapsed_seq = t0.elapsed();
    let seq_ms = elapsed_seq.as_secs_f64() * 1000.0;
    println!("Sequential:  {seq_ms:.2} ms");

    // Parallel
    let t0 = Instant::now();
    let par = optimize(&params, &catalog, ExecutionMode::Parallel, &mut PruneCache::new())?;
    let elapsed_par = t0.elapsed();
    let par_ms = elapsed_par.as_secs_f64() * 1000.0;
    println!("Parallel:    {par_ms:.2} ms");

    println!();
    println!("Speedup:     {:.2}x faster (parallel vs sequential)", seq_ms / par_ms);

    match (&seq, &par) {
        (Some(a), Some(b)) => {
            assert!((a.efr - b.efr).abs() < 1e-9, "best EFR mismatch: {} vs {}", a.efr, b.efr);
            println!("(Best EFR matches sequential vs parallel: {:.2})", a.efr);
        }
        (None, None) => println!("(Neither run found a qualifying build)"),
        _ => return Err("sequential and parallel runs disagree on whether a build exists".into()),
    }
    Ok(())
}
