//! Validate the catalog files: parse each one and print its diagnostics.
//! Run: cargo run --bin validate_data [data-dir]

use std::path::PathBuf;

use mhwi_build_search::data::data_registry::{Catalog, DEFAULT_DATA_DIR};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    if !data_root.is_dir() {
        eprintln!("Data directory not found: {}", data_root.display());
        std::process::exit(1);
    }

    let (catalog, reports) = Catalog::load_with_reports(&data_root)?;

    let mut errors = 0;
    let mut warnings = 0;
    for file in &reports {
        let file_errors = file.report.error_count();
        errors += file_errors;
        warnings += file.report.diagnostics.len() - file_errors;
        for diagnostic in &file.report.diagnostics {
            eprintln!("[{}] {}", file.file, diagnostic);
        }
    }

    println!(
        "Validated {} files: {} skills, {} set bonuses, {} decorations, {} charms, {} armour pieces, {} weapons",
        reports.len(),
        catalog.skills.len(),
        catalog.skills.set_bonuses().len(),
        catalog.decorations.len(),
        catalog.charms.len(),
        catalog.armour.len(),
        catalog.weapons.len()
    );
    println!("{errors} errors, {warnings} warnings");
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
