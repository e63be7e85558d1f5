use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::build::Build;
use crate::data::data_registry::{Catalog, DEFAULT_DATA_DIR};
use crate::data::search_params::{validate_state, SearchParameters};
use crate::data::skill::{SkillId, SkillLevels, SkillStates, SkillTable};
use crate::error::{Result, SearchError};
use crate::optimizer::{optimize, ExecutionMode, PruneCache, SearchResult};

/// Shown under every help screen.
pub const CATALOG_NOTE: &str = "The bundled data/ catalogs are a small sample of the game's \
weapons, armour, charms and decorations, enough to exercise every feature. Point --data-dir \
at complete tables for searches over the whole game.";

#[derive(Debug, Parser)]
#[command(
    name = "mhwi-build-search",
    about = "Highest-EFR build search for MHW: Iceborne",
    after_help = CATALOG_NOTE
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for the highest-EFR build meeting the parameters in a JSON or YAML file.
    Search {
        params: PathBuf,
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
        /// Worker threads (0 uses one per core). Overrides the parameters file.
        #[arg(long)]
        workers: Option<usize>,
        /// Run the weapon stage on the calling thread.
        #[arg(long)]
        sequential: bool,
    },
    /// Score a saved build under every state assignment.
    Lookup {
        build: PathBuf,
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
        /// Pin a skill state, e.g. `--state AGITATOR=1`.
        #[arg(long = "state", value_name = "SKILL=N")]
        states: Vec<String>,
    },
    /// Load every catalog file and print its diagnostics.
    Validate {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    build: serde_json::Value,
    efr: f64,
    affinity: i32,
    skills: BTreeMap<String, u8>,
    states: BTreeMap<String, u8>,
}

#[derive(Debug, Serialize)]
struct BranchOutput {
    states: BTreeMap<String, u8>,
    efr: f64,
    affinity: i32,
    skills: BTreeMap<String, u8>,
}

fn named(levels: &SkillLevels, table: &SkillTable) -> BTreeMap<String, u8> {
    levels
        .iter()
        .map(|(&skill, &level)| (table.skill(skill).id.clone(), level))
        .collect()
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = err.print();
            return code;
        }
    };
    match cli.command {
        Command::Search {
            params,
            data_dir,
            workers,
            sequential,
        } => handle_search(&params, &data_dir, workers, sequential),
        Command::Lookup {
            build,
            data_dir,
            states,
        } => handle_lookup(&build, &data_dir, &states),
        Command::Validate { data_dir } => handle_validate(&data_dir),
    }
}

fn report_failure(what: &str, err: SearchError) -> i32 {
    eprintln!("{what} failed: {err}");
    if let SearchError::Catalog { diagnostics, .. } = &err {
        for diagnostic in diagnostics {
            eprintln!("- {diagnostic}");
        }
    }
    1
}

fn handle_search(params_path: &Path, data_dir: &Path, workers: Option<usize>, sequential: bool) -> i32 {
    let run = || -> Result<Option<SearchResult>> {
        let catalog = Catalog::load_from_dir(data_dir)?;
        let mut params = SearchParameters::load(params_path, &catalog)?;
        if let Some(workers) = workers {
            params.tuning.workers = workers;
        }
        let mode = if sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Parallel
        };
        let found = optimize(&params, &catalog, mode, &mut PruneCache::new())?;
        if let Some(result) = &found {
            let output = SearchOutput {
                build: serde_json::from_str(&result.build.serialize(&catalog)?)?,
                efr: result.efr,
                affinity: result.affinity,
                skills: named(&result.skills, &catalog.skills),
                states: named(&result.states, &catalog.skills),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Ok(found)
    };
    match run() {
        Ok(Some(_)) => 0,
        Ok(None) => {
            println!("no qualifying build found");
            0
        }
        Err(err) => report_failure("search", err),
    }
}

fn parse_state(raw: &str, table: &SkillTable) -> Result<(SkillId, u8)> {
    let invalid = || SearchError::InvalidParameters(format!("expected SKILL=N, got '{raw}'"));
    let (id, state) = raw.split_once('=').ok_or_else(invalid)?;
    let state: u8 = state.trim().parse().map_err(|_| invalid())?;
    let skill = table.resolve(id.trim())?;
    validate_state(table, skill, state)?;
    Ok((skill, state))
}

fn handle_lookup(build_path: &Path, data_dir: &Path, raw_states: &[String]) -> i32 {
    let run = || -> Result<String> {
        let catalog = Catalog::load_from_dir(data_dir)?;
        let mut pinned = SkillStates::new();
        for raw in raw_states {
            let (skill, state) = parse_state(raw, &catalog.skills)?;
            pinned.insert(skill, state);
        }
        let build = Build::deserialize(&std::fs::read_to_string(build_path)?, &catalog)?;
        let branches: Vec<BranchOutput> = build
            .calculate_performance_all_states(&pinned, &catalog)?
            .into_iter()
            .map(|branch| BranchOutput {
                states: named(&branch.states, &catalog.skills),
                efr: branch.result.efr,
                affinity: branch.result.affinity,
                skills: named(&branch.result.skills, &catalog.skills),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&branches)?)
    };
    match run() {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => report_failure("lookup", err),
    }
}

fn handle_validate(data_dir: &Path) -> i32 {
    let reports = match Catalog::load_with_reports(data_dir) {
        Ok((_, reports)) => reports,
        Err(err) => return report_failure("validation", err),
    };
    let mut errors = 0;
    for file in &reports {
        errors += file.report.error_count();
        for diagnostic in &file.report.diagnostics {
            println!("{}: {diagnostic}", file.file);
        }
    }
    if errors == 0 {
        println!("validation passed: {} files in {}", reports.len(), data_dir.display());
        0
    } else {
        eprintln!("validation failed: {errors} error(s)");
        1
    }
}
