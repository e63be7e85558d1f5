//! Startup-loaded equipment catalog.
//! Load once, then share via Arc with the search driver and its workers.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::contrib::skills::ScoringSkills;
use crate::data::armour::{armour_table_from_json, ArmourTable};
use crate::data::charm::{charm_table_from_json, CharmTable};
use crate::data::decoration::{decoration_table_from_json, DecorationTable};
use crate::data::skill::{skill_table_from_json, SkillTable};
use crate::data::validate::ValidationReport;
use crate::data::weapon::{weapon_table_from_json, WeaponTable};
use crate::error::{Result, SearchError};

pub const DEFAULT_DATA_DIR: &str = "data";

pub const DEFAULT_SKILLS_PATH: &str = "data/skills.json";
pub const DEFAULT_DECORATIONS_PATH: &str = "data/decorations.json";
pub const DEFAULT_CHARMS_PATH: &str = "data/charms.json";
pub const DEFAULT_ARMOUR_PATH: &str = "data/armour.json";
pub const DEFAULT_WEAPONS_PATH: &str = "data/weapons.json";

const SKILLS_FILE: &str = "skills.json";
const DECORATIONS_FILE: &str = "decorations.json";
const CHARMS_FILE: &str = "charms.json";
const ARMOUR_FILE: &str = "armour.json";
const WEAPONS_FILE: &str = "weapons.json";

/// Raw JSON text of every catalog file.
#[derive(Debug, Clone, Copy)]
pub struct CatalogSources<'a> {
    pub skills: &'a str,
    pub decorations: &'a str,
    pub charms: &'a str,
    pub armour: &'a str,
    pub weapons: &'a str,
}

/// Validation diagnostics for one catalog file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub report: ValidationReport,
}

/// Read-only tables of every data-defined entity.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub skills: SkillTable,
    pub decorations: DecorationTable,
    pub charms: CharmTable,
    pub armour: ArmourTable,
    pub weapons: WeaponTable,
    /// Handles of the skills the EFR calculation reads.
    pub scoring: ScoringSkills,
}

impl Catalog {
    /// Load every catalog from the `DEFAULT_*_PATH` locations. The shipped
    /// tables are a sample of the game's equipment, not the full set.
    pub fn load() -> Result<Arc<Catalog>> {
        Self::load_from_dir(Path::new(DEFAULT_DATA_DIR))
    }

    /// Load every catalog from `dir`. Any error-severity diagnostic aborts the load.
    pub fn load_from_dir(dir: &Path) -> Result<Arc<Catalog>> {
        let (catalog, reports) = Self::load_with_reports(dir)?;
        Self::reject_errors(&reports)?;
        for file in &reports {
            for diag in &file.report.diagnostics {
                warn!(file = %file.file, "{diag}");
            }
        }
        info!(
            skills = catalog.skills.len(),
            decorations = catalog.decorations.len(),
            charms = catalog.charms.len(),
            armour_pieces = catalog.armour.len(),
            weapons = catalog.weapons.len(),
            "catalog loaded from {}",
            dir.display()
        );
        Ok(Arc::new(catalog))
    }

    /// Load `dir` and return the tables together with every file's diagnostics,
    /// without rejecting errors.
    pub fn load_with_reports(dir: &Path) -> Result<(Catalog, Vec<FileReport>)> {
        let read = |name: &str| fs::read_to_string(dir.join(name));
        let skills = read(SKILLS_FILE)?;
        let decorations = read(DECORATIONS_FILE)?;
        let charms = read(CHARMS_FILE)?;
        let armour = read(ARMOUR_FILE)?;
        let weapons = read(WEAPONS_FILE)?;
        Self::parse_with_reports(&CatalogSources {
            skills: &skills,
            decorations: &decorations,
            charms: &charms,
            armour: &armour,
            weapons: &weapons,
        })
    }

    pub fn from_sources(sources: &CatalogSources<'_>) -> Result<Catalog> {
        let (catalog, reports) = Self::parse_with_reports(sources)?;
        Self::reject_errors(&reports)?;
        Ok(catalog)
    }

    pub fn parse_with_reports(sources: &CatalogSources<'_>) -> Result<(Catalog, Vec<FileReport>)> {
        let mut reports = Vec::with_capacity(5);
        let mut report_for = |file: &str, report: ValidationReport| {
            reports.push(FileReport {
                file: file.to_string(),
                report,
            })
        };

        let mut report = ValidationReport::default();
        let skills = skill_table_from_json(sources.skills, &mut report)?;
        report_for(SKILLS_FILE, report);

        let mut report = ValidationReport::default();
        let decorations = decoration_table_from_json(sources.decorations, &skills, &mut report)?;
        report_for(DECORATIONS_FILE, report);

        let mut report = ValidationReport::default();
        let charms = charm_table_from_json(sources.charms, &skills, &mut report)?;
        report_for(CHARMS_FILE, report);

        let mut report = ValidationReport::default();
        let armour = armour_table_from_json(sources.armour, &skills, &mut report)?;
        report_for(ARMOUR_FILE, report);

        let mut report = ValidationReport::default();
        let weapons = weapon_table_from_json(sources.weapons, &mut report)?;
        report_for(WEAPONS_FILE, report);

        let scoring = ScoringSkills::resolve(&skills);
        Ok((
            Catalog {
                skills,
                decorations,
                charms,
                armour,
                weapons,
                scoring,
            },
            reports,
        ))
    }

    fn reject_errors(reports: &[FileReport]) -> Result<()> {
        match reports.iter().find(|file| file.report.has_errors()) {
            Some(file) => Err(SearchError::Catalog {
                file: file.file.clone(),
                diagnostics: file.report.diagnostics.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// The catalog shipped in `data/`, embedded for unit tests.
#[cfg(test)]
pub(crate) fn shipped_catalog() -> Catalog {
    let sources = CatalogSources {
        skills: include_str!("../../data/skills.json"),
        decorations: include_str!("../../data/decorations.json"),
        charms: include_str!("../../data/charms.json"),
        armour: include_str!("../../data/armour.json"),
        weapons: include_str!("../../data/weapons.json"),
    };
    match Catalog::from_sources(&sources) {
        Ok(catalog) => catalog,
        Err(SearchError::Catalog { file, diagnostics }) => {
            panic!("shipped catalog {file} is invalid: {diagnostics:#?}")
        }
        Err(err) => panic!("shipped catalog failed to load: {err}"),
    }
}
