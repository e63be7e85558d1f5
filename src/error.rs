use thiserror::Error;

use crate::data::validate::ValidationDiagnostic;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{file}: catalog validation failed with {} diagnostic(s)", .diagnostics.len())]
    Catalog {
        file: String,
        diagnostics: Vec<ValidationDiagnostic>,
    },

    #[error("unknown {kind} '{id}'")]
    UnknownId { kind: &'static str, id: String },

    #[error("invalid tracker configuration: {0}")]
    InvalidTrackerConfig(String),

    #[error("serialized configuration does not match this weapon: {0}")]
    TrackerMismatch(String),

    #[error("At least {deficit} more slots of at least size {size} required.")]
    DecorationFit { deficit: u32, size: u8 },

    #[error("skill '{0}' has no states")]
    StatelessSkill(String),

    #[error("skill '{0}' is active but has no state assigned")]
    MissingSkillState(String),

    #[error("no state assignment could be scored")]
    NoStateBranch,

    #[error("state {state} is out of range for skill '{skill}' ({count} states)")]
    InvalidSkillState { skill: String, state: u8, count: usize },

    #[error("skill '{0}' is granted both as a regular skill and as a set bonus skill")]
    SkillCollision(String),

    #[error("invalid search parameters: {0}")]
    InvalidParameters(String),

    #[error("worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownId {
            kind,
            id: id.into(),
        }
    }
}
