pub mod armour;
pub mod charm;
pub mod data_registry;
pub mod decoration;
pub mod search_params;
pub mod skill;
pub mod validate;
pub mod weapon;

pub use data_registry::{Catalog, CatalogSources};
pub use validate::{ValidationDiagnostic, ValidationReport, ValidationSeverity};
