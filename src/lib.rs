//! Build search for Monster Hunter World: Iceborne.
//!
//! Finds the equipment loadout with the highest effective raw (EFR) for a
//! weapon class and a set of required skills, by dominance-pruning the
//! equipment catalogs and running a branch-and-bound search over the rest.

pub mod build;
pub mod cli;
pub mod contrib;
pub mod data;
pub mod error;
pub mod optimizer;
pub mod parallel;
pub mod scoring;

pub use build::Build;
pub use data::data_registry::Catalog;
pub use error::{Result, SearchError};
