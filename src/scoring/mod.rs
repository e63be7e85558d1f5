pub mod efr;
pub mod sharpness;
pub mod states;

pub use efr::{calculate_efr, lookup_from_skills, EfrInputs, LookupValues};
pub use sharpness::{actual_sharpness_level_values, raw_sharpness_modifier};
pub use states::{best_case_efr, enumerate_state_assignments, lookup_all_states, StateBranch};
