//! Pure functions from equipment to the numbers the scoring function consumes.

pub mod armour;
pub mod decorations;
pub mod skills;
pub mod weapon_augments;
pub mod weapon_upgrades;
pub mod weapon_values;

pub use armour::{calculate_armour_contribution, ArmourContribution};
pub use decorations::{check_decorations_fit, decoration_skills, DecorationCounts};
pub use skills::{clip_levels, merge_levels, set_bonus_skills, ScoringSkills};
pub use weapon_augments::WeaponAugments;
pub use weapon_upgrades::WeaponUpgrades;
pub use weapon_values::{calculate_final_weapon_values, WeaponFinalValues};
