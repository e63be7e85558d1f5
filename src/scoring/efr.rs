use crate::contrib::skills::{
    calculate_skills_contribution, clip_levels, HANDICRAFT_MAX_LEVEL,
};
use crate::contrib::weapon_values::WeaponFinalValues;
use crate::data::data_registry::Catalog;
use crate::data::skill::{SkillLevels, SkillStates};
use crate::data::weapon::SharpnessBar;
use crate::error::Result;
use crate::scoring::sharpness::{actual_sharpness_level_values, RAW_SHARPNESS_MODIFIERS};

pub const POWERCHARM_ATTACK_POWER: u16 = 6;
pub const POWERTALON_ATTACK_POWER: u16 = 9;

pub const RAW_BLUNDER_MULTIPLIER: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfrInputs {
    pub weapon_true_raw: f64,
    pub weapon_affinity: i32,
    pub weapon_raw_multiplier: f64,
    pub added_raw: u16,
    pub added_affinity: i32,
    pub raw_sharpness_modifier: f64,
    pub raw_crit_multiplier: f64,
}

/// Expected raw per hit. The multiplied weapon raw is rounded half to even
/// before flat bonuses are added; nothing else is rounded.
pub fn calculate_efr(inputs: &EfrInputs) -> f64 {
    let crit_chance = (inputs.weapon_affinity + inputs.added_affinity).min(100) as f64 / 100.0;
    let crit_modifier = if crit_chance < 0.0 {
        let blunder_chance = -crit_chance;
        RAW_BLUNDER_MULTIPLIER * blunder_chance + (1.0 - blunder_chance)
    } else {
        inputs.raw_crit_multiplier * crit_chance + (1.0 - crit_chance)
    };

    let weapon_new_raw = inputs.weapon_true_raw * inputs.weapon_raw_multiplier;
    let true_raw = weapon_new_raw.round_ties_even() + inputs.added_raw as f64;

    true_raw * inputs.raw_sharpness_modifier * crit_modifier
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupValues {
    pub efr: f64,
    pub affinity: i32,
    /// Sharpness after Handicraft, or `None` for weapons without sharpness.
    pub sharpness_values: Option<SharpnessBar>,
    /// The clipped skills the score was computed from.
    pub skills: SkillLevels,
}

/// Scores a weapon configuration with the given skills. Every active stateful
/// skill must have a state in `states`.
pub fn lookup_from_skills(
    weapon: &WeaponFinalValues,
    skills: &SkillLevels,
    states: &SkillStates,
    catalog: &Catalog,
) -> Result<LookupValues> {
    let skills = clip_levels(skills, &catalog.skills);
    let from_skills = calculate_skills_contribution(
        &skills,
        states,
        weapon.is_raw,
        &catalog.skills,
        &catalog.scoring,
    )?;

    let handicraft_level = if weapon.constant_sharpness {
        HANDICRAFT_MAX_LEVEL
    } else {
        from_skills.handicraft_level
    };
    let (sharpness_values, raw_sharpness_modifier) = match &weapon.maximum_sharpness {
        Some(bar) => {
            let (values, highest) = actual_sharpness_level_values(bar, handicraft_level);
            (Some(values), RAW_SHARPNESS_MODIFIERS[highest])
        }
        None => (None, 1.0),
    };

    let inputs = EfrInputs {
        weapon_true_raw: weapon.true_raw,
        weapon_affinity: weapon.affinity,
        weapon_raw_multiplier: from_skills.weapon_raw_multiplier,
        added_raw: from_skills.added_attack + POWERCHARM_ATTACK_POWER + POWERTALON_ATTACK_POWER,
        added_affinity: from_skills.added_affinity,
        raw_sharpness_modifier,
        raw_crit_multiplier: from_skills.raw_crit_multiplier,
    };

    Ok(LookupValues {
        efr: calculate_efr(&inputs),
        affinity: inputs.weapon_affinity + inputs.added_affinity,
        sharpness_values,
        skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> EfrInputs {
        EfrInputs {
            weapon_true_raw: 270.0,
            weapon_affinity: 15,
            weapon_raw_multiplier: 1.0,
            added_raw: 15,
            added_affinity: 0,
            raw_sharpness_modifier: 1.39,
            raw_crit_multiplier: 1.25,
        }
    }

    #[test]
    fn positive_affinity_scales_with_crit_multiplier() {
        let efr = calculate_efr(&inputs());
        assert!((efr - 411.01).abs() < 0.01, "{efr}");
    }

    #[test]
    fn negative_affinity_blunders() {
        let efr = calculate_efr(&EfrInputs {
            weapon_affinity: -20,
            ..inputs()
        });
        let expected = 285.0 * 1.39 * (0.75 * 0.2 + 0.8);
        assert!((efr - expected).abs() < 1e-9);
    }

    #[test]
    fn affinity_caps_at_one_hundred() {
        let capped = calculate_efr(&EfrInputs {
            added_affinity: 85,
            ..inputs()
        });
        let over = calculate_efr(&EfrInputs {
            added_affinity: 140,
            ..inputs()
        });
        assert_eq!(capped, over);
    }

    #[test]
    fn raw_rounds_half_to_even() {
        // 270 * 1.05 = 283.5 rounds to 284; 275 * 1.05 = 288.75 rounds to 289.
        let a = calculate_efr(&EfrInputs {
            weapon_raw_multiplier: 1.05,
            weapon_affinity: 0,
            raw_sharpness_modifier: 1.0,
            ..inputs()
        });
        assert_eq!(a, 284.0 + 15.0);

        let b = calculate_efr(&EfrInputs {
            weapon_true_raw: 272.5,
            weapon_raw_multiplier: 1.0,
            weapon_affinity: 0,
            raw_sharpness_modifier: 1.0,
            ..inputs()
        });
        assert_eq!(b, 272.0 + 15.0);
    }
}
