use crate::contrib::weapon_augments::WeaponAugments;
use crate::contrib::weapon_upgrades::WeaponUpgrades;
use crate::data::skill::{SetBonusId, SkillTable};
use crate::data::weapon::{SharpnessBar, Weapon, WeaponId};
use crate::error::Result;

/// A weapon's numbers after augments and upgrades are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponFinalValues {
    pub weapon: WeaponId,
    pub true_raw: f64,
    pub affinity: i32,
    pub slots: Vec<u8>,
    pub set_bonus: Option<SetBonusId>,
    pub is_raw: bool,
    /// `None` for weapons without a sharpness mechanic.
    pub maximum_sharpness: Option<SharpnessBar>,
    pub constant_sharpness: bool,
}

pub fn calculate_final_weapon_values(
    id: WeaponId,
    weapon: &Weapon,
    augments: &WeaponAugments,
    upgrades: &WeaponUpgrades,
    skills: &SkillTable,
) -> Result<WeaponFinalValues> {
    let a = augments.contribution();
    let u = upgrades.contribution(skills)?;

    let mut slots = weapon.slots.clone();
    if a.extra_slot_level > 0 {
        slots.push(a.extra_slot_level);
    }
    if u.extra_slot_level > 0 {
        slots.push(u.extra_slot_level);
    }

    let maximum_sharpness = if weapon.class.is_blademaster() {
        u.new_max_sharpness.or(weapon.maximum_sharpness)
    } else {
        None
    };

    Ok(WeaponFinalValues {
        weapon: id,
        true_raw: weapon.attack as f64 / weapon.class.bloat()
            + a.added_attack as f64
            + u.added_attack as f64,
        affinity: weapon.affinity as i32 + a.added_affinity + u.added_affinity,
        slots,
        set_bonus: u.set_bonus,
        is_raw: weapon.is_raw,
        maximum_sharpness,
        constant_sharpness: weapon.constant_sharpness,
    })
}
