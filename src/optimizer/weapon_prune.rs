//! Weapon configurations (weapon, augments, upgrades) and their pruning.

use tracing::debug;

use crate::contrib::weapon_augments::WeaponAugments;
use crate::contrib::weapon_upgrades::WeaponUpgrades;
use crate::contrib::weapon_values::{calculate_final_weapon_values, WeaponFinalValues};
use crate::data::data_registry::Catalog;
use crate::data::weapon::{WeaponClass, WeaponId};
use crate::error::Result;
use crate::optimizer::prune::{percent_kept, prune_by_supersedes};

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponConfig {
    pub weapon: WeaponId,
    pub augments: WeaponAugments,
    pub upgrades: WeaponUpgrades,
    pub values: WeaponFinalValues,
}

fn sorted_slots(slots: &[u8], len: usize) -> Vec<u8> {
    let mut sorted = slots.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.resize(len, 0);
    sorted
}

pub fn weapon_values_supersede(w1: &WeaponFinalValues, w2: &WeaponFinalValues) -> Option<bool> {
    let len = w1.slots.len().max(w2.slots.len());
    let slots1 = sorted_slots(&w1.slots, len);
    let slots2 = sorted_slots(&w2.slots, len);
    let no_bar = [0u16; 7];
    let bar1 = w1.maximum_sharpness.as_ref().unwrap_or(&no_bar);
    let bar2 = w2.maximum_sharpness.as_ref().unwrap_or(&no_bar);

    if w1.true_raw < w2.true_raw
        || w1.affinity < w2.affinity
        || slots1.iter().zip(&slots2).any(|(a, b)| a < b)
        || (w2.set_bonus.is_some() && w1.set_bonus != w2.set_bonus)
        || w1.is_raw != w2.is_raw
        || (w2.constant_sharpness && !w1.constant_sharpness)
        || bar1.iter().zip(bar2).any(|(a, b)| a < b)
    {
        return Some(false);
    }

    if w1.true_raw > w2.true_raw
        || w1.affinity > w2.affinity
        || slots1.iter().zip(&slots2).any(|(a, b)| a > b)
        || w1.set_bonus != w2.set_bonus
        || (w1.constant_sharpness && !w2.constant_sharpness)
        || bar1.iter().zip(bar2).any(|(a, b)| a > b)
    {
        return Some(true);
    }
    None
}

/// Every weapon of `class` crossed with its maximized augment and upgrade
/// configurations, pruned by dominance over their final values.
pub fn pruned_weapon_configs(
    class: WeaponClass,
    health_regen_minimum: u8,
    catalog: &Catalog,
) -> Result<Vec<WeaponConfig>> {
    let mut configs = Vec::new();
    for id in catalog.weapons.of_class(class) {
        let weapon = catalog.weapons.weapon(id);
        let augment_trackers = WeaponAugments::maximized_trackers(weapon, health_regen_minimum)?;
        let upgrade_trackers = WeaponUpgrades::maximized_trackers_pruned(weapon, &catalog.skills)?;
        for augments in &augment_trackers {
            for upgrades in &upgrade_trackers {
                let values =
                    calculate_final_weapon_values(id, weapon, augments, upgrades, &catalog.skills)?;
                configs.push(WeaponConfig {
                    weapon: id,
                    augments: augments.clone(),
                    upgrades: upgrades.clone(),
                    values,
                });
            }
        }
    }
    let before = configs.len();
    let pruned = prune_by_supersedes(configs, |l, r| weapon_values_supersede(&l.values, &r.values));
    debug!(
        "weapon configuration pruning: {before} --> {} ({:.2}% kept)",
        pruned.len(),
        percent_kept(before, pruned.len())
    );
    Ok(pruned)
}
