//! Weapon augmentation trackers.
//!
//! A tracker holds the augment configuration of one weapon, keeps it within
//! the weapon's augment capacity, and serializes it for saved builds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::weapon::{AugmentationScheme, Weapon};
use crate::error::{Result, SearchError};

pub const NO_WEAPON_AUGMENTS: &str = "NoWeaponAugments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IbAugmentType {
    AttackIncrease,
    AffinityIncrease,
    SlotUpgrade,
    HealthRegen,
}

impl IbAugmentType {
    pub const ALL: [Self; 4] = [
        Self::AttackIncrease,
        Self::AffinityIncrease,
        Self::SlotUpgrade,
        Self::HealthRegen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttackIncrease => "ATTACK_INCREASE",
            Self::AffinityIncrease => "AFFINITY_INCREASE",
            Self::SlotUpgrade => "SLOT_UPGRADE",
            Self::HealthRegen => "HEALTH_REGEN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Augment slots used by levels 1 to 4.
    fn slot_consumption(&self) -> [u8; 4] {
        match self {
            Self::AttackIncrease => [3, 2, 2, 2],
            Self::AffinityIncrease => [2, 2, 2, 2],
            Self::SlotUpgrade => [3, 3, 1, 1],
            Self::HealthRegen => [3, 2, 2, 2],
        }
    }

    fn cumulative_consumption(&self, level: u8) -> u8 {
        self.slot_consumption()[..level as usize].iter().sum()
    }
}

const IB_AUGMENT_MAX_LEVEL: u8 = 4;
const IB_MAX_SLOT_LEVEL: u8 = 3;

const IB_ATTACK_AUGMENT_CUMULATIVE: [u16; 5] = [0, 5, 10, 15, 20];
const IB_AFFINITY_AUGMENT_CUMULATIVE: [i32; 5] = [0, 10, 15, 20, 25];

/// Augment slot capacity by rarity, per augmentation slot level 0 to 3.
fn ib_augmentation_slots(rarity: u8) -> Option<[u8; 4]> {
    match rarity {
        10 => Some([5, 7, 9, 10]),
        11 => Some([4, 5, 6, 8]),
        12 => Some([3, 4, 5, 6]),
        _ => None,
    }
}

pub type AugmentConfig = Vec<(IbAugmentType, u8)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AugmentsContribution {
    pub added_attack: u16,
    pub added_affinity: i32,
    pub extra_slot_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IbAugments {
    rarity: u8,
    aug_level: u8,
    augments: BTreeMap<IbAugmentType, u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeaponAugments {
    None,
    Iceborne(IbAugments),
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedIbAugments {
    rarity: u8,
    aug_level: u8,
    augments: BTreeMap<String, u8>,
}

impl IbAugments {
    fn new(rarity: u8) -> Result<Self> {
        if ib_augmentation_slots(rarity).is_none() {
            return Err(SearchError::InvalidTrackerConfig(format!(
                "no Iceborne augmentation slots for rarity {rarity}"
            )));
        }
        Ok(Self {
            rarity,
            aug_level: IB_MAX_SLOT_LEVEL,
            augments: BTreeMap::new(),
        })
    }

    fn capacity(&self) -> u8 {
        ib_augmentation_slots(self.rarity).map_or(0, |slots| slots[self.aug_level as usize])
    }

    fn used(config: &[(IbAugmentType, u8)]) -> u32 {
        config
            .iter()
            .map(|(aug, level)| aug.cumulative_consumption(*level) as u32)
            .sum()
    }

    fn fits(&self, config: &[(IbAugmentType, u8)]) -> bool {
        Self::used(config) <= self.capacity() as u32
    }
}

impl WeaponAugments {
    pub fn for_weapon(weapon: &Weapon) -> Result<Self> {
        match weapon.augmentation_scheme {
            AugmentationScheme::None => Ok(Self::None),
            AugmentationScheme::Iceborne => Ok(Self::Iceborne(IbAugments::new(weapon.rarity)?)),
        }
    }

    /// One tracker per maximized configuration.
    pub fn maximized_trackers(weapon: &Weapon, health_regen_minimum: u8) -> Result<Vec<Self>> {
        let base = Self::for_weapon(weapon)?;
        let mut trackers = Vec::new();
        for config in base.maximized_configs(health_regen_minimum) {
            let mut tracker = base.clone();
            tracker.update_with_config(&config)?;
            trackers.push(tracker);
        }
        Ok(trackers)
    }

    /// Configurations worth searching: every combination of the EFR-relevant
    /// augments that fits, with health regen pinned at the required minimum.
    pub fn maximized_configs(&self, health_regen_minimum: u8) -> Vec<AugmentConfig> {
        match self {
            Self::None if health_regen_minimum == 0 => vec![Vec::new()],
            Self::None => Vec::new(),
            Self::Iceborne(state) => {
                let mut configs = Vec::new();
                for attack in 0..=IB_AUGMENT_MAX_LEVEL {
                    for affinity in 0..=IB_AUGMENT_MAX_LEVEL {
                        for slot in 0..=IB_AUGMENT_MAX_LEVEL {
                            let mut config: AugmentConfig = [
                                (IbAugmentType::AttackIncrease, attack),
                                (IbAugmentType::AffinityIncrease, affinity),
                                (IbAugmentType::SlotUpgrade, slot),
                            ]
                            .into_iter()
                            .filter(|&(_, level)| level > 0)
                            .collect();
                            if health_regen_minimum > 0 {
                                config.push((IbAugmentType::HealthRegen, health_regen_minimum));
                            }
                            if state.fits(&config) {
                                configs.push(config);
                            }
                        }
                    }
                }
                configs
            }
        }
    }

    pub fn config(&self) -> AugmentConfig {
        match self {
            Self::None => Vec::new(),
            Self::Iceborne(state) => state.augments.iter().map(|(&a, &l)| (a, l)).collect(),
        }
    }

    pub fn update_with_config(&mut self, config: &[(IbAugmentType, u8)]) -> Result<()> {
        match self {
            Self::None if config.is_empty() => Ok(()),
            Self::None => Err(SearchError::InvalidTrackerConfig(
                "weapon has no augmentation scheme".to_string(),
            )),
            Self::Iceborne(state) => {
                let mut augments = BTreeMap::new();
                for &(aug, level) in config {
                    if level > IB_AUGMENT_MAX_LEVEL {
                        return Err(SearchError::InvalidTrackerConfig(format!(
                            "{} level {level} is above {IB_AUGMENT_MAX_LEVEL}",
                            aug.as_str()
                        )));
                    }
                    if augments.insert(aug, level).is_some() {
                        return Err(SearchError::InvalidTrackerConfig(format!(
                            "{} listed twice",
                            aug.as_str()
                        )));
                    }
                }
                if !state.fits(config) {
                    return Err(SearchError::InvalidTrackerConfig(format!(
                        "augments use {} slots, capacity is {}",
                        IbAugments::used(config),
                        state.capacity()
                    )));
                }
                augments.retain(|_, level| *level > 0);
                state.augments = augments;
                Ok(())
            }
        }
    }

    pub fn serialized_config(&self) -> Result<String> {
        match self {
            Self::None => Ok(NO_WEAPON_AUGMENTS.to_string()),
            Self::Iceborne(state) => {
                let data = SerializedIbAugments {
                    rarity: state.rarity,
                    aug_level: state.aug_level,
                    augments: state
                        .augments
                        .iter()
                        .map(|(aug, &level)| (aug.as_str().to_string(), level))
                        .collect(),
                };
                Ok(serde_json::to_string(&data)?)
            }
        }
    }

    pub fn update_with_serialized_config(&mut self, serialized: &str) -> Result<()> {
        match self {
            Self::None if serialized == NO_WEAPON_AUGMENTS => Ok(()),
            Self::None => Err(SearchError::TrackerMismatch(format!(
                "expected '{NO_WEAPON_AUGMENTS}', got '{serialized}'"
            ))),
            Self::Iceborne(state) => {
                let data: SerializedIbAugments = serde_json::from_str(serialized)?;
                if data.rarity != state.rarity || data.aug_level != state.aug_level {
                    return Err(SearchError::TrackerMismatch(format!(
                        "augments are for rarity {} level {}, weapon is rarity {} level {}",
                        data.rarity, data.aug_level, state.rarity, state.aug_level
                    )));
                }
                let mut config = Vec::with_capacity(data.augments.len());
                for (name, level) in data.augments {
                    let aug = IbAugmentType::from_name(&name).ok_or_else(|| {
                        SearchError::InvalidTrackerConfig(format!("unknown augment '{name}'"))
                    })?;
                    config.push((aug, level));
                }
                self.update_with_config(&config)
            }
        }
    }

    pub fn contribution(&self) -> AugmentsContribution {
        match self {
            Self::None => AugmentsContribution::default(),
            Self::Iceborne(state) => {
                let level = |aug: IbAugmentType| state.augments.get(&aug).copied().unwrap_or(0) as usize;
                AugmentsContribution {
                    added_attack: IB_ATTACK_AUGMENT_CUMULATIVE[level(IbAugmentType::AttackIncrease)],
                    added_affinity: IB_AFFINITY_AUGMENT_CUMULATIVE
                        [level(IbAugmentType::AffinityIncrease)],
                    extra_slot_level: level(IbAugmentType::SlotUpgrade) as u8,
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::None => "(no augments)".to_string(),
            Self::Iceborne(state) => {
                let augments: Vec<String> = state
                    .augments
                    .iter()
                    .map(|(aug, level)| format!("{}_{level}", aug.as_str()))
                    .collect();
                format!("[Augmentation Level: {}] {}", state.aug_level, augments.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iceborne(rarity: u8) -> WeaponAugments {
        WeaponAugments::Iceborne(IbAugments::new(rarity).unwrap())
    }

    #[test]
    fn maximized_configs_respect_capacity() {
        let tracker = iceborne(12);
        let configs = tracker.maximized_configs(0);
        assert!(configs.contains(&Vec::new()));
        assert!(configs.contains(&vec![
            (IbAugmentType::AttackIncrease, 1),
            (IbAugmentType::AffinityIncrease, 1)
        ]));
        // Attack 2 uses 5 slots, affinity 1 another 2, over the 6 available.
        assert!(!configs.contains(&vec![
            (IbAugmentType::AttackIncrease, 2),
            (IbAugmentType::AffinityIncrease, 1)
        ]));
        assert!(configs.iter().all(|c| IbAugments::used(c) <= 6));
    }

    #[test]
    fn health_regen_minimum_is_pinned() {
        let configs = iceborne(10).maximized_configs(1);
        assert!(!configs.is_empty());
        assert!(configs
            .iter()
            .all(|c| c.contains(&(IbAugmentType::HealthRegen, 1))));
        assert!(WeaponAugments::None.maximized_configs(1).is_empty());
    }

    #[test]
    fn over_capacity_config_is_rejected() {
        let mut tracker = iceborne(12);
        let err = tracker
            .update_with_config(&[(IbAugmentType::AttackIncrease, 4)])
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidTrackerConfig(_)));
        assert_eq!(tracker.config(), Vec::new());
    }

    #[test]
    fn serialization_checks_weapon_identity() {
        let mut tracker = iceborne(12);
        tracker
            .update_with_config(&[(IbAugmentType::AffinityIncrease, 2)])
            .unwrap();
        let serialized = tracker.serialized_config().unwrap();
        assert_eq!(
            serialized,
            r#"{"rarity":12,"aug_level":3,"augments":{"AFFINITY_INCREASE":2}}"#
        );

        let mut other = iceborne(12);
        other.update_with_serialized_config(&serialized).unwrap();
        assert_eq!(other, tracker);
        assert_eq!(other.contribution().added_affinity, 15);

        let mut wrong = iceborne(11);
        assert!(matches!(
            wrong.update_with_serialized_config(&serialized),
            Err(SearchError::TrackerMismatch(_))
        ));
        assert!(WeaponAugments::None
            .clone()
            .update_with_serialized_config(&serialized)
            .is_err());
    }
}
