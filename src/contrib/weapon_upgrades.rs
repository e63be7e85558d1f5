//! Weapon upgrade trackers: Iceborne custom upgrades and Safi'jiiva awakenings.

use std::collections::HashSet;

use crate::data::skill::{SetBonusId, SkillTable};
use crate::data::weapon::{SharpnessBar, UpgradeScheme, Weapon};
use crate::error::{Result, SearchError};

pub const NO_WEAPON_UPGRADES: &str = "NoWeaponUpgrades";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IbcUpgradeType {
    Attack,
    Affinity,
}

impl IbcUpgradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "ATTACK",
            Self::Affinity => "AFFINITY",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Attack, Self::Affinity]
            .into_iter()
            .find(|u| u.as_str() == name)
    }
}

// Per upgrade position 1 to 6. The sixth position has no affinity option.
const IBC_ATTACK_VALUES: [u16; 6] = [1, 1, 1, 1, 1, 1];
const IBC_AFFINITY_VALUES: [Option<i32>; 6] = [Some(1), Some(1), Some(1), Some(1), Some(1), None];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafiUpgradeType {
    Attack,
    Affinity,
    Slot,
    Sharpness,
    TeostraEssence,
    TigrexEssence,
    VelkhanaEssence,
}

impl SafiUpgradeType {
    pub const ALL: [Self; 7] = [
        Self::Attack,
        Self::Affinity,
        Self::Slot,
        Self::Sharpness,
        Self::TeostraEssence,
        Self::TigrexEssence,
        Self::VelkhanaEssence,
    ];

    const REGULAR: [Self; 4] = [Self::Attack, Self::Affinity, Self::Sharpness, Self::Slot];
    const SET_BONUS: [Self; 3] = [Self::TeostraEssence, Self::TigrexEssence, Self::VelkhanaEssence];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "ATTACK",
            Self::Affinity => "AFFINITY",
            Self::Slot => "SLOT",
            Self::Sharpness => "SHARPNESS",
            Self::TeostraEssence => "TEOSTRA_ESSENCE",
            Self::TigrexEssence => "TIGREX_ESSENCE",
            Self::VelkhanaEssence => "VELKHANA_ESSENCE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == name)
    }

    /// Catalog id of the set bonus an essence awakening counts towards.
    pub fn set_bonus_id(&self) -> Option<&'static str> {
        match self {
            Self::TeostraEssence => Some("TEOSTRA_TECHNIQUE"),
            Self::TigrexEssence => Some("TIGREX_ESSENCE"),
            Self::VelkhanaEssence => Some("VELKHANA_DIVINITY"),
            _ => None,
        }
    }

    /// Value per level 1 to 6. Levels without a value cannot be selected.
    fn values(&self) -> [Option<u16>; 6] {
        match self {
            Self::Attack => [None, None, None, Some(7), Some(9), Some(14)],
            Self::Affinity => [None, None, None, Some(8), Some(10), Some(15)],
            Self::Slot => [None, None, Some(1), Some(2), Some(3), Some(4)],
            Self::Sharpness => [None, None, None, Some(40), Some(50), Some(70)],
            _ => [Some(0), None, None, None, None, None],
        }
    }

    fn value(&self, level: u8) -> Option<u16> {
        if (1..=6).contains(&level) {
            self.values()[level as usize - 1]
        } else {
            None
        }
    }
}

const SAFI_MAX_AWAKENINGS: usize = 5;
const SAFI_WHITE_MAX: u16 = 120;
const SAFI_BASE_SHARPNESS: SharpnessBar = [100, 50, 50, 50, 50, 90, 0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UpgradesContribution {
    pub added_attack: u16,
    pub added_affinity: i32,
    pub extra_slot_level: u8,
    pub new_max_sharpness: Option<SharpnessBar>,
    pub set_bonus: Option<SetBonusId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpgradeConfig {
    None,
    IceborneCommon(Vec<IbcUpgradeType>),
    Safi(Vec<(SafiUpgradeType, u8)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeaponUpgrades {
    None,
    IceborneCommon(Vec<IbcUpgradeType>),
    Safi(Vec<(SafiUpgradeType, u8)>),
}

fn ibc_is_valid(upgrades: &[IbcUpgradeType]) -> bool {
    upgrades.len() <= IBC_ATTACK_VALUES.len()
        && upgrades.iter().enumerate().all(|(i, upgrade)| match upgrade {
            IbcUpgradeType::Attack => true,
            IbcUpgradeType::Affinity => IBC_AFFINITY_VALUES[i].is_some(),
        })
}

fn safi_is_valid(config: &[(SafiUpgradeType, u8)]) -> bool {
    if config.len() > SAFI_MAX_AWAKENINGS {
        return false;
    }
    let mut has_slot = false;
    let mut has_set_bonus = false;
    let mut has_level_6 = false;
    for &(upgrade, level) in config {
        if upgrade.value(level).is_none() {
            return false;
        }
        if upgrade == SafiUpgradeType::Slot {
            if has_slot {
                return false;
            }
            has_slot = true;
        } else if upgrade.set_bonus_id().is_some() {
            if has_set_bonus {
                return false;
            }
            has_set_bonus = true;
        } else if level == 6 {
            if has_level_6 {
                return false;
            }
            has_level_6 = true;
        }
    }
    true
}

impl WeaponUpgrades {
    pub fn for_weapon(weapon: &Weapon) -> Self {
        match weapon.upgrade_scheme {
            UpgradeScheme::None => Self::None,
            UpgradeScheme::IceborneCommon => Self::IceborneCommon(Vec::new()),
            UpgradeScheme::SafiStandard => Self::Safi(Vec::new()),
        }
    }

    pub fn maximized_configs(&self) -> Vec<UpgradeConfig> {
        match self {
            Self::None => vec![UpgradeConfig::None],
            Self::IceborneCommon(_) => (0..=5)
                .map(|affinity| {
                    let mut config = vec![IbcUpgradeType::Affinity; affinity];
                    config.extend(std::iter::repeat(IbcUpgradeType::Attack).take(6 - affinity));
                    UpgradeConfig::IceborneCommon(config)
                })
                .collect(),
            Self::Safi(_) => {
                let level_6: Vec<_> = SafiUpgradeType::REGULAR.iter().map(|&u| (u, 6)).collect();
                let regular: Vec<_> = SafiUpgradeType::REGULAR.iter().map(|&u| (u, 5)).collect();
                let mut last = regular.clone();
                last.extend(SafiUpgradeType::SET_BONUS.iter().map(|&u| (u, 1)));

                let mut configs = Vec::new();
                for &a in &level_6 {
                    for &b in &regular {
                        for &c in &regular {
                            for &d in &regular {
                                for &e in &last {
                                    let config = vec![a, b, c, d, e];
                                    if safi_is_valid(&config) {
                                        configs.push(UpgradeConfig::Safi(config));
                                    }
                                }
                            }
                        }
                    }
                }
                configs
            }
        }
    }

    /// Trackers for every maximized configuration, keeping one per distinct
    /// contribution.
    pub fn maximized_trackers_pruned(weapon: &Weapon, skills: &SkillTable) -> Result<Vec<Self>> {
        let base = Self::for_weapon(weapon);
        let mut seen = HashSet::new();
        let mut trackers = Vec::new();
        for config in base.maximized_configs() {
            let mut tracker = base.clone();
            tracker.update_with_config(config)?;
            if seen.insert(tracker.contribution(skills)?) {
                trackers.push(tracker);
            }
        }
        Ok(trackers)
    }

    pub fn config(&self) -> UpgradeConfig {
        match self {
            Self::None => UpgradeConfig::None,
            Self::IceborneCommon(upgrades) => UpgradeConfig::IceborneCommon(upgrades.clone()),
            Self::Safi(config) => UpgradeConfig::Safi(config.clone()),
        }
    }

    pub fn update_with_config(&mut self, config: UpgradeConfig) -> Result<()> {
        match (self, config) {
            (Self::None, UpgradeConfig::None) => Ok(()),
            (Self::IceborneCommon(current), UpgradeConfig::IceborneCommon(upgrades)) => {
                if !ibc_is_valid(&upgrades) {
                    return Err(SearchError::InvalidTrackerConfig(format!(
                        "invalid custom upgrade sequence of length {}",
                        upgrades.len()
                    )));
                }
                *current = upgrades;
                Ok(())
            }
            (Self::Safi(current), UpgradeConfig::Safi(awakenings)) => {
                if !safi_is_valid(&awakenings) {
                    return Err(SearchError::InvalidTrackerConfig(
                        "invalid Safi'jiiva awakening configuration".to_string(),
                    ));
                }
                *current = awakenings;
                Ok(())
            }
            (_, config) => Err(SearchError::TrackerMismatch(format!(
                "upgrade config {config:?} does not fit this weapon's upgrade scheme"
            ))),
        }
    }

    pub fn serialized_config(&self) -> Result<String> {
        match self {
            Self::None => Ok(NO_WEAPON_UPGRADES.to_string()),
            Self::IceborneCommon(upgrades) => {
                let names: Vec<&str> = upgrades.iter().map(IbcUpgradeType::as_str).collect();
                Ok(serde_json::to_string(&names)?)
            }
            Self::Safi(config) => {
                let pairs: Vec<(&str, u8)> = config.iter().map(|(u, l)| (u.as_str(), *l)).collect();
                Ok(serde_json::to_string(&pairs)?)
            }
        }
    }

    pub fn update_with_serialized_config(&mut self, serialized: &str) -> Result<()> {
        let config = match self {
            Self::None if serialized == NO_WEAPON_UPGRADES => UpgradeConfig::None,
            Self::None => {
                return Err(SearchError::TrackerMismatch(format!(
                    "expected '{NO_WEAPON_UPGRADES}', got '{serialized}'"
                )))
            }
            Self::IceborneCommon(_) => {
                let names: Vec<String> = serde_json::from_str(serialized)?;
                let upgrades = names
                    .iter()
                    .map(|name| {
                        IbcUpgradeType::from_name(name).ok_or_else(|| {
                            SearchError::InvalidTrackerConfig(format!("unknown upgrade '{name}'"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                UpgradeConfig::IceborneCommon(upgrades)
            }
            Self::Safi(_) => {
                let pairs: Vec<(String, u8)> = serde_json::from_str(serialized)?;
                let awakenings = pairs
                    .iter()
                    .map(|(name, level)| {
                        SafiUpgradeType::from_name(name)
                            .map(|u| (u, *level))
                            .ok_or_else(|| {
                                SearchError::InvalidTrackerConfig(format!(
                                    "unknown awakening '{name}'"
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                UpgradeConfig::Safi(awakenings)
            }
        };
        self.update_with_config(config)
    }

    pub fn contribution(&self, skills: &SkillTable) -> Result<UpgradesContribution> {
        match self {
            Self::None => Ok(UpgradesContribution::default()),
            Self::IceborneCommon(upgrades) => {
                let mut contribution = UpgradesContribution::default();
                for (i, upgrade) in upgrades.iter().enumerate() {
                    match upgrade {
                        IbcUpgradeType::Attack => contribution.added_attack += IBC_ATTACK_VALUES[i],
                        IbcUpgradeType::Affinity => {
                            contribution.added_affinity += IBC_AFFINITY_VALUES[i].unwrap_or(0)
                        }
                    }
                }
                Ok(contribution)
            }
            Self::Safi(config) => {
                let mut contribution = UpgradesContribution::default();
                let mut added_sharpness = 0u16;
                for &(upgrade, level) in config {
                    let value = upgrade.value(level).unwrap_or(0);
                    match upgrade {
                        SafiUpgradeType::Attack => contribution.added_attack += value,
                        SafiUpgradeType::Affinity => contribution.added_affinity += value as i32,
                        SafiUpgradeType::Slot => contribution.extra_slot_level += value as u8,
                        SafiUpgradeType::Sharpness => added_sharpness += value,
                        essence => {
                            if let Some(id) = essence.set_bonus_id() {
                                contribution.set_bonus = Some(skills.resolve_set_bonus(id)?);
                            }
                        }
                    }
                }
                let mut bar = SAFI_BASE_SHARPNESS;
                let white = bar[5] + added_sharpness;
                bar[5] = white.min(SAFI_WHITE_MAX);
                bar[6] = white.saturating_sub(SAFI_WHITE_MAX);
                contribution.new_max_sharpness = Some(bar);
                Ok(contribution)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::None => "(no upgrades)".to_string(),
            Self::IceborneCommon(upgrades) => upgrades
                .iter()
                .map(IbcUpgradeType::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Self::Safi(config) => config
                .iter()
                .map(|(u, l)| format!("{}_{l}", u.as_str()))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}
