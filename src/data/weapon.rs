use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::validate::{check_non_empty, check_range, UniqueSet, ValidationReport};
use crate::error::{Result, SearchError};

/// Sharpness bands from red to purple.
pub type SharpnessBar = [u16; 7];

pub const SHARPNESS_LEVEL_NAMES: [&str; 7] =
    ["Red", "Orange", "Yellow", "Green", "Blue", "White", "Purple"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponClass {
    Greatsword,
    Longsword,
    SwordAndShield,
    DualBlades,
    Hammer,
    HuntingHorn,
    Lance,
    Gunlance,
    Switchaxe,
    ChargeBlade,
    InsectGlaive,
    Bow,
    HeavyBowgun,
    LightBowgun,
}

impl WeaponClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Greatsword => "Greatsword",
            Self::Longsword => "Longsword",
            Self::SwordAndShield => "Sword and Shield",
            Self::DualBlades => "Dual Blades",
            Self::Hammer => "Hammer",
            Self::HuntingHorn => "Hunting Horn",
            Self::Lance => "Lance",
            Self::Gunlance => "Gunlance",
            Self::Switchaxe => "Switchaxe",
            Self::ChargeBlade => "Charge Blade",
            Self::InsectGlaive => "Insect Glaive",
            Self::Bow => "Bow",
            Self::HeavyBowgun => "Heavy Bowgun",
            Self::LightBowgun => "Light Bowgun",
        }
    }

    /// Divisor from displayed attack to true raw.
    pub fn bloat(&self) -> f64 {
        match self {
            Self::Greatsword => 4.8,
            Self::Longsword => 3.3,
            Self::SwordAndShield | Self::DualBlades => 1.4,
            Self::Hammer => 5.2,
            Self::HuntingHorn => 4.2,
            Self::Lance | Self::Gunlance => 2.3,
            Self::Switchaxe => 3.5,
            Self::ChargeBlade => 3.6,
            Self::InsectGlaive => 4.1,
            Self::Bow => 1.2,
            Self::HeavyBowgun => 1.5,
            Self::LightBowgun => 1.3,
        }
    }

    pub fn is_blademaster(&self) -> bool {
        !matches!(self, Self::Bow | Self::HeavyBowgun | Self::LightBowgun)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AugmentationScheme {
    #[default]
    None,
    Iceborne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeScheme {
    #[default]
    None,
    IceborneCommon,
    SafiStandard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeaponId(pub(crate) u16);

impl WeaponId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub class: WeaponClass,
    pub rarity: u8,
    pub attack: u16,
    pub affinity: i16,
    pub slots: Vec<u8>,
    pub is_raw: bool,
    /// Present for blademaster classes only.
    pub maximum_sharpness: Option<SharpnessBar>,
    pub constant_sharpness: bool,
    pub augmentation_scheme: AugmentationScheme,
    pub upgrade_scheme: UpgradeScheme,
}

#[derive(Debug, Clone, Default)]
pub struct WeaponTable {
    weapons: Vec<Weapon>,
    by_id: HashMap<String, WeaponId>,
}

impl WeaponTable {
    pub fn weapon(&self, id: WeaponId) -> &Weapon {
        &self.weapons[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = WeaponId> + '_ {
        (0..self.weapons.len()).map(|i| WeaponId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<WeaponId> {
        self.by_id.get(id).copied()
    }

    pub fn resolve(&self, id: &str) -> Result<WeaponId> {
        self.find(id).ok_or_else(|| SearchError::unknown("weapon", id))
    }

    pub fn of_class(&self, class: WeaponClass) -> Vec<WeaponId> {
        self.ids()
            .filter(|&id| self.weapon(id).class == class)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct WeaponRecord {
    name: String,
    class: WeaponClass,
    rarity: i64,
    attack: i64,
    #[serde(default)]
    affinity: i64,
    #[serde(default)]
    slots: Vec<i64>,
    #[serde(default = "default_is_raw")]
    is_raw: bool,
    #[serde(default)]
    maximum_sharpness: Option<Vec<i64>>,
    #[serde(default)]
    constant_sharpness: bool,
    #[serde(default)]
    augmentation_scheme: AugmentationScheme,
    #[serde(default)]
    upgrade_scheme: UpgradeScheme,
}

fn default_is_raw() -> bool {
    true
}

pub fn weapon_table_from_json(raw: &str, report: &mut ValidationReport) -> Result<WeaponTable> {
    let records: BTreeMap<String, WeaponRecord> = serde_json::from_str(raw)?;
    let mut table = WeaponTable::default();
    let mut names = UniqueSet::new("weapon name");

    for (id, record) in records {
        let context = format!("weapon '{id}'");
        let mut ok = check_non_empty(report, &context, "name", &record.name);
        ok &= names.check(report, &context, record.name.clone());
        ok &= check_range(report, &context, "rarity", record.rarity, 1, 12);
        ok &= check_range(report, &context, "attack", record.attack, 1, u16::MAX as i64);
        ok &= check_range(report, &context, "affinity", record.affinity, -100, 100);
        if record.slots.len() > 2 || record.slots.iter().any(|&s| !(1..=4).contains(&s)) {
            report.error(&context, "expecting up to two slot sizes in 1..=4");
            ok = false;
        }

        let sharpness = match (&record.maximum_sharpness, record.class.is_blademaster()) {
            (Some(bar), true) => {
                let bands: Option<SharpnessBar> = <[i64; 7]>::try_from(bar.as_slice())
                    .ok()
                    .filter(|bands| bands.iter().all(|&b| (0..=u16::MAX as i64).contains(&b)))
                    .map(|bands| bands.map(|b| b as u16));
                if bands.is_none() {
                    report.error(&context, "maximum_sharpness needs 7 non-negative bands");
                    ok = false;
                }
                bands
            }
            (None, true) => {
                report.error(&context, "blademaster weapons need maximum_sharpness");
                ok = false;
                None
            }
            (Some(_), false) => {
                report.warning(&context, "ranged weapon lists a sharpness bar; ignored");
                None
            }
            (None, false) => None,
        };
        if record.augmentation_scheme == AugmentationScheme::Iceborne
            && !(10..=12).contains(&record.rarity)
        {
            report.error(&context, "Iceborne augmentation needs rarity 10 to 12");
            ok = false;
        }
        if !ok {
            continue;
        }

        let handle = WeaponId(table.weapons.len() as u16);
        table.by_id.insert(id.clone(), handle);
        table.weapons.push(Weapon {
            id,
            name: record.name,
            class: record.class,
            rarity: record.rarity as u8,
            attack: record.attack as u16,
            affinity: record.affinity as i16,
            slots: record.slots.into_iter().map(|s| s as u8).collect(),
            is_raw: record.is_raw,
            maximum_sharpness: sharpness,
            constant_sharpness: record.constant_sharpness,
            augmentation_scheme: record.augmentation_scheme,
            upgrade_scheme: record.upgrade_scheme,
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blademaster_and_ranged_weapons() {
        let raw = r#"{
            "ACID_SHREDDER_II": {
                "name": "Acid Shredder II", "class": "GREATSWORD", "rarity": 10,
                "attack": 1392, "affinity": 0, "slots": [1],
                "maximum_sharpness": [60, 60, 60, 50, 100, 20, 10]
            },
            "SAFI_BOW": {
                "name": "Safi's Shatterbow", "class": "BOW", "rarity": 12,
                "attack": 348, "affinity": 0, "is_raw": false,
                "upgrade_scheme": "SAFI_STANDARD"
            }
        }"#;
        let mut report = ValidationReport::default();
        let table = weapon_table_from_json(raw, &mut report).unwrap();
        assert!(!report.has_errors(), "{:?}", report.diagnostics);

        let acid = table.weapon(table.resolve("ACID_SHREDDER_II").unwrap());
        assert_eq!(acid.class, WeaponClass::Greatsword);
        assert!(acid.is_raw);
        assert_eq!(acid.maximum_sharpness.map(|bar| bar[6]), Some(10));

        let bow = table.weapon(table.resolve("SAFI_BOW").unwrap());
        assert!(bow.maximum_sharpness.is_none());
        assert_eq!(bow.upgrade_scheme, UpgradeScheme::SafiStandard);
        assert_eq!(table.of_class(WeaponClass::Bow).len(), 1);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let raw = r#"{
            "BAD": {
                "name": "Bad", "class": "HAMMER", "rarity": 9,
                "attack": 0, "affinity": 120, "slots": [5, 1, 1],
                "maximum_sharpness": [1, 2, 3],
                "augmentation_scheme": "ICEBORNE"
            }
        }"#;
        let mut report = ValidationReport::default();
        let table = weapon_table_from_json(raw, &mut report).unwrap();
        assert!(table.is_empty());
        assert_eq!(report.error_count(), 5);
    }

    #[test]
    fn bloat_values() {
        assert_eq!(WeaponClass::Greatsword.bloat(), 4.8);
        assert_eq!(WeaponClass::ChargeBlade.bloat(), 3.6);
        assert!(!WeaponClass::LightBowgun.is_blademaster());
    }
}
