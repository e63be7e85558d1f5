//! A complete loadout, its performance, and its saved form.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::contrib::armour::calculate_armour_contribution;
use crate::contrib::decorations::{check_decorations_fit, decoration_skills, DecorationCounts};
use crate::contrib::skills::{merge_levels, set_bonus_skills};
use crate::contrib::weapon_augments::WeaponAugments;
use crate::contrib::weapon_upgrades::WeaponUpgrades;
use crate::contrib::weapon_values::{calculate_final_weapon_values, WeaponFinalValues};
use crate::data::armour::{ArmourDiscriminator, ArmourPieceId, ArmourSlot, ArmourVariant};
use crate::data::charm::CharmId;
use crate::data::data_registry::Catalog;
use crate::data::skill::{SkillLevels, SkillStates};
use crate::data::weapon::{SharpnessBar, WeaponId};
use crate::error::{Result, SearchError};
use crate::scoring::efr::{lookup_from_skills, LookupValues};
use crate::scoring::states::{lookup_all_states, StateBranch};

const INDENT: &str = "      ";

#[derive(Debug, Clone, PartialEq)]
pub struct Build {
    pub weapon: WeaponId,
    /// Pieces in [ArmourSlot::ALL] order.
    pub armour: [ArmourPieceId; 5],
    pub charm: Option<CharmId>,
    pub augments: WeaponAugments,
    pub upgrades: WeaponUpgrades,
    pub decorations: DecorationCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildValues {
    pub efr: f64,
    pub affinity: i32,
    pub sharpness_values: Option<SharpnessBar>,
    pub skills: SkillLevels,
    /// Slot size to number of slots, over weapon and armour.
    pub usable_slots: BTreeMap<u8, u32>,
}

impl BuildValues {
    fn from_lookup(values: LookupValues, usable_slots: &BTreeMap<u8, u32>) -> Self {
        Self {
            efr: values.efr,
            affinity: values.affinity,
            sharpness_values: values.sharpness_values,
            skills: values.skills,
            usable_slots: usable_slots.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedBuild {
    armour: BTreeMap<String, (String, String, String)>,
    charm: Option<String>,
    weapon: String,
    weapon_augments: String,
    weapon_upgrades: String,
    decorations: BTreeMap<String, u32>,
}

impl Build {
    pub fn weapon_values(&self, catalog: &Catalog) -> Result<WeaponFinalValues> {
        calculate_final_weapon_values(
            self.weapon,
            catalog.weapons.weapon(self.weapon),
            &self.augments,
            &self.upgrades,
            &catalog.skills,
        )
    }

    /// Every decoration slot of the build, weapon slots first.
    pub fn usable_slots(&self, catalog: &Catalog) -> Result<Vec<u8>> {
        let mut slots = self.weapon_values(catalog)?.slots;
        let armour = calculate_armour_contribution(&self.armour, &catalog.armour);
        slots.extend(armour.decoration_slots);
        Ok(slots)
    }

    /// Regular skills plus the set bonus skills the build meets.
    ///
    /// Regular and set bonus skills never overlap in valid data, so an
    /// overlap is reported as [SearchError::SkillCollision].
    pub fn skills(&self, catalog: &Catalog) -> Result<SkillLevels> {
        let armour = calculate_armour_contribution(&self.armour, &catalog.armour);
        let mut skills = armour.skills;
        if let Some(charm) = self.charm {
            merge_levels(&mut skills, &catalog.charms.charm(charm).skills_at_max_level());
        }
        merge_levels(&mut skills, &decoration_skills(&self.decorations, &catalog.decorations));

        let weapon_bonus = self.upgrades.contribution(&catalog.skills)?.set_bonus;
        let from_set_bonuses = set_bonus_skills(&armour.set_bonuses, weapon_bonus, &catalog.skills);
        if let Some(skill) = from_set_bonuses.keys().find(|s| skills.contains_key(s)) {
            return Err(SearchError::SkillCollision(
                catalog.skills.skill_name(*skill).to_string(),
            ));
        }
        skills.extend(from_set_bonuses);
        Ok(skills)
    }

    fn checked_inputs(
        &self,
        catalog: &Catalog,
    ) -> Result<(WeaponFinalValues, SkillLevels, BTreeMap<u8, u32>)> {
        let weapon = self.weapon_values(catalog)?;
        let slots = self.usable_slots(catalog)?;
        check_decorations_fit(&self.decorations, &slots, &catalog.decorations)?;

        let mut usable_slots = BTreeMap::new();
        for slot in slots {
            *usable_slots.entry(slot).or_insert(0) += 1;
        }
        Ok((weapon, self.skills(catalog)?, usable_slots))
    }

    /// Performance under `states`, which must cover every active stateful skill.
    pub fn calculate_performance(&self, states: &SkillStates, catalog: &Catalog) -> Result<BuildValues> {
        let (weapon, skills, usable_slots) = self.checked_inputs(catalog)?;
        let values = lookup_from_skills(&weapon, &skills, states, catalog)?;
        Ok(BuildValues::from_lookup(values, &usable_slots))
    }

    /// Performance under every completion of `pinned`.
    pub fn calculate_performance_all_states(
        &self,
        pinned: &SkillStates,
        catalog: &Catalog,
    ) -> Result<Vec<StateBranch<BuildValues>>> {
        let (weapon, skills, usable_slots) = self.checked_inputs(catalog)?;
        Ok(lookup_all_states(&weapon, &skills, pinned, catalog)?
            .into_iter()
            .map(|branch| StateBranch {
                states: branch.states,
                result: BuildValues::from_lookup(branch.result, &usable_slots),
            })
            .collect())
    }

    pub fn serialize(&self, catalog: &Catalog) -> Result<String> {
        let armour = ArmourSlot::ALL
            .iter()
            .zip(self.armour)
            .map(|(slot, id)| {
                let set = catalog.armour.set_of(id);
                let piece = catalog.armour.piece(id);
                (
                    slot.as_str().to_string(),
                    (
                        set.name.clone(),
                        set.discriminator.as_str().to_string(),
                        piece.variant.as_str().to_string(),
                    ),
                )
            })
            .collect();
        let data = SerializedBuild {
            armour,
            charm: self.charm.map(|c| catalog.charms.charm(c).id.clone()),
            weapon: catalog.weapons.weapon(self.weapon).id.clone(),
            weapon_augments: self.augments.serialized_config()?,
            weapon_upgrades: self.upgrades.serialized_config()?,
            decorations: self
                .decorations
                .iter()
                .map(|(&d, &n)| (catalog.decorations.decoration(d).id.clone(), n))
                .collect(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    pub fn deserialize(raw: &str, catalog: &Catalog) -> Result<Self> {
        let data: SerializedBuild = serde_json::from_str(raw)?;

        let mut armour = Vec::with_capacity(ArmourSlot::ALL.len());
        for slot in ArmourSlot::ALL {
            let (set, discriminator, variant) = data
                .armour
                .get(slot.as_str())
                .ok_or_else(|| SearchError::unknown("armour slot", slot.as_str()))?;
            let discriminator = ArmourDiscriminator::from_name(discriminator)
                .ok_or_else(|| SearchError::unknown("armour discriminator", discriminator.as_str()))?;
            let variant = ArmourVariant::from_name(variant)
                .ok_or_else(|| SearchError::unknown("armour variant", variant.as_str()))?;
            armour.push(catalog.armour.find(set, discriminator, variant, slot)?);
        }
        let armour: [ArmourPieceId; 5] = armour
            .try_into()
            .map_err(|_| SearchError::unknown("armour slot", "incomplete armour"))?;

        let charm = data
            .charm
            .as_deref()
            .map(|id| catalog.charms.resolve(id))
            .transpose()?;

        let weapon = catalog.weapons.resolve(&data.weapon)?;
        let info = catalog.weapons.weapon(weapon);
        let mut augments = WeaponAugments::for_weapon(info)?;
        augments.update_with_serialized_config(&data.weapon_augments)?;
        let mut upgrades = WeaponUpgrades::for_weapon(info);
        upgrades.update_with_serialized_config(&data.weapon_upgrades)?;

        let mut decorations = DecorationCounts::new();
        for (id, count) in data.decorations {
            if count > 0 {
                decorations.insert(catalog.decorations.resolve(&id)?, count);
            }
        }

        Ok(Self {
            weapon,
            armour,
            charm,
            augments,
            upgrades,
            decorations,
        })
    }

    /// Multi-line listing of the build. Unpinned stateful skills are shown at
    /// their most favourable state.
    pub fn to_humanreadable(&self, pinned: &SkillStates, catalog: &Catalog) -> Result<String> {
        let branches = self.calculate_performance_all_states(pinned, catalog)?;
        let Some(best) = branches
            .into_iter()
            .max_by(|a, b| a.result.efr.total_cmp(&b.result.efr))
        else {
            return Err(SearchError::InvalidParameters(
                "no state assignment to show".to_string(),
            ));
        };
        let performance = best.result;
        let weapon = catalog.weapons.weapon(self.weapon);

        let mut buf = String::new();
        let _ = writeln!(buf, "Build:\n");
        let _ = writeln!(
            buf,
            "{:.2} EFR @ {} affinity\n",
            performance.efr, performance.affinity
        );
        let _ = writeln!(buf, "{INDENT}{}", weapon.name);
        let _ = writeln!(buf, "{INDENT}Augments: {}", self.augments.describe());
        let _ = writeln!(buf, "{INDENT}Upgrades: {}\n", self.upgrades.describe());

        for (slot, &id) in ArmourSlot::ALL.iter().zip(&self.armour) {
            let label = format!("{:<5}: {}", slot.as_str(), catalog.armour.short_name(id));
            let slots = &catalog.armour.piece(id).decoration_slots;
            let slots = if slots.is_empty() {
                "(none)".to_string()
            } else {
                slots.iter().map(u8::to_string).collect::<Vec<_>>().join(" ")
            };
            let _ = writeln!(buf, "{INDENT}{label:<25} slots: {slots}");
        }

        let charm = self
            .charm
            .map_or("(none)", |c| catalog.charms.charm(c).name.as_str());
        let _ = writeln!(buf, "\n{INDENT}CHARM: {charm}\n");

        let mut decorations: Vec<_> = self
            .decorations
            .iter()
            .map(|(&id, &n)| (catalog.decorations.decoration(id), n))
            .collect();
        decorations.sort_by(|(a, n), (b, m)| (b.slot_size, *m).cmp(&(a.slot_size, *n)));
        for (decoration, count) in decorations {
            let _ = writeln!(buf, "{INDENT}x{count} {}", decoration.name);
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_registry::shipped_catalog;

    fn sample_build(catalog: &Catalog) -> Build {
        let armour = ArmourSlot::ALL.map(|slot| catalog.armour.pieces_for_slot(slot, None)[0]);
        let weapon = catalog.weapons.resolve("ACID_SHREDDER_II").unwrap();
        let info = catalog.weapons.weapon(weapon);
        Build {
            weapon,
            armour,
            charm: None,
            augments: WeaponAugments::for_weapon(info).unwrap(),
            upgrades: WeaponUpgrades::for_weapon(info),
            decorations: DecorationCounts::new(),
        }
    }

    #[test]
    fn serialize_round_trip_is_identical() {
        let catalog = shipped_catalog();
        let build = sample_build(&catalog);
        let raw = build.serialize(&catalog).unwrap();
        assert!(raw.contains("\"weapon_augments\":\"NoWeaponAugments\""));
        let back = Build::deserialize(&raw, &catalog).unwrap();
        assert_eq!(back, build);
    }

    #[test]
    fn decorations_that_do_not_fit_are_rejected() {
        let catalog = shipped_catalog();
        let mut build = sample_build(&catalog);
        let big = catalog
            .decorations
            .ids()
            .find(|&d| catalog.decorations.decoration(d).slot_size == 4)
            .unwrap();
        build.decorations.insert(big, 20);
        let err = build
            .calculate_performance(&SkillStates::new(), &catalog)
            .unwrap_err();
        assert!(matches!(err, SearchError::DecorationFit { size: 4, .. }), "{err}");
    }

    #[test]
    fn humanreadable_lists_every_slot() {
        let catalog = shipped_catalog();
        let build = sample_build(&catalog);
        let text = build.to_humanreadable(&SkillStates::new(), &catalog).unwrap();
        assert!(text.starts_with("Build:"));
        for slot in ArmourSlot::ALL {
            assert!(text.contains(&format!("{:<5}: ", slot.as_str())), "{text}");
        }
        assert!(text.contains("CHARM: (none)"));
    }
}
