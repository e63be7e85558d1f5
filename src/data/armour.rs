//! Armour sets and the pieces they are made of.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::skill::{SetBonusId, SkillLevels, SkillTable};
use crate::data::validate::{check_non_empty, check_range, ValidationReport};
use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    LowRank,
    HighRank,
    MasterRank,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowRank => "LOW_RANK",
            Self::HighRank => "HIGH_RANK",
            Self::MasterRank => "MASTER_RANK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmourDiscriminator {
    LowRank,
    HighRank,
    MasterRank,
}

impl ArmourDiscriminator {
    pub const ALL: [Self; 3] = [Self::LowRank, Self::HighRank, Self::MasterRank];

    pub fn tier(&self) -> Tier {
        match self {
            Self::LowRank => Tier::LowRank,
            Self::HighRank => Tier::HighRank,
            Self::MasterRank => Tier::MasterRank,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.tier().as_str()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArmourVariant {
    Lr,
    HrAlpha,
    HrBeta,
    HrGamma,
    MrAlphaPlus,
    MrBetaPlus,
    MrGammaPlus,
}

impl ArmourVariant {
    pub const ALL: [Self; 7] = [
        Self::Lr,
        Self::HrAlpha,
        Self::HrBeta,
        Self::HrGamma,
        Self::MrAlphaPlus,
        Self::MrBetaPlus,
        Self::MrGammaPlus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lr => "LR",
            Self::HrAlpha => "HR_ALPHA",
            Self::HrBeta => "HR_BETA",
            Self::HrGamma => "HR_GAMMA",
            Self::MrAlphaPlus => "MR_ALPHA_PLUS",
            Self::MrBetaPlus => "MR_BETA_PLUS",
            Self::MrGammaPlus => "MR_GAMMA_PLUS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == name)
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::Lr => Tier::LowRank,
            Self::HrAlpha | Self::HrBeta | Self::HrGamma => Tier::HighRank,
            Self::MrAlphaPlus | Self::MrBetaPlus | Self::MrGammaPlus => Tier::MasterRank,
        }
    }

    pub fn ascii_postfix(&self) -> &'static str {
        match self {
            Self::Lr => "",
            Self::HrAlpha => "Alpha",
            Self::HrBeta => "Beta",
            Self::HrGamma => "Gamma",
            Self::MrAlphaPlus => "Alpha+",
            Self::MrBetaPlus => "Beta+",
            Self::MrGammaPlus => "Gamma+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArmourSlot {
    Head,
    Chest,
    Arms,
    Waist,
    Legs,
}

impl ArmourSlot {
    pub const ALL: [Self; 5] = [Self::Head, Self::Chest, Self::Arms, Self::Waist, Self::Legs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Chest => "CHEST",
            Self::Arms => "ARMS",
            Self::Waist => "WAIST",
            Self::Legs => "LEGS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ArmourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArmourPieceId(pub(crate) u32);

impl ArmourPieceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct ArmourSet {
    pub name: String,
    pub discriminator: ArmourDiscriminator,
    pub rarity: u8,
    pub prefix: String,
    /// Piece postfixes in [ArmourSlot::ALL] order.
    pub naming_scheme: [String; 5],
    pub set_bonus: Option<SetBonusId>,
}

#[derive(Debug, Clone)]
pub struct ArmourPiece {
    pub set: usize,
    pub variant: ArmourVariant,
    pub slot: ArmourSlot,
    pub decoration_slots: Vec<u8>,
    pub skills: SkillLevels,
}

#[derive(Debug, Clone, Default)]
pub struct ArmourTable {
    sets: Vec<ArmourSet>,
    pieces: Vec<ArmourPiece>,
    by_slot: [Vec<ArmourPieceId>; 5],
    index: HashMap<(String, ArmourDiscriminator, ArmourVariant, ArmourSlot), ArmourPieceId>,
}

impl ArmourTable {
    pub fn piece(&self, id: ArmourPieceId) -> &ArmourPiece {
        &self.pieces[id.index()]
    }

    pub fn set_of(&self, id: ArmourPieceId) -> &ArmourSet {
        &self.sets[self.piece(id).set]
    }

    pub fn sets(&self) -> &[ArmourSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// All pieces for `slot`, optionally restricted to one tier.
    pub fn pieces_for_slot(&self, slot: ArmourSlot, tier: Option<Tier>) -> Vec<ArmourPieceId> {
        self.by_slot[slot.index()]
            .iter()
            .copied()
            .filter(|&id| tier.map_or(true, |t| self.piece(id).variant.tier() == t))
            .collect()
    }

    pub fn find(
        &self,
        set_name: &str,
        discriminator: ArmourDiscriminator,
        variant: ArmourVariant,
        slot: ArmourSlot,
    ) -> Result<ArmourPieceId> {
        self.index
            .get(&(set_name.to_string(), discriminator, variant, slot))
            .copied()
            .ok_or_else(|| {
                SearchError::unknown(
                    "armour piece",
                    format!(
                        "{set_name} {} {} {slot}",
                        discriminator.as_str(),
                        variant.as_str()
                    ),
                )
            })
    }

    /// `"{set} {postfix}"`, as shown in build listings.
    pub fn short_name(&self, id: ArmourPieceId) -> String {
        let piece = self.piece(id);
        let set = &self.sets[piece.set];
        let postfix = piece.variant.ascii_postfix();
        if postfix.is_empty() {
            set.name.clone()
        } else {
            format!("{} {postfix}", set.name)
        }
    }

    /// In-game style name built from the set prefix and the naming scheme.
    pub fn full_name(&self, id: ArmourPieceId) -> String {
        let piece = self.piece(id);
        let set = &self.sets[piece.set];
        let mut name = format!("{} {}", set.prefix, set.naming_scheme[piece.slot.index()]);
        let postfix = piece.variant.ascii_postfix();
        if !postfix.is_empty() {
            name.push(' ');
            name.push_str(postfix);
        }
        name.trim().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ArmourFile {
    naming_schemes: BTreeMap<String, Vec<String>>,
    armour: Vec<ArmourSetRecord>,
}

#[derive(Debug, Deserialize)]
struct ArmourSetRecord {
    set: String,
    discriminator: String,
    rarity: i64,
    #[serde(default)]
    prefix: String,
    naming_scheme: String,
    #[serde(default)]
    set_bonus: Option<String>,
    #[serde(flatten)]
    variants: BTreeMap<String, Value>,
}

type PieceRecord = (Vec<i64>, BTreeMap<String, i64>);

pub fn armour_table_from_json(
    raw: &str,
    skills: &SkillTable,
    report: &mut ValidationReport,
) -> Result<ArmourTable> {
    let file: ArmourFile = serde_json::from_str(raw)?;
    let mut table = ArmourTable::default();

    let mut schemes: HashMap<String, [String; 5]> = HashMap::new();
    for (id, postfixes) in file.naming_schemes {
        let context = format!("naming scheme '{id}'");
        if postfixes.iter().any(|p| p.trim().is_empty()) {
            report.error(&context, "naming scheme entries must not be empty");
            continue;
        }
        match <[String; 5]>::try_from(postfixes) {
            Ok(scheme) => {
                schemes.insert(id, scheme);
            }
            Err(_) => report.error(&context, "a naming scheme lists exactly 5 postfixes"),
        }
    }

    let mut seen_sets = HashSet::new();
    for (index, record) in file.armour.into_iter().enumerate() {
        let context = format!("armour[{index}] '{}'", record.set);
        let mut ok = check_non_empty(report, &context, "set", &record.set);
        ok &= check_range(report, &context, "rarity", record.rarity, 1, 12);

        let Some(discriminator) = ArmourDiscriminator::from_name(&record.discriminator) else {
            report.error(
                &context,
                format!("unknown discriminator '{}'", record.discriminator),
            );
            continue;
        };
        if !seen_sets.insert((record.set.clone(), discriminator)) {
            report.error(&context, format!("duplicate set {} {}", record.set, discriminator.as_str()));
            continue;
        }
        let naming_scheme = match schemes.get(&record.naming_scheme) {
            Some(scheme) => scheme.clone(),
            None => {
                report.error(
                    &context,
                    format!("unknown naming scheme '{}'", record.naming_scheme),
                );
                continue;
            }
        };
        let set_bonus = match &record.set_bonus {
            None => None,
            Some(id) => match skills.find_set_bonus(id) {
                Some(bonus) => Some(bonus),
                None => {
                    report.error(&context, format!("unknown set bonus '{id}'"));
                    ok = false;
                    None
                }
            },
        };

        let tier = discriminator.tier();
        let mut parsed = Vec::new();
        for (key, value) in &record.variants {
            let variant = match ArmourVariant::from_name(key) {
                Some(variant) if variant.tier() == tier => variant,
                _ => {
                    report.error(&context, format!("unexpected key '{key}'"));
                    ok = false;
                    continue;
                }
            };
            let pieces: BTreeMap<String, PieceRecord> = match serde_json::from_value(value.clone()) {
                Ok(pieces) => pieces,
                Err(err) => {
                    report.error(&context, format!("{key}: {err}"));
                    ok = false;
                    continue;
                }
            };
            for (slot_name, (slots, piece_skills)) in pieces {
                let piece_context = format!("{context} {key} {slot_name}");
                let Some(slot) = ArmourSlot::from_name(&slot_name) else {
                    report.error(&piece_context, "unknown armour slot");
                    ok = false;
                    continue;
                };
                if slots.len() > 3 || slots.iter().any(|&s| !(1..=4).contains(&s)) {
                    report.error(&piece_context, "expecting up to three slot sizes in 1..=4");
                    ok = false;
                    continue;
                }
                let mut levels = SkillLevels::new();
                for (skill_id, level) in piece_skills {
                    let Some(skill) = skills.find(&skill_id) else {
                        report.error(&piece_context, format!("unknown skill '{skill_id}'"));
                        ok = false;
                        continue;
                    };
                    if check_range(report, &piece_context, "skill level", level, 1, u8::MAX as i64) {
                        levels.insert(skill, level as u8);
                    } else {
                        ok = false;
                    }
                }
                parsed.push(ArmourPiece {
                    set: table.sets.len(),
                    variant,
                    slot,
                    decoration_slots: slots.into_iter().map(|s| s as u8).collect(),
                    skills: levels,
                });
            }
        }
        if parsed.is_empty() {
            report.error(&context, "no armour set variants found");
            ok = false;
        }
        if !ok {
            continue;
        }

        for piece in parsed {
            let handle = ArmourPieceId(table.pieces.len() as u32);
            table.by_slot[piece.slot.index()].push(handle);
            table
                .index
                .insert((record.set.clone(), discriminator, piece.variant, piece.slot), handle);
            table.pieces.push(piece);
        }
        table.sets.push(ArmourSet {
            name: record.set,
            discriminator,
            rarity: record.rarity as u8,
            prefix: record.prefix,
            naming_scheme,
            set_bonus,
        });
    }

    if table.sets.is_empty() {
        report.error("armour", "no armour sets found");
    }
    Ok(table)
}
