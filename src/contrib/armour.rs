use crate::contrib::skills::merge_levels;
use crate::data::armour::{ArmourPieceId, ArmourTable};
use crate::data::skill::{SetBonusPieces, SkillLevels};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmourContribution {
    pub skills: SkillLevels,
    pub set_bonuses: SetBonusPieces,
    pub decoration_slots: Vec<u8>,
}

impl ArmourContribution {
    pub fn add_piece(&mut self, piece: ArmourPieceId, table: &ArmourTable) {
        let info = table.piece(piece);
        merge_levels(&mut self.skills, &info.skills);
        if let Some(bonus) = table.set_of(piece).set_bonus {
            *self.set_bonuses.entry(bonus).or_insert(0) += 1;
        }
        self.decoration_slots.extend_from_slice(&info.decoration_slots);
    }
}

pub fn calculate_armour_contribution(
    pieces: &[ArmourPieceId],
    table: &ArmourTable,
) -> ArmourContribution {
    let mut contribution = ArmourContribution::default();
    for &piece in pieces {
        contribution.add_piece(piece, table);
    }
    contribution
}
