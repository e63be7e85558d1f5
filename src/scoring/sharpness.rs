use crate::contrib::skills::HANDICRAFT_MAX_LEVEL;
use crate::data::weapon::SharpnessBar;

/// Raw multiplier per sharpness band, red to purple.
pub const RAW_SHARPNESS_MODIFIERS: [f64; 7] = [0.50, 0.75, 1.00, 1.05, 1.20, 1.32, 1.39];

const POINTS_PER_HANDICRAFT_LEVEL: u16 = 10;

/// Sharpness bar actually available at `handicraft_level`, plus the index of
/// the highest band that still has points.
///
/// Each missing Handicraft level removes 10 points, taken from purple
/// downwards. A bar with no points left reports red.
pub fn actual_sharpness_level_values(
    maximum: &SharpnessBar,
    handicraft_level: u8,
) -> (SharpnessBar, usize) {
    let missing = HANDICRAFT_MAX_LEVEL.saturating_sub(handicraft_level) as u16;
    let mut deficit = missing * POINTS_PER_HANDICRAFT_LEVEL;
    let mut values = *maximum;
    for points in values.iter_mut().rev() {
        if deficit == 0 {
            break;
        }
        let taken = (*points).min(deficit);
        *points -= taken;
        deficit -= taken;
    }
    let highest = values.iter().rposition(|&points| points > 0).unwrap_or(0);
    (values, highest)
}

pub fn raw_sharpness_modifier(maximum: &SharpnessBar, handicraft_level: u8) -> f64 {
    let (_, highest) = actual_sharpness_level_values(maximum, handicraft_level);
    RAW_SHARPNESS_MODIFIERS[highest]
}
