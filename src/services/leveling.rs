//! XP to level mapping.
//!
//! Single authority for the level formula; the stats service and the
//! achievement service both go through here so the invariant
//! `current_level = floor(sqrt(total_xp_points / 100)) + 1` holds at
//! every call site.

const XP_LEVEL_DIVISOR: f64 = 100.0;

pub fn level_for_xp(xp: i32) -> i32 {
    let xp = xp.max(0) as f64;
    (xp / XP_LEVEL_DIVISOR).sqrt().floor() as i32 + 1
}

/// Total XP at which `level` is reached. Inverse bound of `level_for_xp`.
pub fn xp_for_level(level: i32) -> i32 {
    let steps = (level.max(1) - 1) as i64;
    (steps * steps * XP_LEVEL_DIVISOR as i64) as i32
}
