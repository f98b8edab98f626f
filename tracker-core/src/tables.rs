//! Rule tables and the small arithmetic helpers built on them.
//!
//! Every table is indexed by level minus one and always has twenty rows.
//! Slot rows are zero-padded to nine spell levels.

/// Highest level a single class entry may reach.
pub const MAX_CLASS_LEVEL: u8 = 20;

/// Highest spell level.
pub const MAX_SPELL_LEVEL: u8 = 9;

/// Successes or failures needed to end a death save sequence.
pub const MAX_DEATH_SAVES: u8 = 3;

/// Prefix of the pact slot key, e.g. `pact-3`.
pub const PACT_KEY_PREFIX: &str = "pact-";

/// Spell slots per spell level for a full caster, by combined caster level.
pub const FULL_CASTER_SLOTS: [[u32; 9]; 20] = [
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 2, 1, 1],
];

/// Spell slots for a single-classed half caster, by class level.
pub const HALF_CASTER_SLOTS: [[u32; 9]; 20] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
];

/// Pact magic: `(slot count, slot level)` by warlock level.
pub const WARLOCK_SLOTS: [(u32, u8); 20] = [
    (1, 1),
    (2, 1),
    (2, 2),
    (2, 2),
    (2, 3),
    (2, 3),
    (2, 4),
    (2, 4),
    (2, 5),
    (2, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (4, 5),
    (4, 5),
    (4, 5),
    (4, 5),
];

fn row_index(level: u32) -> Option<usize> {
    if level == 0 {
        None
    } else {
        Some((level as usize - 1).min(19))
    }
}

/// Full caster row for a combined caster level. Levels above 20 use row 20.
pub fn full_caster_row(caster_level: u32) -> Option<&'static [u32; 9]> {
    row_index(caster_level).map(|i| &FULL_CASTER_SLOTS[i])
}

/// Half caster row for a single-classed half caster level.
pub fn half_caster_row(class_level: u32) -> Option<&'static [u32; 9]> {
    row_index(class_level).map(|i| &HALF_CASTER_SLOTS[i])
}

/// Pact slot count and slot level for a warlock level.
pub fn warlock_row(warlock_level: u32) -> Option<(u32, u8)> {
    row_index(warlock_level).map(|i| WARLOCK_SLOTS[i])
}

/// `floor((score - 10) / 2)`, rounding toward negative infinity.
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Proficiency bonus for a total character level.
pub fn proficiency_bonus(total_level: u32) -> u8 {
    let bonus = total_level.saturating_sub(1) / 4 + 2;
    bonus.min(u8::MAX as u32) as u8
}
