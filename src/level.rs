//! Pure level math: cumulative XP → level.
//!
//! Level `n` requires cumulative XP `T(n) = Σ_{i=2..n} (i-1)·100` — triangular
//! growth, so level 2 costs 100 XP, level 3 costs 300, level 4 costs 600, and
//! so on. Every XP mutation re-derives the level from scratch through
//! [`level_for_xp`]; nothing in the engine increments a cached level, which is
//! what keeps the cache from drifting.

/// XP cost of each level step, multiplied by the step index.
const STEP_XP: u64 = 100;

/// The largest level `n` such that `T(n) <= xp`. Always at least 1.
pub fn level_for_xp(xp: u64) -> u32 {
    let mut level: u32 = 1;
    let mut required: u64 = 0;

    while required <= xp {
        level += 1;
        required += u64::from(level - 1) * STEP_XP;
    }

    level - 1
}

/// Cumulative XP threshold `T(level)` at which `level` is reached.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    (2..=u64::from(level)).map(|i| (i - 1) * STEP_XP).sum()
}

/// XP still missing before the next level, given cumulative XP.
pub fn xp_to_next_level(xp: u64) -> u64 {
    let next = level_for_xp(xp) + 1;
    xp_for_level(next).saturating_sub(xp)
}

/// XP already earned inside the current level band.
pub fn xp_into_level(xp: u64) -> u64 {
    xp - xp_for_level(level_for_xp(xp))
}
