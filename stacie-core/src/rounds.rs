//! Password-length-adaptive round planning.
//!
//! Short passwords attract exponentially more derivation work; long
//! passwords rely on the server's configured bonus. A global ceiling bounds
//! worst-case latency for any input.

/// Minimum number of rounds for any derivation stage.
pub const MIN_ROUNDS: u32 = 8;

/// Maximum number of rounds for any derivation stage (2^24).
pub const MAX_ROUNDS: u32 = 1 << 24;

/// Computes the number of hash rounds for a password and server bonus.
///
/// The difficulty exponent shrinks by one per Unicode code point in the
/// password, with a floor of 1:
///
/// ```text
/// dynamic  = max(1, 24 - code_points(password))
/// variable = 2^dynamic
/// rounds   = clamp(variable + bonus, 8, 2^24)
/// ```
///
/// The clamp is applied after the bonus is added, never to `variable`
/// alone. The result is monotonically non-decreasing in `bonus`.
#[must_use]
pub fn hash_rounds(password: &str, bonus: u32) -> u32 {
    let characters = password.chars().count();
    let dynamic = 24usize.saturating_sub(characters).max(1);
    let variable = 1u64 << dynamic;
    let total = variable + u64::from(bonus);

    let clamped = total.clamp(u64::from(MIN_ROUNDS), u64::from(MAX_ROUNDS));
    // The clamp bounds the value to 2^24, which always fits in u32.
    #[allow(clippy::cast_possible_truncation)]
    let rounds = clamped as u32;
    rounds
}
