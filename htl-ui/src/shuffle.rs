//! Deterministic display-order shuffling
//!
//! Each visitor sees each round's photos in a different order, but the same
//! visitor always sees the same order for the same round, across reloads and
//! restarts. The permutation is a pure function of the seed string
//! (visitor id concatenated with round id): the seed folds into a 32-bit
//! hash which drives a Fisher-Yates shuffle through a linear-congruential
//! generator, one draw per swap.
//!
//! Not security-sensitive; only reproducibility and a reasonable spread
//! matter.

/// Display letters assigned to shuffled positions
pub const DISPLAY_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Fold a seed string into a signed 32-bit hash
///
/// Polynomial rolling hash `h = h * 31 + unit` over the UTF-16 code units
/// of the seed, with wrapping 32-bit arithmetic. Empty seed hashes to 0.
fn fold_seed(seed: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    hash
}

/// One LCG step, keeping the state in signed 32-bit range
fn lcg_step(state: i32) -> i32 {
    // Constants from Numerical Recipes; the product fits i64 exactly
    ((state as i64 * 1_664_525 + 1_013_904_223) & 0xffff_ffff) as u32 as i32
}

/// Produce the seeded permutation of `items`
///
/// Identical seed always yields the identical permutation. Lists of length
/// 0 or 1 come back unchanged; any seed length, including empty, is
/// accepted.
pub fn seeded_shuffle<T: Clone>(items: &[T], seed: &str) -> Vec<T> {
    let mut state = fold_seed(seed);
    let mut shuffled: Vec<T> = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        state = lcg_step(state);
        let j = (state as u32 as u64 % (i as u64 + 1)) as usize;
        shuffled.swap(i, j);
    }
    shuffled
}

/// Shuffled item ids for a (visitor, round) pair
pub fn display_order(item_ids: &[&'static str], visitor_seed: &str, round_id: &str) -> Vec<&'static str> {
    let seed = format!("{}{}", visitor_seed, round_id);
    seeded_shuffle(item_ids, &seed)
}

/// Display letter of `item_id` within a shuffled order, '?' if absent
///
/// Unknown ids can only come from stale client state; the placeholder keeps
/// narrative rendering total.
pub fn display_letter(order: &[&str], item_id: &str) -> char {
    order
        .iter()
        .position(|id| *id == item_id)
        .and_then(|pos| DISPLAY_LETTERS.get(pos).copied())
        .unwrap_or('?')
}
