//! In-place uniform shuffling.

use rand::Rng;

/// Shuffles `items` in place with a Fisher–Yates pass from the back.
///
/// Every permutation is equally likely. The RNG is a parameter so rooms
/// can be seeded and their deals replayed exactly in tests.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
