//! Room code generation.

use parlor_protocol::RoomCode;
use rand::Rng;

/// Number of characters in a room code.
pub const CODE_LEN: usize = 6;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a random code of [`CODE_LEN`] uppercase letters.
///
/// Letters only, so codes are easy to read out loud. Uniqueness against
/// live rooms is the registry's job.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..CODE_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    RoomCode::new(code)
}
