//! Random credentials: generated passwords and activation keys

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated passwords and activation keys
pub const RANDOM_TOKEN_LENGTH: usize = 20;

/// Generate a random alphanumeric password
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Generate a random numeric activation key
pub fn generate_activation_key() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_TOKEN_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
