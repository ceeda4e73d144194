//! Download token generation.
//!
//! The download token is the only credential a buyer ever presents to the
//! delivery endpoint, so it carries 256 bits of CSPRNG material: 32 random
//! bytes, hex-encoded to a 64-character opaque string.

use rand::Rng;

/// Number of random bytes backing one token.
const TOKEN_BYTES: usize = 32;

/// Generate a fresh download token.
pub fn generate_download_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
