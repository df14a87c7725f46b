//! Textual codecs and integer framings used at the scheme's byte boundary.
//!
//! Salts, nonces, shards, and derived keys travel as unpadded base64url
//! (RFC 4648 §5); diagnostic output uses lowercase hex. Every counter and
//! length field inside the derivation and envelope formats is big-endian,
//! truncated to the stated width.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::Error;

/// Encodes bytes as base64url without `=` padding.
#[must_use]
pub fn base64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes unpadded base64url text.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for text outside the base64url
/// alphabet or whose length is congruent to 1 modulo 4 (no padded form
/// could produce it).
pub fn base64url_decode(text: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|_| Error::argument("malformed base64url input"))
}

/// Encodes bytes as lowercase hex without separators.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Low three octets of the big-endian encoding of `n`.
#[must_use]
pub const fn be3(n: u32) -> [u8; 3] {
    let b = n.to_be_bytes();
    [b[1], b[2], b[3]]
}

/// Full 16-bit big-endian encoding of `n`.
#[must_use]
pub const fn be2(n: u16) -> [u8; 2] {
    n.to_be_bytes()
}

/// Low octet of the big-endian encoding of `n`.
#[must_use]
pub const fn be1(n: u32) -> u8 {
    n.to_be_bytes()[3]
}
