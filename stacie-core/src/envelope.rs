//! Authenticated realm-encryption envelopes.
//!
//! An envelope carries one AES-256-GCM message keyed by a realm's cipher
//! sub-key. The IV and the GCM tag never appear on the wire directly: each
//! is XOR-blinded against the realm's vector and tag sub-keys, and only
//! the blinded shards are transmitted.
//!
//! # Binary layout
//!
//! ```text
//! Offset  Size    Field
//! ------  ----    -----
//! 0       2       serial (u16 BE)
//! 2       16      vector_shard (iv = vector_key XOR vector_shard)
//! 18      16      tag_shard    (gcm_tag = tag_key XOR tag_shard)
//! 34      16*n    ciphertext of the padded plaintext block
//! ```
//!
//! The plaintext block is framed as
//! `be3(size) ‖ be1(pad) ‖ plaintext ‖ be1(pad) × pad` with
//! `pad = 16 − ((size + 4) mod 16)`, so the block always ends on a
//! 16-octet boundary and `pad` is never zero.

// Length fields are gated to 2^24 / 2^16 before the narrowing casts below.
#![allow(clippy::cast_possible_truncation)]

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, KeyInit};
use zeroize::Zeroize;

use crate::codec::{be1, be2, be3};
use crate::error::Error;
use crate::realm::RealmKeys;

/// AES-256-GCM with the 16-octet IV the envelope format mandates.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Octet length of the serial field.
pub const SERIAL_LEN: usize = 2;

/// Octet length of the vector shard.
pub const VECTOR_SHARD_LEN: usize = 16;

/// Octet length of the tag shard.
pub const TAG_SHARD_LEN: usize = 16;

/// Octet length of the envelope header preceding the ciphertext.
pub const HEADER_LEN: usize = SERIAL_LEN + VECTOR_SHARD_LEN + TAG_SHARD_LEN;

/// Minimum octet length of a well-formed envelope.
pub const MIN_ENVELOPE_LEN: usize = 54;

/// Alignment of the padded plaintext block.
const BLOCK_LEN: usize = 16;

/// Exclusive upper bound on plaintext length (2^24 octets).
const MAX_PLAINTEXT_LEN: usize = 1 << 24;

/// Exclusive upper bound on the serial number (2^16).
const MAX_SERIAL: u32 = 1 << 16;

/// The total envelope length produced by sealing a plaintext of the given
/// length.
#[must_use]
pub const fn sealed_len(plaintext_len: usize) -> usize {
    let pad = BLOCK_LEN - ((plaintext_len + 4) % BLOCK_LEN);
    HEADER_LEN + plaintext_len + 4 + pad
}

fn xor_16(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for ((byte, x), y) in out.iter_mut().zip(a).zip(b) {
        *byte = x ^ y;
    }
    out
}

/// Seals a plaintext into an authenticated realm envelope.
///
/// A fresh 16-octet vector shard is drawn from the secure random source
/// for every message; the AES-GCM IV is `vector_key XOR vector_shard` and
/// the transmitted tag shard is `tag_key XOR gcm_tag`. The associated
/// data is empty.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `serial` is not below 2^16.
/// - [`Error::InvalidLength`] if the plaintext is empty or 2^24 octets or
///   longer.
/// - [`Error::RandomSourceUnavailable`] if the vector shard cannot be
///   drawn.
pub fn seal(keys: &RealmKeys, plaintext: &[u8], serial: u32) -> Result<Vec<u8>, Error> {
    if serial >= MAX_SERIAL {
        return Err(Error::argument("serial is not below 65,536"));
    }
    if plaintext.is_empty() {
        return Err(Error::length("plaintext is empty"));
    }
    if plaintext.len() >= MAX_PLAINTEXT_LEN {
        return Err(Error::length("plaintext is 2^24 octets or longer"));
    }

    let size = plaintext.len();
    let pad = BLOCK_LEN - ((size + 4) % BLOCK_LEN);

    let mut block = Vec::with_capacity(size + 4 + pad);
    block.extend_from_slice(&be3(size as u32));
    block.push(be1(pad as u32));
    block.extend_from_slice(plaintext);
    block.resize(size + 4 + pad, be1(pad as u32));

    let mut vector_shard = [0u8; VECTOR_SHARD_LEN];
    getrandom::getrandom(&mut vector_shard).map_err(|_| Error::RandomSourceUnavailable)?;
    let mut iv = xor_16(keys.vector_key(), &vector_shard);

    let cipher = Aes256Gcm16::new(GenericArray::from_slice(keys.cipher_key()));
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), &[], &mut block)
        .map_err(|_| Error::length("plaintext exceeds the AES-GCM message bound"))?;
    iv.zeroize();

    let mut gcm_tag = [0u8; TAG_SHARD_LEN];
    gcm_tag.copy_from_slice(&tag);
    let tag_shard = xor_16(keys.tag_key(), &gcm_tag);
    gcm_tag.zeroize();

    let mut envelope = Vec::with_capacity(HEADER_LEN + block.len());
    envelope.extend_from_slice(&be2(serial as u16));
    envelope.extend_from_slice(&vector_shard);
    envelope.extend_from_slice(&tag_shard);
    envelope.extend_from_slice(&block);
    Ok(envelope)
}

/// Opens a sealed envelope and returns the original plaintext.
///
/// # Errors
///
/// - [`Error::InvalidLength`] if the envelope is shorter than 54 octets or
///   its ciphertext does not end on a 16-octet boundary.
/// - [`Error::AuthenticationFailure`] if the GCM tag does not verify.
/// - [`Error::InvalidPadding`] if the decrypted block's length header or
///   trailing pad octets are inconsistent.
pub fn open(keys: &RealmKeys, envelope: &[u8]) -> Result<Vec<u8>, Error> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(Error::length("envelope shorter than 54 octets"));
    }
    if (envelope.len() - HEADER_LEN) % BLOCK_LEN != 0 {
        return Err(Error::length(
            "envelope ciphertext does not end on a 16 octet boundary",
        ));
    }

    let mut vector_shard = [0u8; VECTOR_SHARD_LEN];
    vector_shard.copy_from_slice(&envelope[SERIAL_LEN..SERIAL_LEN + VECTOR_SHARD_LEN]);
    let mut tag_shard = [0u8; TAG_SHARD_LEN];
    tag_shard.copy_from_slice(&envelope[SERIAL_LEN + VECTOR_SHARD_LEN..HEADER_LEN]);

    let mut iv = xor_16(keys.vector_key(), &vector_shard);
    let mut gcm_tag = xor_16(keys.tag_key(), &tag_shard);

    let mut block = envelope[HEADER_LEN..].to_vec();
    let cipher = Aes256Gcm16::new(GenericArray::from_slice(keys.cipher_key()));
    let verified = cipher.decrypt_in_place_detached(
        GenericArray::from_slice(&iv),
        &[],
        &mut block,
        GenericArray::from_slice(&gcm_tag),
    );
    iv.zeroize();
    gcm_tag.zeroize();
    if verified.is_err() {
        block.zeroize();
        return Err(Error::AuthenticationFailure);
    }

    let size = (usize::from(block[0]) << 16) | (usize::from(block[1]) << 8) | usize::from(block[2]);
    let pad = usize::from(block[3]);

    if !(1..=BLOCK_LEN).contains(&pad)
        || (size + pad + 4) % BLOCK_LEN != 0
        || block.len() != size + pad + 4
    {
        block.zeroize();
        return Err(Error::InvalidPadding);
    }
    if block[size + 4..].iter().any(|&byte| byte != block[3]) {
        block.zeroize();
        return Err(Error::InvalidPadding);
    }

    let plaintext = block[4..size + 4].to_vec();
    block.zeroize();
    Ok(plaintext)
}
