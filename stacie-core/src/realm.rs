//! Realm key derivation and sub-key extraction.
//!
//! A realm key protects one category of data (`"mail"`, `"contacts"`, …).
//! It is derived from the master key, the realm label, and a non-secret
//! 64-octet shard, then XOR-blinded with the shard so that neither the
//! hash output nor the shard alone reveals the key. The 64-octet realm key
//! is deterministically bit-sliced into the three sub-keys the encryption
//! envelope consumes; no hashing or compression happens in between.

use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Error;
use crate::keys::{MasterKey, RealmKey, SECRET_LEN};

/// Octet length of a realm shard.
pub const SHARD_LEN: usize = 64;

/// Octet length of the vector sub-key.
pub const VECTOR_KEY_LEN: usize = 16;

/// Octet length of the tag sub-key.
pub const TAG_KEY_LEN: usize = 16;

/// Octet length of the cipher sub-key.
pub const CIPHER_KEY_LEN: usize = 32;

/// The three sub-keys sliced out of a realm key.
///
/// Layout within the 64-octet realm key:
///
/// ```text
/// Offset  Size  Sub-key
/// ------  ----  -------
/// 0       16    vector key (blinds the AES-GCM IV)
/// 16      16    tag key    (blinds the AES-GCM tag)
/// 32      32    cipher key (AES-256 key)
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RealmKeys {
    vector: [u8; VECTOR_KEY_LEN],
    tag: [u8; TAG_KEY_LEN],
    cipher: [u8; CIPHER_KEY_LEN],
}

impl RealmKeys {
    /// Assembles sub-keys from raw parts.
    #[must_use]
    pub const fn from_parts(
        vector: [u8; VECTOR_KEY_LEN],
        tag: [u8; TAG_KEY_LEN],
        cipher: [u8; CIPHER_KEY_LEN],
    ) -> Self {
        Self { vector, tag, cipher }
    }

    /// Returns the vector sub-key.
    #[must_use]
    pub const fn vector_key(&self) -> &[u8; VECTOR_KEY_LEN] {
        &self.vector
    }

    /// Returns the tag sub-key.
    #[must_use]
    pub const fn tag_key(&self) -> &[u8; TAG_KEY_LEN] {
        &self.tag
    }

    /// Returns the cipher sub-key.
    #[must_use]
    pub const fn cipher_key(&self) -> &[u8; CIPHER_KEY_LEN] {
        &self.cipher
    }
}

impl std::fmt::Debug for RealmKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmKeys")
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Derives the 64-octet realm key for a realm label and shard.
///
/// `SHA-512(master_key ‖ realm ‖ shard)` is XOR-blinded octet-wise with
/// the shard. The XOR runs over raw bytes, never over a text decoding.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an empty realm label and
/// [`Error::InvalidLength`] if the shard is not exactly 64 octets.
pub fn derive_realm_key(
    master_key: &MasterKey,
    realm: &str,
    shard: &[u8],
) -> Result<RealmKey, Error> {
    if realm.is_empty() {
        return Err(Error::argument("realm label is empty"));
    }
    let shard: &[u8; SHARD_LEN] = shard
        .try_into()
        .map_err(|_| Error::length("shard is not 64 octets"))?;

    let mut hasher = Sha512::new();
    hasher.update(master_key.as_bytes());
    hasher.update(realm.as_bytes());
    hasher.update(shard);

    let mut key = [0u8; SECRET_LEN];
    key.copy_from_slice(&hasher.finalize());
    for (byte, blind) in key.iter_mut().zip(shard) {
        *byte ^= blind;
    }
    Ok(RealmKey::from_bytes(key))
}

/// Slices a realm key into its vector, tag, and cipher sub-keys.
#[must_use]
pub fn split_realm_key(realm_key: &RealmKey) -> RealmKeys {
    let bytes = realm_key.as_bytes();

    let mut vector_key = [0u8; VECTOR_KEY_LEN];
    vector_key.copy_from_slice(&bytes[..16]);
    let mut tag_key = [0u8; TAG_KEY_LEN];
    tag_key.copy_from_slice(&bytes[16..32]);
    let mut cipher_key = [0u8; CIPHER_KEY_LEN];
    cipher_key.copy_from_slice(&bytes[32..]);

    RealmKeys::from_parts(vector_key, tag_key, cipher_key)
}
