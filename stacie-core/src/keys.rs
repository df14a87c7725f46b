//! Secret byte-string newtypes produced by the derivation stages.
//!
//! Every derived secret is a fixed 64-octet value. Each wrapper zeroizes
//! its bytes on drop, redacts itself from `Debug` output, and compares in
//! constant time, so accidental logging or data-dependent branching on key
//! material cannot happen through the public API.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Octet length of every derived secret in the scheme.
pub const SECRET_LEN: usize = 64;

/// The 64-octet entropy seed extracted from the password.
///
/// Output of the keyed HMAC-SHA-512 extraction stage and input to the
/// first run of the key ladder.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SECRET_LEN]);

/// The 64-octet master key.
///
/// First output of the key ladder; required to derive and use
/// realm-specific keys.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; SECRET_LEN]);

/// The 64-octet password key.
///
/// Second output of the key ladder; authenticates password update
/// requests and seeds the verification token.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PasswordKey([u8; SECRET_LEN]);

/// The 64-octet verification token.
///
/// The persistent value a server stores to authenticate future logins.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VerificationToken([u8; SECRET_LEN]);

/// The 64-octet ephemeral login token.
///
/// Authenticates a single session or connection; derived from the
/// verification token and a per-login nonce.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LoginToken([u8; SECRET_LEN]);

/// A 64-octet realm key, sliced into vector, tag, and cipher sub-keys.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RealmKey([u8; SECRET_LEN]);

macro_rules! secret_impls {
    ($name:ident) => {
        impl $name {
            /// Creates the secret from raw bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
                Self(bytes)
            }

            /// Returns a reference to the raw secret bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; SECRET_LEN] {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("key", &"[REDACTED]")
                    .finish()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.ct_eq(&other.0).into()
            }
        }

        impl Eq for $name {}
    };
}

secret_impls!(Seed);
secret_impls!(MasterKey);
secret_impls!(PasswordKey);
secret_impls!(VerificationToken);
secret_impls!(LoginToken);
secret_impls!(RealmKey);
