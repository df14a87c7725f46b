//! STACIE credential derivation and realm encryption.
//!
//! This crate implements the STACIE (Safely Tokenizing Authentication
//! Credentials In Entirety) scheme: a deterministic, staged key schedule
//! that authenticates users and protects per-realm secrets without ever
//! transmitting or persisting the plaintext password.
//!
//! # Stages
//!
//! 1. **Round planning** — [`rounds::hash_rounds`] maps the password
//!    length and a server bonus to an iteration count in `[8, 2^24]`.
//! 2. **Seed extraction** — [`derive::extract_seed`] condenses the
//!    password into a 64-octet seed with keyed HMAC-SHA-512.
//! 3. **Key ladder** — [`derive::derive_master_key`] and
//!    [`derive::derive_password_key`] run an iterated SHA-512 chain.
//! 4. **Token ladder** — [`derive::derive_verification_token`] and
//!    [`derive::derive_login_token`] produce the server-persisted and
//!    per-session credential witnesses.
//! 5. **Realm keys** — [`realm::derive_realm_key`] and
//!    [`realm::split_realm_key`] yield the vector/tag/cipher sub-keys.
//! 6. **Envelopes** — [`envelope::seal`] and [`envelope::open`] protect
//!    realm data with AES-256-GCM under shard-blinded IVs and tags.
//!
//! Every derivation is a pure function of its inputs: no clocks, no
//! process state, no retries. Distinct argument sets may be derived from
//! any number of threads without coordination.
//!
//! # Example
//!
//! ```
//! use stacie_core::{derive, envelope, realm, rounds};
//!
//! # fn main() -> Result<(), stacie_core::Error> {
//! let username = "user@example.tld";
//! let password = "correct horse battery staple";
//! let salt = [0x5a; 64];
//! let shard = [0xc3; 64];
//!
//! let rounds = rounds::hash_rounds(password, 0);
//! let seed = derive::extract_seed(rounds, username, password, Some(&salt))?;
//! let master_key = derive::derive_master_key(&seed, rounds, username, password, &salt)?;
//!
//! let realm_key = realm::derive_realm_key(&master_key, "mail", &shard)?;
//! let keys = realm::split_realm_key(&realm_key);
//! let sealed = envelope::seal(&keys, b"Attack at dawn!", 0)?;
//! assert_eq!(envelope::open(&keys, &sealed)?, b"Attack at dawn!");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod derive;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod realm;
pub mod rounds;

pub use error::Error;
pub use keys::{LoginToken, MasterKey, PasswordKey, RealmKey, Seed, VerificationToken};
pub use realm::RealmKeys;
