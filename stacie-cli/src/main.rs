//! Developer CLI for STACIE credential derivation.
//!
//! Runs the derivation pipeline end to end and prints every intermediate
//! value, or derives a realm's sub-keys and demonstrates an envelope
//! seal/open round trip. Values print as unpadded base64url by default;
//! `--hex` switches to lowercase hex.

use clap::{Args, Parser, Subcommand};
use eyre::WrapErr;
use rand::rngs::OsRng;
use rand::RngCore;
use stacie_core::codec::{base64url_decode, base64url_encode, hex_encode};
use stacie_core::{derive, envelope, realm, rounds, MasterKey};

#[derive(Parser)]
#[command(name = "stacie", version, about = "STACIE credential derivation tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive the full credential set for a username and password.
    Derive(DeriveArgs),
    /// Derive realm sub-keys and run an envelope seal/open round trip.
    Realm(RealmArgs),
}

#[derive(Args)]
struct CredentialArgs {
    /// Normalized username.
    username: String,

    /// Plaintext password.
    password: String,

    /// Base64url salt, at least 64 octets once decoded.
    #[arg(long)]
    salt: Option<String>,

    /// Bonus hash rounds added by server policy.
    #[arg(long, default_value_t = 0)]
    bonus: u32,

    /// Print values as lowercase hex instead of base64url.
    #[arg(long)]
    hex: bool,
}

#[derive(Args)]
struct DeriveArgs {
    #[command(flatten)]
    credentials: CredentialArgs,

    /// Base64url login nonce; a fresh 128-octet value is generated when
    /// absent.
    #[arg(long)]
    nonce: Option<String>,
}

#[derive(Args)]
struct RealmArgs {
    #[command(flatten)]
    credentials: CredentialArgs,

    /// Realm label, e.g. "mail".
    #[arg(long)]
    realm: String,

    /// Base64url 64-octet realm shard.
    #[arg(long)]
    shard: String,

    /// Envelope serial number.
    #[arg(long, default_value_t = 0)]
    serial: u32,

    /// Message for the seal/open demonstration.
    #[arg(long, default_value = "Attack at dawn!")]
    message: String,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Derive(args) => run_derive(&args),
        Command::Realm(args) => run_realm(&args),
    }
}

fn render(bytes: &[u8], hex: bool) -> String {
    if hex {
        hex_encode(bytes)
    } else {
        base64url_encode(bytes)
    }
}

fn fresh_octets(len: usize) -> eyre::Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .wrap_err("secure random source unavailable")?;
    Ok(bytes)
}

/// Resolves the salt: decodes an explicit one, or generates a fresh
/// 128-octet value.
fn resolve_salt(args: &CredentialArgs) -> eyre::Result<Vec<u8>> {
    args.salt.as_deref().map_or_else(
        || fresh_octets(128),
        |text| base64url_decode(text).wrap_err("--salt is not valid base64url"),
    )
}

/// Runs the staged pipeline up to the master key, printing as it goes.
fn derive_master(args: &CredentialArgs, salt: &[u8]) -> eyre::Result<(u32, MasterKey)> {
    println!("username: {}", args.username);
    println!("password: {}", args.password);
    println!("salt: {}", render(salt, args.hex));

    let round_count = rounds::hash_rounds(&args.password, args.bonus);
    println!("bonus: {}", args.bonus);
    println!("rounds: {round_count}");

    let seed = derive::extract_seed(round_count, &args.username, &args.password, Some(salt))?;
    println!("seed: {}", render(seed.as_bytes(), args.hex));

    let master_key =
        derive::derive_master_key(&seed, round_count, &args.username, &args.password, salt)?;
    println!("master-key: {}", render(master_key.as_bytes(), args.hex));

    Ok((round_count, master_key))
}

fn run_derive(args: &DeriveArgs) -> eyre::Result<()> {
    let credentials = &args.credentials;
    let salt = resolve_salt(credentials)?;
    let nonce = args.nonce.as_deref().map_or_else(
        || fresh_octets(128),
        |text| base64url_decode(text).wrap_err("--nonce is not valid base64url"),
    )?;

    let (round_count, master_key) = derive_master(credentials, &salt)?;

    let password_key = derive::derive_password_key(
        &master_key,
        round_count,
        &credentials.username,
        &credentials.password,
        &salt,
    )?;
    println!(
        "password-key: {}",
        render(password_key.as_bytes(), credentials.hex)
    );

    let verification_token =
        derive::derive_verification_token(&password_key, &credentials.username, &salt);
    println!(
        "verification-token: {}",
        render(verification_token.as_bytes(), credentials.hex)
    );

    let login_token =
        derive::derive_login_token(&verification_token, &credentials.username, &salt, &nonce)?;
    println!("nonce: {}", render(&nonce, credentials.hex));
    println!(
        "ephemeral-login-token: {}",
        render(login_token.as_bytes(), credentials.hex)
    );

    Ok(())
}

fn run_realm(args: &RealmArgs) -> eyre::Result<()> {
    let credentials = &args.credentials;
    let salt = resolve_salt(credentials)?;
    let shard = base64url_decode(&args.shard).wrap_err("--shard is not valid base64url")?;

    let (_, master_key) = derive_master(credentials, &salt)?;

    let realm_key = realm::derive_realm_key(&master_key, &args.realm, &shard)?;
    let keys = realm::split_realm_key(&realm_key);
    println!("realm: {}", args.realm);
    println!("shard: {}", render(&shard, credentials.hex));
    println!(
        "realm-vector-key: {}",
        render(keys.vector_key(), credentials.hex)
    );
    println!("realm-tag-key: {}", render(keys.tag_key(), credentials.hex));
    println!(
        "realm-cipher-key: {}",
        render(keys.cipher_key(), credentials.hex)
    );

    let sealed = envelope::seal(&keys, args.message.as_bytes(), args.serial)?;
    println!("encrypted-data: {}", render(&sealed, credentials.hex));

    let opened = envelope::open(&keys, &sealed)?;
    println!("decrypted-data: {}", String::from_utf8_lossy(&opened));

    Ok(())
}
