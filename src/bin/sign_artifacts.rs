//! Signing utility for screening artifacts.
//!
//! # Usage
//!
//! ```bash
//! # Generate an Ed25519 keypair (seed file is written with 0600 permissions)
//! sign_artifacts keygen --out-seed <path> [--out-pub <path>] [--force]
//!
//! # Bind model.json + encoders.json into a signed manifest
//! sign_artifacts sign <artifact_dir> [--key-file <path>] [--serial <u64>]
//! ```
//!
//! The signing seed is read from `--key-file`, or the file named by
//! `AQSCREEN_SIGNING_KEY_B64_FILE`. Point `AQSCREEN_SIGNING_PUBKEY_B64_FILE`
//! at the public key when running `aqscreen`.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use aqscreen::adapters::artifacts::{write_signed_manifest, MANIFEST_FILE, SIGNATURE_FILE};

const KEY_FILE_ENV: &str = "AQSCREEN_SIGNING_KEY_B64_FILE";

const USAGE: &str = "Usage:
  sign_artifacts keygen --out-seed <path> [--out-pub <path>] [--force]
  sign_artifacts sign <artifact_dir> [--key-file <path>] [--serial <u64>]";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(1)
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
}

fn read_seed(path: &Path) -> Result<Seed> {
    let content = Zeroizing::new(
        fs::read_to_string(path).with_context(|| format!("Failed reading signing key {path:?}"))?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .context("Invalid base64 in signing key")?,
    );
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn create_file(path: &Path, mode: u32, force: bool) -> Result<fs::File> {
    if path.exists() && !force {
        bail!("Refusing to overwrite existing file {path:?}. Use --force.");
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {parent:?}"))?;
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    opts.open(path)
        .with_context(|| format!("Failed to open {path:?}"))
}

fn keygen(mut args: impl Iterator<Item = String>) -> Result<()> {
    let mut out_seed: Option<PathBuf> = None;
    let mut out_pub: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-seed" => out_seed = Some(next_value(&mut args, "--out-seed")?.into()),
            "--out-pub" => out_pub = Some(next_value(&mut args, "--out-pub")?.into()),
            "--force" => force = true,
            _ => bail!("Unknown argument {arg:?}\n{USAGE}"),
        }
    }
    let out_seed = out_seed.ok_or_else(|| anyhow!("--out-seed is required\n{USAGE}"))?;

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(&seed.0));
    let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());

    let mut file = create_file(&out_seed, 0o600, force)?;
    writeln!(file, "{}", seed_b64.as_str())?;
    println!("Wrote signing seed (base64) to {out_seed:?}");

    if let Some(pub_path) = &out_pub {
        // Public key is not secret.
        let mut file = create_file(pub_path, 0o644, force)?;
        writeln!(file, "{pub_b64}")?;
        println!("Wrote public key (base64) to {pub_path:?}");
    }
    println!("PUBKEY (hex)={}", to_hex(verifying_key.as_bytes()));

    Ok(())
}

fn sign(mut args: impl Iterator<Item = String>) -> Result<()> {
    let mut dir: Option<PathBuf> = None;
    let mut key_file: Option<PathBuf> = env::var(KEY_FILE_ENV).ok().map(PathBuf::from);
    let mut serial: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--key-file" => key_file = Some(next_value(&mut args, "--key-file")?.into()),
            "--serial" => {
                let v = next_value(&mut args, "--serial")?;
                serial = Some(v.trim().parse().context("--serial must be a u64")?);
            }
            _ if dir.is_none() => dir = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument {arg:?}\n{USAGE}"),
        }
    }

    let dir = dir.ok_or_else(|| anyhow!("Missing artifact directory\n{USAGE}"))?;
    let key_file = key_file
        .ok_or_else(|| anyhow!("Missing signing key: pass --key-file or set {KEY_FILE_ENV}"))?;

    let seed = read_seed(&key_file)?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let serial = serial.unwrap_or_else(unix_now);
    let manifest = write_signed_manifest(&dir, &signing_key, serial)?;

    println!("Signed manifest: {:?}", dir.join(MANIFEST_FILE));
    println!("Wrote signature: {:?}", dir.join(SIGNATURE_FILE));
    for name in manifest.files.keys() {
        println!("  bound {name}");
    }
    println!(
        "PUBKEY (hex)={}",
        to_hex(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("keygen") => keygen(args),
        Some("sign") => sign(args),
        Some("-h" | "--help") => {
            println!("{USAGE}");
            Ok(())
        }
        _ => bail!("{USAGE}"),
    }
}
