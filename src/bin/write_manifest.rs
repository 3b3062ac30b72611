//! Manifest utility for Scorecast artifacts.
//!
//! Hashes the preprocessor and the three subject models and writes
//! `manifest.json` next to them, so the server can verify at startup that the
//! artifacts it loads are the ones that were published.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- <artifact_dir> [--check]
//! ```
//!
//! With `--check`, the existing manifest is compared against freshly computed
//! digests instead of being overwritten.

use std::env;
use std::fs;
use std::path::PathBuf;

use scorecast::adapters::artifacts::{Manifest, MANIFEST_FILE};

fn usage() -> String {
    "Usage: write_manifest <artifact_dir> [--check]".to_string()
}

fn parse_args() -> Result<(PathBuf, bool), String> {
    let mut artifact_dir: Option<PathBuf> = None;
    let mut check = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--check" => check = true,
            "-h" | "--help" => return Err(usage()),
            _ => {
                if artifact_dir.is_none() {
                    artifact_dir = Some(PathBuf::from(arg));
                } else {
                    return Err(usage());
                }
            }
        }
    }

    let artifact_dir = artifact_dir.ok_or_else(usage)?;
    Ok((artifact_dir, check))
}

fn main() -> Result<(), String> {
    let (artifact_dir, check) = parse_args()?;

    let manifest = Manifest::for_dir(&artifact_dir).map_err(|e| e.to_string())?;
    let manifest_path = artifact_dir.join(MANIFEST_FILE);

    if check {
        let existing = fs::read(&manifest_path)
            .map_err(|e| format!("Failed to read {manifest_path:?}: {e}"))?;
        let existing: Manifest = serde_json::from_slice(&existing)
            .map_err(|e| format!("Invalid {MANIFEST_FILE}: {e}"))?;
        if existing != manifest {
            return Err(format!("{manifest_path:?} is out of date"));
        }
        println!("Manifest up to date: {manifest_path:?}");
        return Ok(());
    }

    let bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;
    fs::write(&manifest_path, bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    for (name, digest) in &manifest.files {
        println!("{digest}  {name}");
    }
    println!("Wrote manifest: {manifest_path:?}");
    Ok(())
}
