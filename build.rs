//! Build script for the sporlapi client.
//!
//! Copies the `.env.example` configuration template into the platform local data
//! directory (`<data_local_dir>/sporlapi/.env.example`) so that users find a ready
//! template next to the `.env` file that `config::load_env` reads at runtime.

use std::{env, fs, path::PathBuf};

/// Copies the configuration template, warning instead of failing when it is missing.
///
/// # Destination
///
/// - Linux: `~/.local/share/sporlapi/.env.example`
/// - macOS: `~/Library/Application Support/sporlapi/.env.example`
/// - Windows: `%LOCALAPPDATA%/sporlapi/.env.example`
///
/// Directory creation and write failures abort the build; a missing template only
/// emits a `cargo:warning`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("sporlapi");
    fs::create_dir_all(&out_dir)?;

    if template.is_file() {
        fs::copy(&template, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
    }

    Ok(())
}
