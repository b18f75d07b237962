use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use kicad_parts_core::{Error, Result};

/// Run easyeda2kicad to download symbol, footprint, and 3D model for an LCSC
/// part. Output lands in `<output_base>.kicad_sym` / `.pretty` / `.3dshapes`
/// (the tool ignores any other library name).
pub fn fetch_part(lcsc_id: &str, output_base: &Path) -> Result<()> {
    let status = Command::new("easyeda2kicad")
        .arg("--full")
        .arg("--lcsc_id")
        .arg(lcsc_id)
        .arg("--output")
        .arg(output_base)
        .arg("--overwrite")
        .status()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::Other("easyeda2kicad not found. Is it installed?".into()),
            _ => Error::Io(e),
        })?;

    if !status.success() {
        return Err(Error::Other("Failed to import part from LCSC".into()));
    }
    Ok(())
}
