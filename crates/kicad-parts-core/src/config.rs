use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const STAGING_SYMBOL_FILE: &str = "_staging.kicad_sym";
pub const STAGING_FOOTPRINT_DIR: &str = "_staging.pretty";
pub const STAGING_MODEL_DIR: &str = "_staging.3dshapes";

/// Suffix appended to every production library name, e.g. "Connector-JH".
pub const LIBRARY_SUFFIX: &str = "-JH";

pub const SYM_TABLE_FILE: &str = "sym-lib-table";
pub const FP_TABLE_FILE: &str = "fp-lib-table";
pub const COMMON_CONFIG_FILE: &str = "kicad_common.json";

/// Staging library directory from KICAD_STAGING_LIBS, created on demand
pub fn staging_dir() -> Result<PathBuf> {
    let dir = PathBuf::from(required_env("KICAD_STAGING_LIBS")?);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Production library directory from KICAD_MY_LIBS, created on demand
pub fn production_dir() -> Result<PathBuf> {
    let dir = PathBuf::from(required_env("KICAD_MY_LIBS")?);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// KiCad's own configuration directory, holding the library tables
pub fn kicad_config_dir() -> Result<PathBuf> {
    Ok(PathBuf::from(required_env("KICAD_CONFIG_DIR")?))
}

/// Production library base name for a category
pub fn library_base(category: &str) -> String {
    format!("{category}{LIBRARY_SUFFIX}")
}

fn required_env(name: &'static str) -> Result<String> {
    env::var(name).map_err(|_| Error::MissingEnvVar(name))
}
