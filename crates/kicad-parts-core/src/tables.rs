use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::error::Result;

/// Ensure a library has an entry in a KiCad library table file, creating the
/// table when absent. The table root (`sym_lib_table` vs `fp_lib_table`) is
/// inferred from the file name. Returns true when an entry was added.
pub fn ensure_lib_in_table(table_file: &Path, lib_name: &str, lib_uri: &str) -> Result<bool> {
    let entry = format!(
        "  (lib (name \"{lib_name}\")(type \"KiCad\")(uri \"{lib_uri}\")(options \"\")(descr \"Custom library\"))\n"
    );

    if !table_file.exists() {
        let root = if table_file
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains("sym"))
        {
            "sym_lib_table"
        } else {
            "fp_lib_table"
        };
        fs::write(table_file, format!("({root}\n  (version 7)\n{entry})\n"))?;
        return Ok(true);
    }

    let content = fs::read_to_string(table_file)?;
    if content.contains(&format!("(name \"{lib_name}\")")) {
        return Ok(false);
    }

    // splice the entry in before the table's closing paren
    let trimmed = content.trim_end();
    if !trimmed.ends_with(')') {
        return Ok(false);
    }
    let mut updated = trimmed[..trimmed.len() - 1].to_string();
    updated.push_str(&entry);
    updated.push_str(")\n");
    fs::write(table_file, updated)?;
    Ok(true)
}

/// Ensure an environment variable is set in KiCad's kicad_common.json so
/// `${VAR}` library URIs resolve. Returns true when the variable was added;
/// an unparseable config is left alone.
pub fn ensure_env_var(config_dir: &Path, var: &str, value: &str) -> Result<bool> {
    let common = config_dir.join(crate::config::COMMON_CONFIG_FILE);

    if !common.exists() {
        let config = json!({ "environment": { "vars": { var: value } } });
        fs::write(&common, serde_json::to_string_pretty(&config)?)?;
        return Ok(true);
    }

    let Ok(mut config) = serde_json::from_str::<Value>(&fs::read_to_string(&common)?) else {
        return Ok(false);
    };
    let Some(root) = config.as_object_mut() else {
        return Ok(false);
    };
    let environment = root.entry("environment").or_insert_with(|| json!({}));
    let Some(environment) = environment.as_object_mut() else {
        return Ok(false);
    };
    let vars = environment.entry("vars").or_insert_with(|| json!({}));
    if vars.is_null() {
        *vars = json!({});
    }
    let Some(vars) = vars.as_object_mut() else {
        return Ok(false);
    };
    if vars.contains_key(var) {
        return Ok(false);
    }
    vars.insert(var.to_string(), Value::String(value.to_string()));

    fs::write(&common, serde_json::to_string_pretty(&config)?)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_symbol_table() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("sym-lib-table");
        assert!(ensure_lib_in_table(&table, "_staging", "${KICAD_STAGING_LIBS}/_staging.kicad_sym").unwrap());
        let content = fs::read_to_string(&table).unwrap();
        assert!(content.starts_with("(sym_lib_table\n  (version 7)\n"));
        assert!(content.contains("(name \"_staging\")"));
        assert!(content.trim_end().ends_with(')'));
    }

    #[test]
    fn test_creates_footprint_table() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("fp-lib-table");
        assert!(ensure_lib_in_table(&table, "_staging", "${KICAD_STAGING_LIBS}/_staging.pretty").unwrap());
        let content = fs::read_to_string(&table).unwrap();
        assert!(content.starts_with("(fp_lib_table\n"));
    }

    #[test]
    fn test_table_entry_is_idempotent() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("sym-lib-table");
        assert!(ensure_lib_in_table(&table, "Connector-JH", "uri").unwrap());
        let first = fs::read_to_string(&table).unwrap();
        assert!(!ensure_lib_in_table(&table, "Connector-JH", "uri").unwrap());
        assert_eq!(first, fs::read_to_string(&table).unwrap());
    }

    #[test]
    fn test_appends_before_closing_paren() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("sym-lib-table");
        fs::write(
            &table,
            "(sym_lib_table\n  (version 7)\n  (lib (name \"Existing\")(type \"KiCad\")(uri \"x\")(options \"\")(descr \"\"))\n)\n",
        )
        .unwrap();
        assert!(ensure_lib_in_table(&table, "Connector-JH", "uri").unwrap());
        let content = fs::read_to_string(&table).unwrap();
        assert!(content.contains("(name \"Existing\")"));
        let existing = content.find("Existing").unwrap();
        let added = content.find("Connector-JH").unwrap();
        assert!(existing < added);
        assert!(content.trim_end().ends_with(')'));
    }

    #[test]
    fn test_env_var_created_and_idempotent() {
        let dir = tempdir().unwrap();
        assert!(ensure_env_var(dir.path(), "KICAD_MY_LIBS", "/libs").unwrap());
        assert!(!ensure_env_var(dir.path(), "KICAD_MY_LIBS", "/libs").unwrap());
        let content = fs::read_to_string(dir.path().join("kicad_common.json")).unwrap();
        let config: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(config["environment"]["vars"]["KICAD_MY_LIBS"], "/libs");
    }

    #[test]
    fn test_env_var_added_to_existing_config() {
        let dir = tempdir().unwrap();
        let common = dir.path().join("kicad_common.json");
        fs::write(&common, r#"{"environment":{"vars":null},"system":{"editor":""}}"#).unwrap();
        assert!(ensure_env_var(dir.path(), "KICAD_STAGING_LIBS", "/staging").unwrap());
        let config: Value = serde_json::from_str(&fs::read_to_string(&common).unwrap()).unwrap();
        assert_eq!(config["environment"]["vars"]["KICAD_STAGING_LIBS"], "/staging");
        // unrelated settings survive
        assert!(config["system"]["editor"].is_string());
    }

    #[test]
    fn test_unparseable_config_left_alone() {
        let dir = tempdir().unwrap();
        let common = dir.path().join("kicad_common.json");
        fs::write(&common, "{not json").unwrap();
        assert!(!ensure_env_var(dir.path(), "KICAD_MY_LIBS", "/libs").unwrap());
        assert_eq!(fs::read_to_string(&common).unwrap(), "{not json");
    }
}
