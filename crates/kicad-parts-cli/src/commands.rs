use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crossterm::style::Stylize;
use kicad_parts_api::{parse_stock, DigikeyClient, MouserClient};
use kicad_parts_core::{config, part, symbol, tables, Error, Result, SymbolLibrary};

use crate::cli::Commands;
use crate::easyeda;
use crate::output;

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Import { lcsc_id } => cmd_import(&lcsc_id),
        Commands::Accept { part, library } => cmd_accept(part.as_deref(), library.as_deref()),
        Commands::List { verbose, staging } => cmd_list(verbose, staging),
        Commands::Delete { part, library } => cmd_delete(part.as_deref(), library.as_deref()),
    }
}

/// Import a part from LCSC into the staging library
fn cmd_import(lcsc_id: &str) -> Result<()> {
    let lcsc_id = lcsc_id.to_uppercase();
    if !part::is_valid_lcsc_id(&lcsc_id) {
        return Err(Error::InvalidLcscId(lcsc_id));
    }

    let staging = config::staging_dir()?;
    output::info(format!("Importing part {lcsc_id} from LCSC/EasyEDA..."));
    easyeda::fetch_part(&lcsc_id, &staging.join("easyeda2kicad"))?;
    output::success("Downloaded symbol, footprint, and 3D model from LCSC");

    let imported = collect_download(&staging)?;
    let Some(symbol_name) = imported.first() else {
        return Err(Error::Other("No symbols found in downloaded file".into()));
    };
    output::info(format!("Symbol name: {symbol_name}"));

    // Sub-symbol suffixes are not part of the MPN the distributors know
    let mpn = part::strip_unit_suffix(symbol_name).to_string();
    if mpn != *symbol_name {
        output::info(format!("Cleaned MPN for API search: {mpn}"));
    }

    let sym_file = staging.join(config::STAGING_SYMBOL_FILE);
    let mut library = SymbolLibrary::open(&sym_file)?;

    library.set_property(symbol_name, "LCSC", &lcsc_id);
    output::success(format!("Added LCSC property: {lcsc_id}"));

    enrich_from_digikey(&mut library, symbol_name, &mpn);
    enrich_from_mouser(&mut library, symbol_name, &mpn);

    library.set_property(symbol_name, "MPN", &mpn);
    library.save()?;

    register_staging_libraries()?;

    println!();
    output::success(format!("Part {lcsc_id} ({mpn}) imported to staging!"));
    println!();
    output::info("Files created:");
    println!("  Symbol:    {}", sym_file.display());
    println!("  Footprint: {}/", staging.join(config::STAGING_FOOTPRINT_DIR).display());
    println!("  3D Models: {}/", staging.join(config::STAGING_MODEL_DIR).display());
    println!();
    output::info("Use 'kicad-parts list --staging' to view staged parts");
    output::info("Use 'kicad-parts accept' to move to production library");
    Ok(())
}

/// Fold easyeda2kicad output files into the `_staging.*` library set and
/// return the imported part names.
fn collect_download(staging: &Path) -> Result<Vec<String>> {
    let easyeda_sym = staging.join("easyeda2kicad.kicad_sym");
    let easyeda_pretty = staging.join("easyeda2kicad.pretty");
    let easyeda_3d = staging.join("easyeda2kicad.3dshapes");
    let sym_file = staging.join(config::STAGING_SYMBOL_FILE);

    let mut imported = Vec::new();
    if easyeda_sym.exists() {
        let downloaded = SymbolLibrary::open(&easyeda_sym)?;
        imported = part::main_symbols(&downloaded.symbol_names());
        if sym_file.exists() {
            let mut existing = SymbolLibrary::open(&sym_file)?;
            for name in &imported {
                // re-importing a part replaces its previous staging entry
                existing.remove_symbol(name);
                if let Some(text) = downloaded.extract_symbol(name) {
                    existing.merge_symbol(&text);
                }
            }
            existing.save()?;
            fs::remove_file(&easyeda_sym)?;
        } else {
            fs::rename(&easyeda_sym, &sym_file)?;
        }
    }

    move_all_files(&easyeda_pretty, &staging.join(config::STAGING_FOOTPRINT_DIR))?;
    let _ = fs::remove_dir_all(&easyeda_pretty);
    move_all_files(&easyeda_3d, &staging.join(config::STAGING_MODEL_DIR))?;
    let _ = fs::remove_dir_all(&easyeda_3d);

    if !sym_file.exists() {
        return Err(Error::Other(format!("Symbol file not found: {}", sym_file.display())));
    }
    Ok(imported)
}

fn enrich_from_digikey(library: &mut SymbolLibrary, symbol: &str, mpn: &str) {
    let mut client = DigikeyClient::from_env();
    if !client.available() {
        output::warn("Digikey API credentials not set (DIGIKEY_CLIENT_ID, DIGIKEY_CLIENT_SECRET)");
        return;
    }
    output::info(format!("Querying Digikey API for: {mpn}"));
    let product = match client.search(mpn) {
        Ok(Some(product)) => product,
        Ok(None) => {
            output::warn(format!("Digikey: No results for '{mpn}'"));
            return;
        }
        Err(e) => {
            output::warn(format!("Digikey API error: {e}"));
            return;
        }
    };

    if let Some(pn) = product.product_number {
        library.set_property(symbol, "Digikey", &pn);
        output::success(format!("Added Digikey PN: {pn}"));
    }
    if let Some(stock) = product.quantity_available {
        library.set_property(symbol, "Stock_Digikey", &stock.to_string());
        output::info(format!("Digikey stock: {stock}"));
    }
    if let Some(url) = product.datasheet_url {
        library.set_property(symbol, "Datasheet", &url);
        output::success("Added datasheet URL");
    }
    if let Some(name) = product.manufacturer.and_then(|m| m.name) {
        library.set_property(symbol, "Manufacturer", &name);
        output::success(format!("Added manufacturer: {name}"));
    }
    for tier in product.standard_pricing {
        if let (Some(qty), Some(price)) = (tier.break_quantity, tier.unit_price) {
            library.set_property(symbol, &format!("Price_{qty}"), &format!("${price}"));
        }
    }
}

fn enrich_from_mouser(library: &mut SymbolLibrary, symbol: &str, mpn: &str) {
    let client = MouserClient::from_env();
    if !client.available() {
        output::warn("Mouser API key not set (MOUSER_API_KEY)");
        return;
    }
    output::info(format!("Querying Mouser API for: {mpn}"));
    let found = match client.search(mpn) {
        Ok(Some(found)) => found,
        Ok(None) => {
            output::warn(format!("Mouser: No results for '{mpn}'"));
            return;
        }
        Err(e) => {
            output::warn(format!("Mouser API error: {e}"));
            return;
        }
    };

    if let Some(pn) = found.mouser_part_number {
        library.set_property(symbol, "Mouser", &pn);
        output::success(format!("Added Mouser PN: {pn}"));
    }
    if let Some(stock) = found.availability.as_deref().and_then(parse_stock) {
        library.set_property(symbol, "Stock_Mouser", &stock.to_string());
        output::info(format!("Mouser stock: {stock}"));
    }
    if let Some(name) = found.manufacturer {
        // Digikey's manufacturer name wins when both answered
        if library.property(symbol, "Manufacturer").is_none() {
            library.set_property(symbol, "Manufacturer", &name);
            output::success(format!("Added manufacturer: {name}"));
        }
    }
}

/// Move staged parts into a production library
fn cmd_accept(part_filter: Option<&str>, library: Option<&str>) -> Result<()> {
    let staging = config::staging_dir()?;
    let production = config::production_dir()?;
    let sym_file = staging.join(config::STAGING_SYMBOL_FILE);

    if !sym_file.exists() {
        output::info("Import parts first with: kicad-parts import <LCSC_ID>");
        return Err(Error::NoStagedParts);
    }

    let mut staged = SymbolLibrary::open(&sym_file)?;
    let all_parts = part::main_symbols(&staged.symbol_names());
    if all_parts.is_empty() {
        return Err(Error::NoStagedParts);
    }

    let selected: Vec<String> = match part_filter {
        Some(filter) => {
            let needle = filter.to_uppercase();
            let matched: Vec<String> = all_parts
                .iter()
                .filter(|name| {
                    name.to_uppercase().contains(&needle)
                        || staged
                            .property(name, "LCSC")
                            .is_some_and(|v| v.to_uppercase() == needle)
                })
                .cloned()
                .collect();
            if matched.is_empty() {
                output::info(format!("Available: {}", all_parts.join(", ")));
                return Err(Error::PartNotFound(filter.to_string()));
            }
            matched
        }
        None => all_parts.clone(),
    };
    output::info(format!("Parts to accept: {}", selected.join(", ")));

    let category = match library {
        Some(name) => name.to_string(),
        None => match kicad_parts_ui::pick_category()? {
            Some(name) => name,
            None => {
                output::info("Cancelled");
                return Ok(());
            }
        },
    };

    let lib_base = config::library_base(&category);
    let prod_sym = production.join(format!("{lib_base}.kicad_sym"));
    let prod_pretty = production.join(format!("{lib_base}.pretty"));
    let prod_3d = production.join(format!("{lib_base}.3dshapes"));

    output::info(format!("Moving to production library: {lib_base}"));
    fs::create_dir_all(&prod_pretty)?;
    fs::create_dir_all(&prod_3d)?;

    if !prod_sym.exists() {
        fs::write(&prod_sym, symbol::EMPTY_LIBRARY)?;
        output::success(format!("Created new library: {lib_base}.kicad_sym"));
    }

    let mut prod = SymbolLibrary::open(&prod_sym)?;
    for name in &selected {
        if let Some(text) = staged.extract_symbol(name) {
            prod.merge_symbol(&text);
            output::success(format!("Added symbol: {name}"));
        }
    }
    prod.save()?;

    for name in move_all_files(&staging.join(config::STAGING_FOOTPRINT_DIR), &prod_pretty)? {
        output::success(format!("Moved footprint: {name}"));
    }
    let models = move_all_files(&staging.join(config::STAGING_MODEL_DIR), &prod_3d)?;
    if !models.is_empty() {
        output::success(format!("Moved {} 3D model file(s)", models.len()));
    }

    let remaining: Vec<String> = all_parts
        .iter()
        .filter(|name| !selected.contains(name))
        .cloned()
        .collect();
    if remaining.is_empty() {
        // everything accepted: drop the staging set entirely
        fs::remove_file(&sym_file)?;
        let _ = fs::remove_dir_all(staging.join(config::STAGING_FOOTPRINT_DIR));
        let _ = fs::remove_dir_all(staging.join(config::STAGING_MODEL_DIR));
    } else {
        for name in &selected {
            staged.remove_symbol(name);
        }
        staged.save()?;
        output::info(format!("Remaining staged: {}", remaining.join(", ")));
    }

    register_libraries(&lib_base)?;

    println!();
    output::success("Parts moved to production library!");
    println!();
    output::info("Files updated:");
    println!("  Symbol:    {}", prod_sym.display());
    println!("  Footprint: {}/", prod_pretty.display());
    println!("  3D Models: {}/", prod_3d.display());
    println!();
    output::info(format!("Library '{lib_base}' is ready to use in KiCad"));
    Ok(())
}

/// List parts in production or staging libraries
fn cmd_list(verbose: bool, staging_only: bool) -> Result<()> {
    if staging_only {
        return list_staging(verbose);
    }

    let production = config::production_dir()?;
    let lib_files = production_libraries(&production)?;
    if lib_files.is_empty() {
        output::info("No parts libraries found");
        output::info(format!("Libraries are stored in: {}", production.display()));
        return Ok(());
    }

    let mut total = 0;
    for lib_file in &lib_files {
        let lib_name = stem(lib_file);
        let library = SymbolLibrary::open(lib_file)?;
        let parts = part::main_symbols(&library.symbol_names());
        if parts.is_empty() {
            continue;
        }

        output::heading(&lib_name);
        println!();
        for name in &parts {
            println!("  {}", name.as_str().green());
            if verbose {
                print_part_details(&library, name);
            } else {
                print_part_summary(&library, name);
            }
        }
        total += parts.len();
        println!();
    }
    output::info(format!(
        "Total: {total} part(s) across {} library/libraries",
        lib_files.len()
    ));
    Ok(())
}

fn list_staging(verbose: bool) -> Result<()> {
    let staging = config::staging_dir()?;
    let sym_file = staging.join(config::STAGING_SYMBOL_FILE);
    if !sym_file.exists() {
        output::info("No staged parts");
        output::info("Import parts with: kicad-parts import <LCSC_ID>");
        return Ok(());
    }

    let library = SymbolLibrary::open(&sym_file)?;
    let parts = part::main_symbols(&library.symbol_names());
    if parts.is_empty() {
        output::info("No staged parts");
        return Ok(());
    }

    output::heading("Staged Parts");
    println!();
    for name in &parts {
        println!("  {}", name.as_str().green());
        if verbose {
            for prop in ["LCSC", "MPN", "Manufacturer"] {
                if let Some(value) = library.property(name, prop) {
                    println!("    {prop}: {value}");
                }
            }
        }
    }
    println!();
    output::info(format!("Total: {} staged part(s)", parts.len()));
    output::info("Use 'kicad-parts accept' to move to production");
    Ok(())
}

fn print_part_details(library: &SymbolLibrary, name: &str) {
    for prop in ["LCSC", "MPN", "Manufacturer", "Digikey", "Mouser", "Datasheet"] {
        if let Some(value) = library.property(name, prop) {
            println!("    {prop}: {value}");
        }
    }
    for prop in ["Price_1", "Price_10", "Price_100", "Stock_Digikey", "Stock_Mouser"] {
        if let Some(value) = library.property(name, prop) {
            println!("    {prop}: {value}");
        }
    }
    println!();
}

fn print_part_summary(library: &SymbolLibrary, name: &str) {
    let mut summary = Vec::new();
    if let Some(lcsc) = library.property(name, "LCSC") {
        summary.push(format!("LCSC:{lcsc}"));
    }
    if let Some(manufacturer) = library.property(name, "Manufacturer") {
        summary.push(manufacturer);
    }
    if library.property(name, "Digikey").is_some() {
        summary.push("DK".into());
    }
    if library.property(name, "Mouser").is_some() {
        summary.push("M".into());
    }
    if !summary.is_empty() {
        println!("    {}", summary.join(" | ").cyan());
    }
}

/// Delete parts from production libraries
fn cmd_delete(part_name: Option<&str>, library: Option<&str>) -> Result<()> {
    let production = config::production_dir()?;
    let lib_files = production_libraries(&production)?;
    if lib_files.is_empty() {
        output::info("No parts libraries found");
        return Ok(());
    }

    // (display name, library path, symbol name)
    let mut all_parts: Vec<(String, PathBuf, String)> = Vec::new();
    for lib_file in &lib_files {
        let lib_name = stem(lib_file);
        let lib = SymbolLibrary::open(lib_file)?;
        for symbol_name in part::main_symbols(&lib.symbol_names()) {
            all_parts.push((format!("{lib_name}/{symbol_name}"), lib_file.clone(), symbol_name));
        }
    }
    if all_parts.is_empty() {
        output::info("No parts found in libraries");
        return Ok(());
    }

    if let Some(filter) = library {
        let lib_filter = if filter.ends_with(config::LIBRARY_SUFFIX) {
            filter.to_string()
        } else {
            config::library_base(filter)
        };
        all_parts.retain(|(_, path, _)| stem(path) == lib_filter);
        if all_parts.is_empty() {
            return Err(Error::Other(format!("No parts found in library: {lib_filter}")));
        }
    }

    let to_delete: Vec<(String, PathBuf, String)> = match part_name {
        Some(name) => {
            let matched: Vec<_> = all_parts
                .iter()
                .filter(|(display, _, symbol_name)| symbol_name == name || display == name)
                .cloned()
                .collect();
            if matched.is_empty() {
                return Err(Error::PartNotFound(name.to_string()));
            }
            matched
        }
        None => {
            let displays: Vec<String> = all_parts.iter().map(|(d, _, _)| d.clone()).collect();
            let chosen = kicad_parts_ui::pick_parts(&displays)?;
            if chosen.is_empty() {
                output::info("No parts selected");
                return Ok(());
            }
            all_parts
                .iter()
                .filter(|(display, _, _)| chosen.contains(display))
                .cloned()
                .collect()
        }
    };

    println!("{}", "Parts to delete:".yellow());
    for (display, _, _) in &to_delete {
        println!("  {display}");
    }
    println!();
    if !confirm(&format!("Delete {} part(s)?", to_delete.len()))? {
        output::info("Cancelled");
        return Ok(());
    }

    let mut by_library: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for (_, path, symbol_name) in &to_delete {
        by_library.entry(path.clone()).or_default().push(symbol_name.clone());
    }

    for (lib_path, symbols) in by_library {
        let lib_name = stem(&lib_path);
        let mut lib = SymbolLibrary::open(&lib_path)?;
        let pretty_dir = production.join(format!("{lib_name}.pretty"));
        let shapes_dir = production.join(format!("{lib_name}.3dshapes"));

        for symbol_name in &symbols {
            output::info(format!("Deleting {lib_name}/{symbol_name}..."));
            lib.remove_symbol(symbol_name);

            let fp_file = pretty_dir.join(format!("{symbol_name}.kicad_mod"));
            if fp_file.exists() {
                fs::remove_file(&fp_file)?;
                output::success(format!("Deleted footprint: {symbol_name}.kicad_mod"));
            }

            let mut deleted = 0;
            for ext in ["wrl", "step", "WRL", "STEP", "stp", "STP"] {
                let model = shapes_dir.join(format!("{symbol_name}.{ext}"));
                if model.exists() {
                    fs::remove_file(&model)?;
                    deleted += 1;
                }
            }
            if deleted > 0 {
                output::success(format!("Deleted {deleted} 3D model file(s)"));
            }
        }
        lib.save()?;
    }

    println!();
    output::success(format!("Deleted {} part(s)", to_delete.len()));
    Ok(())
}

/// Register the staging library set in KiCad's library tables
fn register_staging_libraries() -> Result<()> {
    let config_dir = config::kicad_config_dir()?;
    let staging = config::staging_dir()?;

    if tables::ensure_env_var(&config_dir, "KICAD_STAGING_LIBS", &staging.to_string_lossy())? {
        output::success("Added KICAD_STAGING_LIBS to KiCad configure paths");
    } else {
        output::info("KICAD_STAGING_LIBS already in KiCad configure paths");
    }

    // ${VAR} URIs keep the tables portable across machines
    let sym_uri = format!("${{KICAD_STAGING_LIBS}}/{}", config::STAGING_SYMBOL_FILE);
    let fp_uri = format!("${{KICAD_STAGING_LIBS}}/{}", config::STAGING_FOOTPRINT_DIR);
    register_table_entry(&config_dir.join(config::SYM_TABLE_FILE), "_staging", &sym_uri, "symbol")?;
    register_table_entry(&config_dir.join(config::FP_TABLE_FILE), "_staging", &fp_uri, "footprint")?;
    Ok(())
}

/// Register a production library pair in KiCad's library tables
fn register_libraries(lib_base: &str) -> Result<()> {
    let config_dir = config::kicad_config_dir()?;
    let production = config::production_dir()?;

    if tables::ensure_env_var(&config_dir, "KICAD_MY_LIBS", &production.to_string_lossy())? {
        output::success("Added KICAD_MY_LIBS to KiCad configure paths");
    } else {
        output::info("KICAD_MY_LIBS already in KiCad configure paths");
    }

    let sym_uri = format!("${{KICAD_MY_LIBS}}/{lib_base}.kicad_sym");
    let fp_uri = format!("${{KICAD_MY_LIBS}}/{lib_base}.pretty");
    register_table_entry(&config_dir.join(config::SYM_TABLE_FILE), lib_base, &sym_uri, "symbol")?;
    register_table_entry(&config_dir.join(config::FP_TABLE_FILE), lib_base, &fp_uri, "footprint")?;
    Ok(())
}

fn register_table_entry(table: &Path, name: &str, uri: &str, kind: &str) -> Result<()> {
    if tables::ensure_lib_in_table(table, name, uri)? {
        output::success(format!("Added {name} to {kind} library table"));
    } else {
        output::info(format!("{name} already in {kind} library table"));
    }
    Ok(())
}

/// All `*-JH.kicad_sym` library files in the production directory, sorted
fn production_libraries(production: &Path) -> Result<Vec<PathBuf>> {
    let suffix = format!("{}.kicad_sym", config::LIBRARY_SUFFIX);
    let mut files: Vec<PathBuf> = fs::read_dir(production)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(&suffix))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Move every regular file from `src` into `dst`, returning the moved names
fn move_all_files(src: &Path, dst: &Path) -> Result<Vec<String>> {
    let mut moved = Vec::new();
    if !src.exists() {
        return Ok(moved);
    }
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::rename(entry.path(), dst.join(entry.file_name()))?;
            moved.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    moved.sort();
    Ok(moved)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
