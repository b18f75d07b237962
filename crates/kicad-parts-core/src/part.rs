use std::collections::BTreeSet;

/// Check an LCSC part number: a `C` followed by digits, e.g. `C2040`
pub fn is_valid_lcsc_id(id: &str) -> bool {
    match id.strip_prefix('C') {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Strip the `_0` / `_0_1` suffixes easyeda2kicad appends to symbol names.
/// They identify KiCad sub-symbol units and are not part of the MPN.
pub fn strip_unit_suffix(name: &str) -> &str {
    let mut out = name;
    for _ in 0..2 {
        match out.rsplit_once('_') {
            Some((head, tail))
                if !head.is_empty()
                    && !tail.is_empty()
                    && tail.chars().all(|c| c.is_ascii_digit()) =>
            {
                out = head;
            }
            _ => break,
        }
    }
    out
}

/// Reduce a set of symbol names to the actual parts: a name like `X_0_1` is a
/// sub-symbol unit of `X` and is dropped whenever its parent is present.
pub fn main_symbols(names: &BTreeSet<String>) -> Vec<String> {
    names
        .iter()
        .filter(|name| !is_unit_of_any(name, names))
        .cloned()
        .collect()
}

fn is_unit_of_any(name: &str, names: &BTreeSet<String>) -> bool {
    names.iter().any(|parent| {
        name.len() > parent.len()
            && name.starts_with(parent.as_str())
            && name[parent.len()..]
                .strip_prefix('_')
                .is_some_and(|suffix| suffix.chars().all(|c| c.is_ascii_digit() || c == '_'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcsc_id_validation() {
        assert!(is_valid_lcsc_id("C2040"));
        assert!(is_valid_lcsc_id("C1"));
        assert!(!is_valid_lcsc_id("2040"));
        assert!(!is_valid_lcsc_id("C"));
        assert!(!is_valid_lcsc_id("C20A0"));
        assert!(!is_valid_lcsc_id("LCSC-C2040"));
    }

    #[test]
    fn test_strip_unit_suffix() {
        assert_eq!(strip_unit_suffix("STM32F103C8T6_0_1"), "STM32F103C8T6");
        assert_eq!(strip_unit_suffix("STM32F103C8T6_0"), "STM32F103C8T6");
        assert_eq!(strip_unit_suffix("STM32F103C8T6"), "STM32F103C8T6");
        // underscores followed by non-digits belong to the part number
        assert_eq!(strip_unit_suffix("ESP32_WROOM"), "ESP32_WROOM");
        assert_eq!(strip_unit_suffix("ESP32_WROOM_1"), "ESP32_WROOM");
    }

    #[test]
    fn test_main_symbols_drops_units() {
        let names: BTreeSet<String> = ["C2040", "C2040_0_1", "C2040_1_1", "R1002"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(main_symbols(&names), vec!["C2040", "R1002"]);
    }

    #[test]
    fn test_main_symbols_keeps_unrelated_underscores() {
        let names: BTreeSet<String> = ["ESP32_WROOM", "MCU_RT1060"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(main_symbols(&names), vec!["ESP32_WROOM", "MCU_RT1060"]);
    }
}
