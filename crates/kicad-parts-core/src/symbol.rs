use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Skeleton for a brand-new library file.
pub const EMPTY_LIBRARY: &str = "(kicad_symbol_lib\n  (version 20231120)\n  (generator \"kicad-parts\")\n  (generator_version \"1.0\")\n)\n";

/// Line-oriented editor for `.kicad_sym` symbol library files.
///
/// Symbol libraries are nested s-expression text maintained by KiCad itself,
/// by easyeda2kicad, and occasionally by hand. The editor deliberately does
/// not build a syntax tree: it classifies lines by parenthesis depth and
/// rewrites only the lines it has to, so every byte outside the edited span
/// survives a save untouched. All changes stay in memory until `save()`.
pub struct SymbolLibrary {
    path: PathBuf,
    lines: Vec<String>,
}

/// A property located inside a symbol block. Covers both the inline
/// `(property "Key" "Value" ...)` form and the split form where the key and
/// value sit on their own lines below `(property`.
struct PropertySite {
    key: String,
    value: String,
    /// Line holding the quoted value token.
    value_line: usize,
    /// Byte range of the quoted value token within that line, quotes included.
    value_range: Range<usize>,
    /// Line opening the property block.
    start: usize,
}

impl SymbolLibrary {
    /// Open a library file, or start an empty buffer when it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        Ok(Self::from_content(path, content))
    }

    fn from_content(path: PathBuf, content: String) -> Self {
        Self {
            path,
            lines: content.split('\n').map(String::from).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full buffer as it would be written to disk
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Overwrite the backing file with the buffer, verbatim
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.content())?;
        Ok(())
    }

    /// Distinct names of all symbol openings whose name contains no colon.
    /// Sub-symbol units (`X_0_1`) count; see `part::main_symbols` to reduce
    /// the set to actual parts.
    pub fn symbol_names(&self) -> BTreeSet<String> {
        self.lines
            .iter()
            .filter_map(|line| Self::symbol_open(line))
            .filter(|name| !name.contains(':'))
            .collect()
    }

    /// Value of a property inside the named main symbol's block. Keys match
    /// case-insensitively; absent symbol or key yields None.
    pub fn property(&self, symbol: &str, key: &str) -> Option<String> {
        let span = self.main_symbol_span(symbol)?;
        let folded = key.to_ascii_lowercase();
        self.properties_in(span)
            .into_iter()
            .find(|site| site.key.to_ascii_lowercase() == folded)
            .map(|site| site.value)
    }

    /// Set a property on the named main symbol. An existing property (matched
    /// case-insensitively, original key casing kept) has its value token
    /// rewritten in place; otherwise a new property block is inserted after
    /// the last property in the block, before the first sub-symbol unit.
    /// Values are escaped for embedded quotes and backslashes. When the
    /// symbol cannot be located this is a silent no-op.
    pub fn set_property(&mut self, symbol: &str, key: &str, value: &str) {
        let Some(span) = self.main_symbol_span(symbol) else {
            return;
        };
        let folded = key.to_ascii_lowercase();
        let existing = self
            .properties_in(span.clone())
            .into_iter()
            .find(|site| site.key.to_ascii_lowercase() == folded);
        match existing {
            Some(site) => {
                let line = &self.lines[site.value_line];
                let mut updated = String::with_capacity(line.len());
                updated.push_str(&line[..site.value_range.start]);
                updated.push('"');
                updated.push_str(&Self::escape(value));
                updated.push('"');
                updated.push_str(&line[site.value_range.end..]);
                self.lines[site.value_line] = updated;
            }
            None => self.insert_property(span, key, value),
        }
    }

    /// Verbatim text of the symbol's balanced block(s): the exact name plus
    /// any `name:`-prefixed derived entries. None when nothing matches.
    pub fn extract_symbol(&self, symbol: &str) -> Option<String> {
        let ranges = self.symbol_ranges(symbol);
        if ranges.is_empty() {
            return None;
        }
        let text: Vec<&str> = ranges
            .into_iter()
            .flatten()
            .map(|i| self.lines[i].as_str())
            .collect();
        Some(text.join("\n"))
    }

    /// Delete every line of the symbol's balanced block(s), matched like
    /// `extract_symbol`. All other lines stay untouched and contiguous.
    pub fn remove_symbol(&mut self, symbol: &str) {
        for range in self.symbol_ranges(symbol).into_iter().rev() {
            self.lines.drain(range);
        }
    }

    /// Splice extracted symbol text in just before the library's final
    /// closing parenthesis. No-op on a buffer that does not end with one.
    pub fn merge_symbol(&mut self, symbol_text: &str) {
        let mut content = self.content();
        let trimmed = content.trim_end();
        if !trimmed.ends_with(')') {
            return;
        }
        content.truncate(trimmed.len() - 1);
        content.push_str(symbol_text);
        content.push_str("\n)\n");
        self.lines = content.split('\n').map(String::from).collect();
    }

    /// If the line opens a symbol block, return the quoted symbol name
    fn symbol_open(line: &str) -> Option<String> {
        let rest = line.trim_start().strip_prefix("(symbol")?.trim_start();
        if !rest.starts_with('"') {
            return None;
        }
        Self::quoted_at(rest, 0).map(|(name, _)| name)
    }

    /// Net parenthesis depth change contributed by one line. Parens inside
    /// quoted strings count too; the grammar never splits structural parens
    /// across string content, so the heuristic holds for well-formed files.
    fn depth_delta(line: &str) -> i32 {
        line.chars().fold(0, |depth, c| match c {
            '(' => depth + 1,
            ')' => depth - 1,
            _ => depth,
        })
    }

    /// Index one past the last line of the balanced block opened at `start`.
    /// Unbalanced input runs to end of buffer instead of erroring.
    fn block_end(&self, start: usize) -> usize {
        let mut depth = 0i32;
        for (i, line) in self.lines.iter().enumerate().skip(start) {
            depth += Self::depth_delta(line);
            if depth <= 0 {
                return i + 1;
            }
        }
        self.lines.len()
    }

    /// Line range of the main symbol block with this exact name
    fn main_symbol_span(&self, symbol: &str) -> Option<Range<usize>> {
        let start = self
            .lines
            .iter()
            .position(|line| Self::symbol_open(line).as_deref() == Some(symbol))?;
        Some(start..self.block_end(start))
    }

    /// Balanced block ranges opened by the exact name or a `name:`-prefixed
    /// derived entry, in buffer order
    fn symbol_ranges(&self, symbol: &str) -> Vec<Range<usize>> {
        let prefix = format!("{symbol}:");
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < self.lines.len() {
            let matched = Self::symbol_open(&self.lines[i])
                .is_some_and(|name| name == symbol || name.starts_with(&prefix));
            if matched {
                let end = self.block_end(i);
                ranges.push(i..end);
                i = end;
            } else {
                i += 1;
            }
        }
        ranges
    }

    /// Locate every property inside `span`. The first quoted token of a
    /// property block is its key, the second its value, wherever the lines
    /// break between them.
    fn properties_in(&self, span: Range<usize>) -> Vec<PropertySite> {
        let mut sites = Vec::new();
        let mut i = span.start;
        while i < span.end {
            let Some(open) = self.lines[i].find("(property") else {
                i += 1;
                continue;
            };
            let start = i;
            let end = self.block_end(start).min(span.end);
            let mut key: Option<String> = None;
            let mut line_no = start;
            let mut cursor = open;
            while line_no < end {
                match Self::quoted_at(&self.lines[line_no], cursor) {
                    Some((text, range)) => match key.take() {
                        None => {
                            key = Some(text);
                            cursor = range.end;
                        }
                        Some(key) => {
                            sites.push(PropertySite {
                                key,
                                value: text,
                                value_line: line_no,
                                value_range: range,
                                start,
                            });
                            break;
                        }
                    },
                    None => {
                        line_no += 1;
                        cursor = 0;
                    }
                }
            }
            i = end.max(start + 1);
        }
        sites
    }

    /// Insert a freshly synthesized property block into the main symbol span,
    /// after its last property and before its first sub-symbol unit
    fn insert_property(&mut self, span: Range<usize>, key: &str, value: &str) {
        let sub_start = (span.start + 1..span.end)
            .find(|&i| Self::symbol_open(&self.lines[i]).is_some())
            .unwrap_or(span.end);
        let insert_at = self
            .properties_in(span.start..sub_start)
            .last()
            .map(|site| self.block_end(site.start))
            .unwrap_or(span.start + 1);
        let id = self.next_property_id();
        let block = [
            "    (property".to_string(),
            format!("      \"{}\"", Self::escape(key)),
            format!("      \"{}\"", Self::escape(value)),
            format!("      (id {id})"),
            "      (at 0 0 0)".to_string(),
            "      (effects (font (size 1.27 1.27) ) hide)".to_string(),
            "    )".to_string(),
        ];
        self.lines.splice(insert_at..insert_at, block);
    }

    /// One greater than the largest `(id N)` anywhere in the file
    fn next_property_id(&self) -> u32 {
        self.lines
            .iter()
            .filter_map(|line| Self::property_id(line))
            .max()
            .map_or(1, |id| id + 1)
    }

    fn property_id(line: &str) -> Option<u32> {
        let at = line.find("(id ")?;
        let digits: String = line[at + 4..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Parse the first quoted string at or after byte offset `from`, honoring
    /// backslash escapes. Returns the unescaped content and the byte range of
    /// the whole token, quotes included.
    fn quoted_at(line: &str, from: usize) -> Option<(String, Range<usize>)> {
        let start = from + line[from..].find('"')?;
        let mut value = String::new();
        let mut escaped = false;
        for (offset, c) in line[start + 1..].char_indices() {
            if escaped {
                value.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                return Some((value, start..start + 1 + offset + 1));
            } else {
                value.push(c);
            }
        }
        None
    }

    fn escape(value: &str) -> String {
        value.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // Shape matches easyeda2kicad output: split-form properties with ids and
    // a nested sub-symbol unit, plus a second symbol using the inline form.
    const FIXTURE: &str = r#"(kicad_symbol_lib
  (version 20211014)
  (generator https://github.com/uPesy/easyeda2kicad.py)
  (symbol "C2040"
    (in_bom yes)
    (on_board yes)
    (property
      "Reference"
      "U"
      (id 0)
      (at -7.62 16.51 0)
      (effects (font (size 1.27 1.27) ) )
    )
    (property
      "Value"
      "STM32F103C8T6"
      (id 1)
      (at -7.62 13.97 0)
      (effects (font (size 1.27 1.27) ) )
    )
    (property
      "LCSC"
      "C2040"
      (id 2)
      (at 0 0 0)
      (effects (font (size 1.27 1.27) ) hide)
    )
    (symbol "C2040_0_1"
      (rectangle (start -7.62 -12.7) (end 7.62 12.7)
        (stroke (width 0.254) (type default)) (fill (type background))
      )
      (pin bidirectional line (at -10.16 10.16 0) (length 2.54)
        (name "PA0" (effects (font (size 1.27 1.27))))
        (number "10" (effects (font (size 1.27 1.27))))
      )
    )
  )
  (symbol "R1002"
    (property "Reference" "R" (id 3) (at 0.762 0.508 0) (effects (font (size 1.27 1.27))))
    (property "Tolerance" "1%" (id 4) (at 0 0 0) (effects (font (size 1.27 1.27)) hide))
    (symbol "R1002_0_1"
      (rectangle (start -1.016 -2.54) (end 1.016 2.54)
        (stroke (width 0.254) (type default)) (fill (type none))
      )
    )
  )
)
"#;

    fn library(content: &str) -> SymbolLibrary {
        SymbolLibrary::from_content(PathBuf::from("test.kicad_sym"), content.to_string())
    }

    #[test]
    fn test_symbol_names() {
        let lib = library(FIXTURE);
        let names = lib.symbol_names();
        assert!(names.contains("C2040"));
        assert!(names.contains("C2040_0_1"));
        assert!(names.contains("R1002"));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_symbol_names_excludes_derived() {
        let lib = library(
            "(kicad_symbol_lib\n  (symbol \"A\"\n    (in_bom yes)\n  )\n  (symbol \"A:alt\"\n    (in_bom yes)\n  )\n)\n",
        );
        let names = lib.symbol_names();
        assert!(names.contains("A"));
        assert!(!names.contains("A:alt"));
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_get_property_split_form() {
        let lib = library(FIXTURE);
        assert_eq!(lib.property("C2040", "Reference").as_deref(), Some("U"));
        assert_eq!(lib.property("C2040", "LCSC").as_deref(), Some("C2040"));
    }

    #[test]
    fn test_get_property_inline_form() {
        let lib = library(FIXTURE);
        assert_eq!(lib.property("R1002", "Tolerance").as_deref(), Some("1%"));
    }

    #[test]
    fn test_get_property_case_insensitive() {
        let lib = library(FIXTURE);
        assert_eq!(lib.property("C2040", "reference").as_deref(), Some("U"));
        assert_eq!(lib.property("R1002", "TOLERANCE").as_deref(), Some("1%"));
    }

    #[test]
    fn test_get_property_missing_is_none() {
        let lib = library(FIXTURE);
        assert_eq!(lib.property("C2040", "Nonexistent"), None);
        assert_eq!(lib.property("NoSuchSymbol", "Reference"), None);
    }

    #[test]
    fn test_get_property_scoped_to_symbol() {
        let lib = library(FIXTURE);
        // Tolerance belongs to R1002 only
        assert_eq!(lib.property("C2040", "Tolerance"), None);
        assert_eq!(lib.property("R1002", "Value"), None);
    }

    #[test]
    fn test_set_property_rewrites_value_line_only() {
        let mut lib = library(FIXTURE);
        let before: Vec<String> = lib.lines.clone();
        lib.set_property("C2040", "Value", "STM32F103C8T7");
        let after = &lib.lines;
        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(after[changed[0]], "      \"STM32F103C8T7\"");
        assert_eq!(lib.property("C2040", "Value").as_deref(), Some("STM32F103C8T7"));
    }

    #[test]
    fn test_set_property_inline_keeps_rest_of_line() {
        let mut lib = library(FIXTURE);
        lib.set_property("R1002", "Tolerance", "5%");
        let line = lib
            .lines
            .iter()
            .find(|l| l.contains("\"Tolerance\""))
            .unwrap();
        assert_eq!(
            line,
            "    (property \"Tolerance\" \"5%\" (id 4) (at 0 0 0) (effects (font (size 1.27 1.27)) hide))"
        );
    }

    #[test]
    fn test_set_property_case_insensitive_keeps_original_key() {
        let mut lib = library(FIXTURE);
        lib.set_property("C2040", "lcsc", "C9999");
        assert_eq!(lib.property("C2040", "LCSC").as_deref(), Some("C9999"));
        // the stored key casing is untouched
        assert!(lib.content().contains("\"LCSC\""));
        assert!(!lib.content().contains("\"lcsc\""));
    }

    #[test]
    fn test_set_property_inserts_before_sub_symbol() {
        let mut lib = library(FIXTURE);
        lib.set_property("C2040", "MPN", "STM32F103C8T6");
        assert_eq!(lib.property("C2040", "MPN").as_deref(), Some("STM32F103C8T6"));
        let mpn_line = lib.lines.iter().position(|l| l.contains("\"MPN\"")).unwrap();
        let sub_line = lib
            .lines
            .iter()
            .position(|l| l.contains("(symbol \"C2040_0_1\""))
            .unwrap();
        assert!(mpn_line < sub_line);
        // ids 0..=4 exist in the fixture, so the new block gets id 5
        assert!(lib.content().contains("(id 5)"));
    }

    #[test]
    fn test_set_property_new_id_is_max_plus_one() {
        let mut lib = library(FIXTURE);
        lib.set_property("R1002", "LCSC", "C25804");
        assert!(lib.content().contains("(id 5)"));
        lib.set_property("R1002", "MPN", "0603WAF1001T5E");
        assert!(lib.content().contains("(id 6)"));
    }

    #[test]
    fn test_set_property_idempotent() {
        let mut lib = library(FIXTURE);
        lib.set_property("C2040", "MPN", "STM32F103C8T6");
        let once = lib.content();
        lib.set_property("C2040", "MPN", "STM32F103C8T6");
        let twice = lib.content();
        assert_eq!(once, twice);
        lib.set_property("C2040", "MPN", "STM32F103C8T6");
        assert_eq!(twice, lib.content());
    }

    #[test]
    fn test_set_property_unknown_symbol_is_noop() {
        let mut lib = library(FIXTURE);
        let before = lib.content();
        lib.set_property("NoSuchSymbol", "MPN", "X");
        assert_eq!(before, lib.content());
    }

    #[test]
    fn test_set_property_leaves_other_symbols_untouched() {
        let mut lib = library(FIXTURE);
        let other_before = lib.extract_symbol("R1002").unwrap();
        lib.set_property("C2040", "Datasheet", "https://example.com/ds.pdf");
        assert_eq!(lib.extract_symbol("R1002").unwrap(), other_before);
    }

    #[test]
    fn test_value_escaping_round_trips() {
        let mut lib = library(FIXTURE);
        let value = r#"10k "E96" series \ 0603"#;
        lib.set_property("R1002", "Note", value);
        assert_eq!(lib.property("R1002", "Note").as_deref(), Some(value));
        assert!(lib.content().contains(r#"10k \"E96\" series \\ 0603"#));
    }

    #[test]
    fn test_remove_symbol_takes_units_along() {
        let mut lib = library(FIXTURE);
        lib.remove_symbol("C2040");
        let names = lib.symbol_names();
        assert!(!names.contains("C2040"));
        assert!(!names.contains("C2040_0_1"));
        assert!(names.contains("R1002"));
    }

    #[test]
    fn test_remove_symbol_preserves_other_blocks() {
        let mut lib = library(FIXTURE);
        let kept = lib.extract_symbol("R1002").unwrap();
        lib.remove_symbol("C2040");
        assert_eq!(lib.extract_symbol("R1002").unwrap(), kept);
        // the buffer still parses as one balanced file
        assert_eq!(lib.lines.iter().map(|l| SymbolLibrary::depth_delta(l)).sum::<i32>(), 0);
    }

    #[test]
    fn test_remove_symbol_with_derived_entries() {
        let mut lib = library(
            "(kicad_symbol_lib\n  (symbol \"A\"\n    (in_bom yes)\n  )\n  (symbol \"A:alt\"\n    (in_bom yes)\n  )\n)\n",
        );
        lib.remove_symbol("A");
        assert!(lib.symbol_names().is_empty());
        assert!(!lib.content().contains("A:alt"));
    }

    #[test]
    fn test_extract_symbol_is_verbatim() {
        let lib = library(FIXTURE);
        let text = lib.extract_symbol("C2040").unwrap();
        assert!(text.starts_with("  (symbol \"C2040\""));
        assert!(text.ends_with("  )"));
        assert!(text.contains("(symbol \"C2040_0_1\""));
        assert!(FIXTURE.contains(&text));
    }

    #[test]
    fn test_extract_missing_symbol_is_none() {
        let lib = library(FIXTURE);
        assert_eq!(lib.extract_symbol("NoSuchSymbol"), None);
    }

    #[test]
    fn test_merge_extracted_symbol_keeps_properties() {
        let source = library(FIXTURE);
        let text = source.extract_symbol("C2040").unwrap();

        let mut target = library(EMPTY_LIBRARY);
        target.merge_symbol(&text);
        assert_eq!(target.property("C2040", "Reference").as_deref(), Some("U"));
        assert_eq!(target.property("C2040", "Value").as_deref(), Some("STM32F103C8T6"));
        assert_eq!(target.property("C2040", "LCSC").as_deref(), Some("C2040"));
        assert_eq!(
            target.lines.iter().map(|l| SymbolLibrary::depth_delta(l)).sum::<i32>(),
            0
        );
    }

    #[test]
    fn test_merge_into_empty_buffer_is_noop() {
        let mut lib = library("");
        lib.merge_symbol("  (symbol \"X\"\n  )");
        assert_eq!(lib.content(), "");
    }

    #[test]
    fn test_unclosed_block_extends_to_end_of_buffer() {
        // the last symbol never closes and the library paren is missing
        let mut lib = library(
            "(kicad_symbol_lib\n  (symbol \"A\"\n    (in_bom yes)\n  )\n  (symbol \"Broken\"\n    (in_bom yes)\n",
        );
        let a_before = lib.extract_symbol("A").unwrap();

        let text = lib.extract_symbol("Broken").unwrap();
        assert!(text.starts_with("  (symbol \"Broken\""));
        assert!(text.contains("(in_bom yes)"));

        lib.set_property("Broken", "LCSC", "C1");
        assert_eq!(lib.property("Broken", "LCSC").as_deref(), Some("C1"));
        assert_eq!(lib.extract_symbol("A").unwrap(), a_before);

        lib.remove_symbol("Broken");
        assert!(!lib.content().contains("Broken"));
        assert_eq!(lib.extract_symbol("A").unwrap(), a_before);
        let names = lib.symbol_names();
        assert!(names.contains("A"));
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_import_scenario() {
        // one staged symbol with an LCSC property gains an MPN
        let mut lib = library(FIXTURE);
        lib.remove_symbol("R1002");
        lib.set_property("C2040", "MPN", "STM32F103");
        assert_eq!(lib.property("C2040", "MPN").as_deref(), Some("STM32F103"));
        assert!(lib.content().contains("(id 3)"));
    }
}
