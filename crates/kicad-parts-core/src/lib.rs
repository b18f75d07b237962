pub mod config;
pub mod error;
pub mod part;
pub mod symbol;
pub mod tables;

// Re-export common items for convenience
pub use error::{Error, Result};
pub use part::{is_valid_lcsc_id, main_symbols, strip_unit_suffix};
pub use symbol::SymbolLibrary;
