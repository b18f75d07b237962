pub mod digikey;
pub mod models;
pub mod mouser;

// Public API
pub use digikey::DigikeyClient;
pub use mouser::{parse_stock, MouserClient};
