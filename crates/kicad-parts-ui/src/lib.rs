mod categories;
mod picker;

// Public API
pub use categories::KICAD_LIBRARY_CATEGORIES;
pub use picker::{pick_category, pick_parts};
