pub mod cache;
pub mod sheets;
pub mod types;

pub use cache::SheetCache;
pub use sheets::{GoogleSheetsSource, SheetSource};
pub use types::{RawTable, SheetKey};
