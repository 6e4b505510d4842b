pub mod summary;
pub mod transaction;

pub use summary::DailySummary;
pub use transaction::{Dimension, Transaction};
