//! Data models for ruleacquire.

mod entry;
mod product_line;
mod run_date;

pub use entry::{CatalogEntry, SelectionEntry};
pub use product_line::{IdScheme, ProductLine};
pub use run_date::RunDate;
