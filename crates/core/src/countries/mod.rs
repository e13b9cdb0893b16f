//! Country catalog used to resolve continent selections into country codes.
//!
//! The catalog is an operator-supplied JSON array of `{name, code, continent}`
//! entries. It backs `GET /maps/countries` and the attribute filter of the
//! first pipeline stage.

mod catalog;
mod error;
mod types;

pub use catalog::CountryCatalog;
pub use error::CatalogError;
pub use types::{is_valid_code, Country, CONTINENT_ORDER};
