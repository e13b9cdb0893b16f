//! Map generation request model.
//!
//! A request selects countries (explicitly or through whole continents) and a
//! bounding window. It resolves into the attribute filter used to crop the
//! admin boundaries and the window coordinates handed to the clipping stages.

mod error;
mod types;
mod window;

pub use error::RequestError;
pub use types::{build_country_filter, ContinentSelection, CountrySelection, MapRequest};
pub use window::BoundingWindow;
