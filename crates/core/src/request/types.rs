use serde::{Deserialize, Serialize};

use super::error::RequestError;
use super::window::BoundingWindow;
use crate::countries::{is_valid_code, CountryCatalog};

/// Body of `POST /maps/countries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapRequest {
    #[serde(default)]
    pub countries: Vec<CountrySelection>,
    #[serde(default)]
    pub continents: Vec<ContinentSelection>,
    #[serde(flatten)]
    pub window: BoundingWindow,
}

/// An explicitly selected country. Only `code` is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySelection {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CountrySelection {
    pub fn code(code: &str) -> Self {
        Self {
            code: code.to_string(),
            continent: None,
            name: None,
        }
    }
}

/// A continent whose every catalog country is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinentSelection {
    pub continent: String,
}

impl MapRequest {
    /// Validates the window and resolves the boundary attribute filter.
    pub fn resolve_filter(&self, catalog: &CountryCatalog) -> Result<String, RequestError> {
        self.window.validate()?;

        let explicit: Vec<String> = self.countries.iter().map(|c| c.code.clone()).collect();
        let continents: Vec<&str> = self
            .continents
            .iter()
            .map(|c| c.continent.as_str())
            .collect();
        let from_continents = catalog.codes_in_continents(&continents);

        build_country_filter(&explicit, &from_continents)
    }
}

/// Builds `adm0_a3 IN ('A','B',...)`.
///
/// Explicit codes come first, continent-derived codes after; duplicates are kept.
pub fn build_country_filter(
    explicit: &[String],
    from_continents: &[String],
) -> Result<String, RequestError> {
    if explicit.is_empty() && from_continents.is_empty() {
        return Err(RequestError::EmptySelection);
    }

    let mut quoted = Vec::with_capacity(explicit.len() + from_continents.len());
    for code in explicit.iter().chain(from_continents) {
        if !is_valid_code(code) {
            return Err(RequestError::InvalidCountryCode { code: code.clone() });
        }
        quoted.push(format!("'{}'", code));
    }

    Ok(format!("adm0_a3 IN ({})", quoted.join(",")))
}
