use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use super::error::CatalogError;
use super::types::{is_valid_code, Country, CONTINENT_ORDER};

/// In-memory country catalog.
#[derive(Debug, Clone, Default)]
pub struct CountryCatalog {
    countries: Vec<Country>,
}

impl CountryCatalog {
    /// Builds a catalog, rejecting entries whose code is unusable in a filter.
    pub fn new(countries: Vec<Country>) -> Result<Self, CatalogError> {
        if let Some(bad) = countries.iter().find(|c| !is_valid_code(&c.code)) {
            return Err(CatalogError::InvalidCode {
                code: bad.code.clone(),
            });
        }
        Ok(Self { countries })
    }

    /// Loads the catalog from a JSON file.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(path, &raw)
    }

    fn from_json(path: &Path, raw: &str) -> Result<Self, CatalogError> {
        let countries: Vec<Country> =
            serde_json::from_str(raw).map_err(|e| CatalogError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!(count = countries.len(), path = %path.display(), "Parsed country catalog");
        Self::new(countries)
    }

    /// All entries in file order.
    pub fn all(&self) -> &[Country] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Codes of every country on one of `continents`, in catalog order.
    pub fn codes_in_continents(&self, continents: &[&str]) -> Vec<String> {
        let selected: HashSet<&str> = continents.iter().copied().collect();
        self.countries
            .iter()
            .filter(|c| selected.contains(c.continent.as_str()))
            .map(|c| c.code.clone())
            .collect()
    }

    /// Distinct continents, known ones first in display order.
    pub fn continents(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for country in &self.countries {
            if !seen.contains(&country.continent) {
                seen.push(country.continent.clone());
            }
        }
        seen.sort_by(|a, b| compare_continents(a, b));
        seen
    }

    /// Entries grouped by continent display order, then by name.
    pub fn sorted(&self) -> Vec<Country> {
        let mut countries = self.countries.clone();
        countries.sort_by(|a, b| {
            compare_continents(&a.continent, &b.continent).then_with(|| a.name.cmp(&b.name))
        });
        countries
    }
}

fn continent_rank(continent: &str) -> usize {
    CONTINENT_ORDER
        .iter()
        .position(|c| *c == continent)
        .unwrap_or(CONTINENT_ORDER.len())
}

fn compare_continents(a: &str, b: &str) -> Ordering {
    continent_rank(a)
        .cmp(&continent_rank(b))
        .then_with(|| a.cmp(b))
}
