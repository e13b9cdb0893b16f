//! Testing utilities and mock implementations for end-to-end tests.
//!
//! The mock runner stands in for the GIS and imaging binaries so a whole
//! pipeline run can be exercised on a temp directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use reliefmap_core::testing::{fixtures, MockToolRunner};
//!
//! let runner = Arc::new(MockToolRunner::new());
//! let config = fixtures::test_config(temp.path());
//! fixtures::seed_source_dir(&config).unwrap();
//! let pipeline = MapPipeline::new(&config, runner.clone(), Arc::new(fixtures::sample_catalog()));
//! ```

mod mock_tool_runner;

pub use mock_tool_runner::{MockToolRunner, DEFAULT_TOPOLOGY};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::Config;
    use crate::countries::{Country, CountryCatalog};
    use crate::request::{BoundingWindow, ContinentSelection, CountrySelection, MapRequest};

    /// A small catalog spanning several continents.
    pub fn sample_catalog() -> CountryCatalog {
        CountryCatalog::new(vec![
            Country::new("Canada", "CAN", "North America"),
            Country::new("United States of America", "USA", "North America"),
            Country::new("Mexico", "MEX", "North America"),
            Country::new("France", "FRA", "Europe"),
            Country::new("Japan", "JPN", "Asia"),
            Country::new("Brazil", "BRA", "South America"),
        ])
        .expect("sample catalog codes are valid")
    }

    /// The United States over North America: N 50, S 30, W -130, E -60.
    pub fn usa_request() -> MapRequest {
        MapRequest {
            countries: vec![CountrySelection::code("USA")],
            continents: vec![],
            window: BoundingWindow::new(50.0, 30.0, -60.0, -130.0),
        }
    }

    /// Every country of `continent` inside the given window.
    pub fn continent_request(continent: &str, window: BoundingWindow) -> MapRequest {
        MapRequest {
            countries: vec![],
            continents: vec![ContinentSelection {
                continent: continent.to_string(),
            }],
            window,
        }
    }

    /// Config rooted at `root`, with `original/`, `data/` and `public/` below it.
    pub fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.source_dir = root.join("original");
        config.paths.workspace_root = root.join("data");
        config.paths.public_dir = root.join("public");
        config.paths.catalog_file = root.join("countries.json");
        config
    }

    /// Creates placeholder source datasets so every stage finds its inputs.
    pub fn seed_source_dir(config: &Config) -> std::io::Result<()> {
        let dataset = &config.dataset;
        for relative in [
            &dataset.admin_boundaries,
            &dataset.rivers,
            &dataset.elevation,
        ] {
            let path = config.paths.source_dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, b"source")?;
        }
        Ok(())
    }
}
