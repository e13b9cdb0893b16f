use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Display order of continents in the catalog.
pub const CONTINENT_ORDER: [&str; 6] = [
    "Europe",
    "Asia",
    "North America",
    "South America",
    "Africa",
    "Oceania",
];

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{3}$").unwrap());

/// Returns true if `code` looks like an ISO-style `adm0_a3` code.
pub fn is_valid_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub code: String,
    pub continent: String,
}

impl Country {
    pub fn new(name: &str, code: &str, continent: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            continent: continent.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert!(is_valid_code("USA"));
        assert!(is_valid_code("KOS"));
        assert!(is_valid_code("B12"));
    }

    #[test]
    fn test_invalid_codes() {
        assert!(!is_valid_code("usa"));
        assert!(!is_valid_code("US"));
        assert!(!is_valid_code("USA'"));
        assert!(!is_valid_code("' OR 1=1 --"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_country_json_shape() {
        let country = Country::new("Italy", "ITA", "Europe");
        let json = serde_json::to_value(&country).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Italy", "code": "ITA", "continent": "Europe"})
        );
    }
}
