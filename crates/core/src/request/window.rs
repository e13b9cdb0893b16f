use serde::{Deserialize, Deserializer, Serialize};

use super::error::RequestError;

/// A rectangular geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingWindow {
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub north: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub south: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub east: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub west: f64,
}

impl BoundingWindow {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Checks the window is finite, inside WGS84 bounds and not inverted.
    pub fn validate(&self) -> Result<(), RequestError> {
        for (field, value) in [
            ("north", self.north),
            ("south", self.south),
            ("east", self.east),
            ("west", self.west),
        ] {
            if !value.is_finite() {
                return Err(RequestError::InvalidCoordinate {
                    field,
                    value: value.to_string(),
                });
            }
        }

        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return Err(RequestError::InvalidWindow {
                reason: "latitude must be within -90..=90".to_string(),
            });
        }
        if !(-180.0..=180.0).contains(&self.east) || !(-180.0..=180.0).contains(&self.west) {
            return Err(RequestError::InvalidWindow {
                reason: "longitude must be within -180..=180".to_string(),
            });
        }
        if self.south >= self.north {
            return Err(RequestError::InvalidWindow {
                reason: format!("south ({}) must be below north ({})", self.south, self.north),
            });
        }
        if self.west >= self.east {
            return Err(RequestError::InvalidWindow {
                reason: format!("west ({}) must be left of east ({})", self.west, self.east),
            });
        }
        Ok(())
    }

    /// `north_west_east_south`, used to name published artifacts.
    pub fn slug(&self) -> String {
        format!("{}_{}_{}_{}", self.north, self.west, self.east, self.south)
    }

    /// Corner order expected by `-clipsrc` and `-projwin`: west, north, east, south.
    pub fn corner_args(&self) -> [String; 4] {
        [
            self.west.to_string(),
            self.north.to_string(),
            self.east.to_string(),
            self.south.to_string(),
        ]
    }
}

/// Accepts both JSON numbers and numeric strings.
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Number(f64),
        Text(String),
    }

    match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(n) => Ok(n),
        Coordinate::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_uses_shortest_formatting() {
        let window = BoundingWindow::new(50.0, 30.0, -60.0, -130.0);
        assert_eq!(window.slug(), "50_-130_-60_30");

        let window = BoundingWindow::new(47.25, 36.5, 18.5, 6.75);
        assert_eq!(window.slug(), "47.25_6.75_18.5_36.5");
    }

    #[test]
    fn test_corner_args_order() {
        let window = BoundingWindow::new(50.0, 30.0, -60.0, -130.0);
        assert_eq!(window.corner_args(), ["-130", "50", "-60", "30"]);
    }

    #[test]
    fn test_deserialize_strings_and_numbers() {
        let window: BoundingWindow = serde_json::from_str(
            r#"{"north": "50", "south": 30, "east": " -60.5 ", "west": -130}"#,
        )
        .unwrap();
        assert_eq!(window, BoundingWindow::new(50.0, 30.0, -60.5, -130.0));
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let result: Result<BoundingWindow, _> = serde_json::from_str(
            r#"{"north": "fifty", "south": 30, "east": -60, "west": -130}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_regular_window() {
        assert!(BoundingWindow::new(50.0, 30.0, -60.0, -130.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_latitudes() {
        let err = BoundingWindow::new(30.0, 50.0, -60.0, -130.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidWindow { .. }));
    }

    #[test]
    fn test_validate_rejects_inverted_longitudes() {
        assert!(BoundingWindow::new(50.0, 30.0, -130.0, -60.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(BoundingWindow::new(95.0, 30.0, -60.0, -130.0)
            .validate()
            .is_err());
        assert!(BoundingWindow::new(50.0, 30.0, 190.0, -130.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let err = BoundingWindow::new(f64::NAN, 30.0, -60.0, -130.0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidCoordinate { field: "north", .. }
        ));
    }
}
