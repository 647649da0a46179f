use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::domain::distance;
use crate::utils::error::{InviteError, Result};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    latitude: Decimal,
    longitude: Decimal,
}

impl Coordinate {
    pub fn new(latitude: &str, longitude: &str) -> Result<Self> {
        let latitude = parse_decimal(latitude)
            .map_err(|e| InviteError::invalid_argument(format!("invalid latitude ({})", latitude), e))?;

        let longitude = parse_decimal(longitude)
            .map_err(|e| InviteError::invalid_argument(format!("invalid longitude ({})", longitude), e))?;

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn from_decimals(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn dublin() -> Self {
        Self::from_decimals(Decimal::new(53_339_428, 6), Decimal::new(-6_257_664, 6))
    }

    /// Resolves a well-known location identifier, as used by the `base_location` setting.
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dublin" => Some(Self::dublin()),
            _ => None,
        }
    }

    pub fn latitude(&self) -> Decimal {
        self.latitude
    }

    pub fn longitude(&self) -> Decimal {
        self.longitude
    }

    /// Great-circle distance in kilometers.
    pub fn distance_to(&self, other: &Coordinate) -> Decimal {
        distance::distance(self, other)
    }
}

/// Parses a plain decimal number: optional sign, digits with at most one point, optional exponent.
/// Padding and digit separators are rejected.
fn parse_decimal(value: &str) -> std::result::Result<Decimal, String> {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    let re = DECIMAL.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
    });

    if !re.is_match(value) {
        return Err(format!("'{}' is not a decimal number", value));
    }

    let parsed = if value.contains(['e', 'E']) {
        Decimal::from_scientific(value)
    } else {
        Decimal::from_str(value)
    };
    parsed.map_err(|e| e.to_string())
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}
