//! Lengths in points, with unit-suffixed parsing for document input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const POINTS_PER_INCH: f64 = 72.0;
const POINTS_PER_CM: f64 = POINTS_PER_INCH / 2.54;
const POINTS_PER_MM: f64 = POINTS_PER_CM / 10.0;

/// A length in points (1/72 inch).
///
/// Deserializes from a bare number (points) or a string with a unit suffix:
/// `"2.5cm"`, `"12mm"`, `"1in"`, `"14pt"`, `"14"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "f64")]
pub struct Length(pub f64);

impl Length {
    pub const ZERO: Length = Length(0.0);

    pub fn pt(v: f64) -> Self {
        Length(v)
    }

    pub fn cm(v: f64) -> Self {
        Length(v * POINTS_PER_CM)
    }

    pub fn mm(v: f64) -> Self {
        Length(v * POINTS_PER_MM)
    }

    pub fn inch(v: f64) -> Self {
        Length(v * POINTS_PER_INCH)
    }

    /// The length in points.
    pub fn points(self) -> f64 {
        self.0
    }
}

impl From<f64> for Length {
    fn from(v: f64) -> Self {
        Length(v)
    }
}

impl From<Length> for f64 {
    fn from(l: Length) -> Self {
        l.0
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", self.0)
    }
}

/// Error produced when a length string cannot be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid length `{0}`: expected a number with an optional pt, cm, mm or in suffix")]
pub struct ParseLengthError(String);

impl FromStr for Length {
    type Err = ParseLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| ParseLengthError(s.to_string()))?;
        if !value.is_finite() {
            return Err(ParseLengthError(s.to_string()));
        }
        match unit.trim().to_ascii_lowercase().as_str() {
            "" | "pt" => Ok(Length::pt(value)),
            "cm" => Ok(Length::cm(value)),
            "mm" => Ok(Length::mm(value)),
            "in" => Ok(Length::inch(value)),
            _ => Err(ParseLengthError(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Points(f64),
    Text(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = ParseLengthError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Points(v) => Ok(Length(v)),
            LengthRepr::Text(s) => s.parse(),
        }
    }
}
