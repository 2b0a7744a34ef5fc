//! Unit-bearing text to numeric value conversion
//!
//! Design files store physical quantities as bare numbers in SI units. The
//! importer appends the unit before handing the text to a [`UnitConverter`],
//! which turns `"<number> <unit>"` into a canonical value: meters for lengths,
//! degrees for angles.

use crate::error::{Error, Result};

/// Converts a number with a unit suffix into a canonical value
///
/// Hosts with their own quantity system (for example a CAD kernel that works
/// in millimeters) implement this trait and install it through
/// [`ImportConfig::with_units`](crate::importer::ImportConfig::with_units).
pub trait UnitConverter: Send + Sync {
    /// Convert text such as `"12.5 m"` or `"3deg"` into a canonical value
    fn quantity(&self, text: &str) -> Result<f64>;
}

/// Content of a leaf tag interpreted as a length in meters
pub fn length(units: &dyn UnitConverter, content: &str) -> Result<f64> {
    units.quantity(&format!("{} m", content.trim()))
}

/// Content of a leaf tag interpreted as an angle in degrees
pub fn angle(units: &dyn UnitConverter, content: &str) -> Result<f64> {
    units.quantity(&format!("{} deg", content.trim()))
}

/// Length and angle units known to [`SiUnits`], with their factor to the
/// canonical unit. Longer suffixes come first so `mm` wins over `m`.
const UNIT_TABLE: &[(&str, f64)] = &[
    ("deg", 1.0),
    ("rad", 180.0 / std::f64::consts::PI),
    ("mm", 0.001),
    ("cm", 0.01),
    ("dm", 0.1),
    ("km", 1000.0),
    ("in", 0.0254),
    ("ft", 0.3048),
    ("m", 1.0),
    ("°", 1.0),
];

/// Default converter: SI lengths in meters, angles in degrees
#[derive(Debug, Clone, Copy, Default)]
pub struct SiUnits;

impl SiUnits {
    fn factor(unit: &str) -> Option<f64> {
        UNIT_TABLE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(unit))
            .map(|(_, factor)| *factor)
    }

    fn parse_number(number: &str, text: &str) -> Result<f64> {
        let value = number
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::parse_error_with_context("quantity", text, "number"))?;
        if !value.is_finite() {
            return Err(Error::parse_error_with_context(
                "quantity",
                text,
                "finite number",
            ));
        }
        Ok(value)
    }
}

impl UnitConverter for SiUnits {
    fn quantity(&self, text: &str) -> Result<f64> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::parse_error_with_context("quantity", text, "number"));
        }

        // "<number> <unit>"
        if let Some((number, unit)) = trimmed.rsplit_once(char::is_whitespace) {
            let factor = Self::factor(unit.trim()).ok_or_else(|| {
                Error::ParseError(format!("Unknown unit '{}' in '{}'", unit.trim(), text))
            })?;
            return Ok(Self::parse_number(number, text)? * factor);
        }

        // "<number><unit>" or a bare number
        for (unit, factor) in UNIT_TABLE {
            if let Some(number) = trimmed.strip_suffix(unit) {
                if !number.is_empty() {
                    return Ok(Self::parse_number(number, text)? * factor);
                }
            }
        }
        Self::parse_number(trimmed, text)
    }
}
