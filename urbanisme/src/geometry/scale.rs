//! Conversion pixels du canevas ↔ mètres

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrbanismeError};

/// Échelle d'un plan dessiné, en pixels par mètre
///
/// Toujours fournie explicitement par l'appelant: aucune conversion n'applique
/// [`Scale::CANVAS_DEFAULT`] d'elle-même.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Scale(f64);

impl Scale {
    /// Convention des calculs génériques sur canevas (100 px = 1 m)
    pub const CANVAS_DEFAULT: Scale = Scale(100.0);

    /// Crée une échelle; refuse les valeurs nulles, négatives ou non finies
    pub fn new(pixels_per_meter: f64) -> Result<Self> {
        if pixels_per_meter.is_finite() && pixels_per_meter > 0.0 {
            Ok(Self(pixels_per_meter))
        } else {
            Err(UrbanismeError::InvalidScale(pixels_per_meter))
        }
    }

    pub fn pixels_per_meter(self) -> f64 {
        self.0
    }

    /// Longueur en mètres
    pub fn to_meters(self, pixels: f64) -> f64 {
        pixels / self.0
    }

    /// Aire en m² à partir d'une aire en px²
    pub fn to_square_meters(self, square_pixels: f64) -> f64 {
        square_pixels / (self.0 * self.0)
    }

    /// Aire en m² d'un polygone dessiné en pixels
    pub fn polygon_area_m2(self, points: &[Coord]) -> Result<f64> {
        super::polygon_area(points).map(|a| self.to_square_meters(a))
    }

    /// Longueur en mètres d'une polyligne dessinée en pixels
    pub fn polyline_length_m(self, points: &[Coord]) -> Result<f64> {
        super::polyline_length(points).map(|l| self.to_meters(l))
    }
}

impl TryFrom<f64> for Scale {
    type Error = UrbanismeError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Scale> for f64 {
    fn from(scale: Scale) -> f64 {
        scale.0
    }
}
