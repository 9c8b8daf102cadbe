//! Emprise au sol (CES) et estimation de surface de plancher

use serde::{Deserialize, Serialize};

use super::ConstructionType;
use crate::error::{Result, UrbanismeError};

/// Part de la surface au sol retenue en surface de plancher par niveau
///
/// Approximation: environ 21 % sont perdus sous 1,80 m de hauteur et dans
/// les trémies d'escalier. Ce n'est pas une mesure de géomètre.
pub const FLOOR_AREA_COEFFICIENT: f64 = 0.79;

/// Estimation de la surface de plancher créée: `sol × niveaux × 0,79`
pub fn estimate_floor_area(ground_area: f64, levels: u32) -> f64 {
    ground_area * f64::from(levels) * FLOOR_AREA_COEFFICIENT
}

/// Emprise d'un élément du plan de masse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub construction_type: ConstructionType,

    /// Surface au sol (m²)
    pub area: f64,
}

/// Résultat du calcul d'emprise au sol
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageRatio {
    /// Surface comptée dans le CES (m²)
    pub counted_area: f64,

    /// Surface d'éléments non comptés (piscines, ...) (m²)
    pub excluded_area: f64,

    pub parcel_area: f64,

    /// `counted_area / parcel_area`
    pub ratio: f64,

    pub max_ces: Option<f64>,

    /// `None` si le CES n'est pas réglementé dans la zone
    pub within_limit: Option<bool>,
}

/// Calcule le coefficient d'emprise au sol des éléments d'un projet
///
/// # Errors
///
/// `InvalidInput` si la surface de parcelle n'est pas strictement positive ou
/// si une emprise est négative.
pub fn ground_coverage(
    elements: &[Footprint],
    parcel_area: f64,
    max_ces: Option<f64>,
) -> Result<CoverageRatio> {
    if !(parcel_area.is_finite() && parcel_area > 0.0) {
        return Err(UrbanismeError::InvalidInput(format!(
            "parcel area must be strictly positive, got {parcel_area}"
        )));
    }

    if let Some(bad) = elements.iter().find(|e| !(e.area.is_finite() && e.area >= 0.0)) {
        return Err(UrbanismeError::InvalidInput(format!(
            "footprint area must be positive, got {} for {}",
            bad.area, bad.construction_type
        )));
    }

    let (counted_area, excluded_area) = elements.iter().fold((0.0, 0.0), |(counted, excluded), e| {
        if e.construction_type.rule().count_in_ces {
            (counted + e.area, excluded)
        } else {
            (counted, excluded + e.area)
        }
    });

    let ratio = counted_area / parcel_area;

    Ok(CoverageRatio {
        counted_area,
        excluded_area,
        parcel_area,
        ratio,
        max_ces,
        within_limit: max_ces.map(|max| ratio <= max),
    })
}
