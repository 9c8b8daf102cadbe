//! Règles par type de construction et résolution avec le règlement de zone
//!
//! La table est figée et exhaustive: chaque [`ConstructionType`] a exactement
//! une règle, obtenue par un `match`, sans recherche pouvant échouer.
//!
//! Pour les reculs, `None` signifie « s'en remettre au PLU » et `Some(0.0)`
//! « implantation en limite explicitement autorisée ». Les deux ne doivent
//! jamais être confondus.

pub mod coverage;

pub use coverage::{estimate_floor_area, ground_coverage, CoverageRatio, Footprint};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UrbanismeError;

/// Type de construction projetée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionType {
    MainHouse,
    Extension,
    Shed,
    Carport,
    Pool,
    Annex,
}

impl ConstructionType {
    pub const ALL: [ConstructionType; 6] = [
        Self::MainHouse,
        Self::Extension,
        Self::Shed,
        Self::Carport,
        Self::Pool,
        Self::Annex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainHouse => "main_house",
            Self::Extension => "extension",
            Self::Shed => "shed",
            Self::Carport => "carport",
            Self::Pool => "pool",
            Self::Annex => "annex",
        }
    }

    /// Règle associée au type
    pub fn rule(self) -> &'static ConstructionTypeRule {
        match self {
            Self::MainHouse => &MAIN_HOUSE,
            Self::Extension => &EXTENSION,
            Self::Shed => &SHED,
            Self::Carport => &CARPORT,
            Self::Pool => &POOL,
            Self::Annex => &ANNEX,
        }
    }
}

impl fmt::Display for ConstructionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstructionType {
    type Err = UrbanismeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UrbanismeError::InvalidInput(format!("unknown construction type: {s}")))
    }
}

/// Autorisation exigée au-delà du seuil de dispense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermitKind {
    #[serde(rename = "DP")]
    Dp,
    #[serde(rename = "PC")]
    Pc,
}

/// Reculs propres au type; `None` = s'en remettre au PLU
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetbackOverrides {
    pub front: Option<f64>,
    pub side: Option<f64>,
    pub rear: Option<f64>,
}

/// Règle statique d'un type de construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstructionTypeRule {
    pub setbacks: SetbackOverrides,

    /// Hauteur maximale à l'égout (m); ne peut que restreindre le PLU
    pub max_height: Option<f64>,

    /// Hauteur maximale au faîtage (m)
    pub max_ridge_height: Option<f64>,

    /// L'élément compte-t-il dans l'emprise au sol (CES)
    pub count_in_ces: bool,

    /// Surface jusqu'à laquelle aucune autorisation n'est requise (m²)
    pub exempt_up_to_m2: Option<f64>,

    pub permit_above_exempt: Option<PermitKind>,
}

const MAIN_HOUSE: ConstructionTypeRule = ConstructionTypeRule {
    setbacks: SetbackOverrides {
        front: None,
        side: None,
        rear: None,
    },
    max_height: None,
    max_ridge_height: None,
    count_in_ces: true,
    exempt_up_to_m2: None,
    permit_above_exempt: Some(PermitKind::Pc),
};

const EXTENSION: ConstructionTypeRule = ConstructionTypeRule {
    setbacks: SetbackOverrides {
        front: None,
        side: None,
        rear: None,
    },
    max_height: None,
    max_ridge_height: None,
    count_in_ces: true,
    exempt_up_to_m2: Some(5.0),
    permit_above_exempt: Some(PermitKind::Dp),
};

const SHED: ConstructionTypeRule = ConstructionTypeRule {
    setbacks: SetbackOverrides {
        front: None,
        side: Some(0.0),
        rear: Some(0.0),
    },
    max_height: Some(3.5),
    max_ridge_height: Some(3.5),
    count_in_ces: true,
    exempt_up_to_m2: Some(5.0),
    permit_above_exempt: Some(PermitKind::Dp),
};

const CARPORT: ConstructionTypeRule = ConstructionTypeRule {
    setbacks: SetbackOverrides {
        front: None,
        side: Some(0.0),
        rear: None,
    },
    max_height: Some(3.0),
    max_ridge_height: None,
    count_in_ces: true,
    exempt_up_to_m2: Some(5.0),
    permit_above_exempt: Some(PermitKind::Dp),
};

const POOL: ConstructionTypeRule = ConstructionTypeRule {
    setbacks: SetbackOverrides {
        front: Some(1.0),
        side: Some(1.0),
        rear: Some(1.0),
    },
    max_height: None,
    max_ridge_height: None,
    count_in_ces: false,
    exempt_up_to_m2: Some(10.0),
    permit_above_exempt: Some(PermitKind::Dp),
};

const ANNEX: ConstructionTypeRule = ConstructionTypeRule {
    setbacks: SetbackOverrides {
        front: None,
        side: Some(0.0),
        rear: None,
    },
    max_height: Some(4.0),
    max_ridge_height: Some(5.0),
    count_in_ces: true,
    exempt_up_to_m2: Some(5.0),
    permit_above_exempt: Some(PermitKind::Dp),
};

/// Limite concernée par un recul
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetbackDimension {
    Front,
    Side,
    Rear,
}

impl FromStr for SetbackDimension {
    type Err = UrbanismeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Self::Front),
            "side" => Ok(Self::Side),
            "rear" => Ok(Self::Rear),
            other => Err(UrbanismeError::InvalidInput(format!(
                "unknown setback dimension: {other}"
            ))),
        }
    }
}

/// Recul effectif: la valeur du type si elle est définie (y compris 0),
/// sinon celle du PLU
pub fn resolve_setback(
    dimension: SetbackDimension,
    construction_type: ConstructionType,
    plu_setback: f64,
) -> f64 {
    let overrides = construction_type.rule().setbacks;
    let value = match dimension {
        SetbackDimension::Front => overrides.front,
        SetbackDimension::Side => overrides.side,
        SetbackDimension::Rear => overrides.rear,
    };
    value.unwrap_or(plu_setback)
}

/// Hauteur maximale effective: la plus restrictive du type et du PLU
///
/// Contrairement aux reculs, le type ne peut jamais assouplir la hauteur du PLU.
pub fn resolve_max_height(construction_type: ConstructionType, plu_max_height: f64) -> f64 {
    match construction_type.rule().max_height {
        Some(type_max) => type_max.min(plu_max_height),
        None => plu_max_height,
    }
}

/// Autorisation requise pour un élément d'une surface donnée
///
/// `None` si la surface est sous le seuil de dispense du type.
pub fn permit_for_element(construction_type: ConstructionType, area_m2: f64) -> Option<PermitKind> {
    let rule = construction_type.rule();
    match rule.exempt_up_to_m2 {
        Some(exempt) if area_m2 <= exempt => None,
        _ => rule.permit_above_exempt,
    }
}

/// Règles de base d'une zone du PLU
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRules {
    /// Recul par rapport à la voie (m)
    pub front_setback: f64,

    /// Recul par rapport aux limites séparatives latérales (m)
    pub side_setback: f64,

    /// Recul par rapport au fond de parcelle (m)
    pub rear_setback: f64,

    /// Hauteur maximale (m)
    pub max_height: f64,

    /// Coefficient d'emprise au sol maximal (0..1), si réglementé
    #[serde(default)]
    pub max_ces: Option<f64>,
}

/// Règles effectives pour un type de construction dans une zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveRules {
    pub construction_type: ConstructionType,
    pub front_setback: f64,
    pub side_setback: f64,
    pub rear_setback: f64,
    pub max_height: f64,
    pub max_ridge_height: Option<f64>,
    pub count_in_ces: bool,
}

/// Résout en une fois les reculs et la hauteur d'un type dans une zone
pub fn resolve_setbacks(construction_type: ConstructionType, zone: &ZoneRules) -> EffectiveRules {
    let rule = construction_type.rule();
    EffectiveRules {
        construction_type,
        front_setback: resolve_setback(SetbackDimension::Front, construction_type, zone.front_setback),
        side_setback: resolve_setback(SetbackDimension::Side, construction_type, zone.side_setback),
        rear_setback: resolve_setback(SetbackDimension::Rear, construction_type, zone.rear_setback),
        max_height: resolve_max_height(construction_type, zone.max_height),
        max_ridge_height: rule.max_ridge_height,
        count_in_ces: rule.count_in_ces,
    }
}
