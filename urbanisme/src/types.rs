//! Types de données pour le crate urbanisme

use geo::{Coord, Geometry};
use serde::{Serialize, Serializer};

/// Une parcelle cadastrale telle que renvoyée par la recherche cadastrale
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelGeometry {
    /// Identifiant (IDU, ou identifiant composite après fusion)
    pub id: String,

    /// Code de section (ex: "AB")
    pub section: String,

    /// Numéro de parcelle (ex: "0123"), `"merged"` après une fusion
    pub number: String,

    /// Contenance officielle en m² (fait foi, n'est pas recalculée)
    pub area: Option<f64>,

    /// Géométrie Polygon ou MultiPolygon en `[lon, lat]`; absente si la
    /// recherche de la géométrie a échoué
    pub geometry: Option<Geometry>,

    /// Code INSEE de la commune
    pub commune: String,
}

impl ParcelGeometry {
    /// Crée une parcelle sans contenance ni commune
    pub fn new(id: impl Into<String>, geometry: Option<Geometry>) -> Self {
        Self {
            id: id.into(),
            section: String::new(),
            number: String::new(),
            area: None,
            geometry,
            commune: String::new(),
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_reference(mut self, section: impl Into<String>, number: impl Into<String>) -> Self {
        self.section = section.into();
        self.number = number.into();
        self
    }
}

/// Propriétés d'une parcelle fusionnée (sac `properties` du Feature GeoJSON)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedProperties {
    /// Identifiants sources joints par `+`
    pub id: String,

    /// Sections distinctes jointes par `+`
    pub section: String,

    /// `"merged"` pour une vraie fusion, numéro d'origine sinon
    pub number: String,

    /// Aire de la géométrie fusionnée, arrondie au m²
    pub area: f64,

    pub merged: bool,

    /// Parcelles effectivement intégrées à la géométrie
    pub source_parcel_ids: Vec<String>,

    pub source_count: usize,

    /// Parcelles écartées (géométrie absente, invalide, ou union en échec)
    pub skipped_count: usize,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub commune: String,
}

/// Résultat de la fusion de parcelles
#[derive(Debug, Clone, PartialEq)]
pub struct MergedParcel {
    pub geometry: Geometry,
    pub properties: MergedProperties,
}

/// Position d'une limite de parcelle par rapport à la voie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeType {
    #[serde(rename = "front")]
    Front,
    #[serde(rename = "side-left")]
    SideLeft,
    #[serde(rename = "side-right")]
    SideRight,
    #[serde(rename = "rear")]
    Rear,
}

impl EdgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::SideLeft => "side-left",
            Self::SideRight => "side-right",
            Self::Rear => "rear",
        }
    }

    pub fn is_side(self) -> bool {
        matches!(self, Self::SideLeft | Self::SideRight)
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Un segment du contour extérieur d'une parcelle, classé
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryEdge {
    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    #[serde(serialize_with = "serialize_position")]
    pub start_point: Coord,

    #[serde(serialize_with = "serialize_position")]
    pub end_point: Coord,

    /// Longueur orthodromique en mètres
    pub length: f64,
}

/// Sérialise une coordonnée en position GeoJSON `[lon, lat]`
fn serialize_position<S: Serializer>(coord: &Coord, serializer: S) -> Result<S::Ok, S::Error> {
    [coord.x, coord.y].serialize(serializer)
}
