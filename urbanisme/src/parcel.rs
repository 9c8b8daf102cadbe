//! Conversion GeoJSON ↔ parcelles
//!
//! Les propriétés reconnues suivent les réponses du service cadastre de l'API
//! Carto de l'IGN (`idu`, `section`, `numero`, `contenance`, `code_dep`,
//! `code_com`, `code_insee`), ainsi que les noms de l'état fusionné.

use geojson::{feature::Id, Feature, GeoJson, JsonObject, JsonValue};
use tracing::warn;

use crate::error::Result;
use crate::idu::Idu;
use crate::types::{MergedParcel, ParcelGeometry};

impl ParcelGeometry {
    /// Construit une parcelle depuis un Feature GeoJSON `[lon, lat]`
    ///
    /// Une géométrie illisible est journalisée et laissée absente: la parcelle
    /// reste utilisable pour les totaux de contenance.
    pub fn from_feature(feature: &Feature) -> Self {
        let empty = JsonObject::new();
        let props = feature.properties.as_ref().unwrap_or(&empty);

        let id = match &feature.id {
            Some(Id::String(s)) => Some(s.clone()),
            Some(Id::Number(n)) => Some(n.to_string()),
            None => None,
        }
        .or_else(|| prop_str(props, &["idu", "id"]))
        .unwrap_or_default();

        let idu = prop_str(props, &["idu"])
            .or_else(|| Some(id.clone()))
            .and_then(|value| Idu::parse(&value).ok());

        let section = prop_str(props, &["section"])
            .or_else(|| idu.as_ref().map(|i| i.section_label().to_string()))
            .unwrap_or_default();

        let number = prop_str(props, &["numero", "number"])
            .or_else(|| idu.as_ref().map(|i| i.number.clone()))
            .unwrap_or_default();

        let commune = prop_str(props, &["code_insee", "commune"])
            .or_else(|| {
                let dep = prop_str(props, &["code_dep"])?;
                let com = prop_str(props, &["code_com"])?;
                Some(format!("{dep}{com}"))
            })
            .or_else(|| idu.as_ref().map(Idu::commune_insee))
            .unwrap_or_default();

        let geometry = feature.geometry.as_ref().and_then(|g| {
            match geo::Geometry::<f64>::try_from(g.clone()) {
                Ok(geometry) => Some(geometry),
                Err(e) => {
                    warn!(parcel_id = %id, error = %e, "Unreadable parcel geometry");
                    None
                }
            }
        });

        Self {
            id,
            section,
            number,
            area: prop_f64(props, &["contenance", "area"]),
            geometry,
            commune,
        }
    }
}

/// Lit des parcelles depuis un document GeoJSON
///
/// Accepte une FeatureCollection, un Feature seul ou une géométrie nue. Les
/// parcelles sans identifiant reçoivent `parcel-N` (N = rang, à partir de 1).
pub fn parcels_from_geojson(document: &str) -> Result<Vec<ParcelGeometry>> {
    let geojson: GeoJson = document.parse()?;

    let mut parcels = match geojson {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .map(ParcelGeometry::from_feature)
            .collect(),
        GeoJson::Feature(feature) => vec![ParcelGeometry::from_feature(&feature)],
        GeoJson::Geometry(geometry) => {
            vec![ParcelGeometry::new(String::new(), Some(geo::Geometry::try_from(geometry)?))]
        }
    };

    for (i, parcel) in parcels.iter_mut().enumerate() {
        if parcel.id.is_empty() {
            parcel.id = format!("parcel-{}", i + 1);
        }
    }

    Ok(parcels)
}

impl MergedParcel {
    /// Feature GeoJSON avec le sac `properties` de l'état fusionné
    pub fn to_feature(&self) -> Feature {
        let properties = match serde_json::to_value(&self.properties) {
            Ok(JsonValue::Object(map)) => Some(map),
            _ => None,
        };

        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: Some(Id::String(self.properties.id.clone())),
            properties,
            foreign_members: None,
        }
    }
}

fn prop_str(props: &JsonObject, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn prop_f64(props: &JsonObject, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match props.get(*key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .replace(',', ".")
            .parse()
            .ok(),
        _ => None,
    })
}
