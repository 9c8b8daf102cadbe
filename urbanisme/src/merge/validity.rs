//! Contrôle de validité des géométries de parcelles avant fusion

use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::error::{Result, UrbanismeError};

/// Nombre minimal de positions d'un anneau fermé (3 sommets + fermeture)
const MIN_RING_POSITIONS: usize = 4;

/// Convertit une géométrie de parcelle en MultiPolygon après contrôle
///
/// Seuls Polygon et MultiPolygon sont acceptés; chaque anneau doit être fermé,
/// compter au moins 3 sommets distincts et n'avoir que des coordonnées finies.
pub fn to_multi_polygon(entity_id: &str, geometry: &Geometry) -> Result<MultiPolygon> {
    let multi = match geometry {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        other => {
            return Err(UrbanismeError::invalid_geometry(
                entity_id,
                format!("unsupported geometry type {}", geometry_type_name(other)),
            ))
        }
    };

    if multi.0.is_empty() {
        return Err(UrbanismeError::invalid_geometry(entity_id, "empty multipolygon"));
    }

    for polygon in &multi.0 {
        check_polygon(entity_id, polygon)?;
    }

    Ok(multi)
}

fn check_polygon(entity_id: &str, polygon: &Polygon) -> Result<()> {
    check_ring(entity_id, polygon.exterior())?;
    for interior in polygon.interiors() {
        check_ring(entity_id, interior)?;
    }
    Ok(())
}

fn check_ring(entity_id: &str, ring: &LineString) -> Result<()> {
    let coords = &ring.0;

    if coords.len() < MIN_RING_POSITIONS {
        return Err(UrbanismeError::invalid_geometry(
            entity_id,
            format!("ring has {} positions, at least {} required", coords.len(), MIN_RING_POSITIONS),
        ));
    }

    if coords.first() != coords.last() {
        return Err(UrbanismeError::invalid_geometry(entity_id, "ring is not closed"));
    }

    if !coords.iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        return Err(UrbanismeError::invalid_geometry(entity_id, "non-finite coordinate"));
    }

    let distinct = distinct_vertices(&coords[..coords.len() - 1]);
    if distinct < 3 {
        return Err(UrbanismeError::invalid_geometry(
            entity_id,
            format!("ring has {} distinct vertices", distinct),
        ));
    }

    Ok(())
}

fn distinct_vertices(coords: &[Coord]) -> usize {
    let mut sorted = coords.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    sorted.dedup();
    sorted.len()
}

fn geometry_type_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        _ => "non-GeoJSON geometry",
    }
}
