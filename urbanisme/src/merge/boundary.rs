//! Classement des limites de parcelle (façade, latérales, fond)

use geo::{Coord, Geometry};
use tracing::trace;

use crate::geometry::sphere::{bearing, bearing_vector, haversine_distance, local_offset};
use crate::geometry::vertex_centroid;
use crate::types::{BoundaryEdge, EdgeType};

/// Azimut de la voie utilisé quand aucune voie n'a été détectée: plein sud
pub const DEFAULT_ROAD_BEARING: f64 = 180.0;

/// Écart angulaire maximal pour une limite en façade
const FRONT_MAX_ANGLE: f64 = 45.0;

/// Écart angulaire minimal pour une limite de fond
const REAR_MIN_ANGLE: f64 = 135.0;

/// Classe chaque segment du contour extérieur d'une parcelle
///
/// `road_bearing` est l'azimut (degrés, 0 = nord) de la voie vu depuis la
/// parcelle. Passer [`DEFAULT_ROAD_BEARING`] quand aucune direction mesurée
/// n'est disponible.
///
/// Seul un Polygon d'au moins 4 positions est pris en charge; tout autre cas
/// renvoie une liste vide. Un anneau fermé de N+1 positions donne N limites.
pub fn classify_boundary_edges(geometry: &Geometry, road_bearing: f64) -> Vec<BoundaryEdge> {
    let Geometry::Polygon(polygon) = geometry else {
        return Vec::new();
    };

    let ring = &polygon.exterior().0;
    if ring.len() < 4 {
        return Vec::new();
    }

    let Some(centroid) = vertex_centroid(ring) else {
        return Vec::new();
    };

    // Direction du regard depuis la voie vers la parcelle
    let facing = bearing_vector(road_bearing + 180.0);

    ring.windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let mid = Coord {
                x: (start.x + end.x) / 2.0,
                y: (start.y + end.y) / 2.0,
            };

            let edge_bearing = bearing(centroid, mid);
            let diff = angular_distance(edge_bearing, road_bearing);

            let edge_type = if diff < FRONT_MAX_ANGLE {
                EdgeType::Front
            } else if diff > REAR_MIN_ANGLE {
                EdgeType::Rear
            } else {
                let (east, north) = local_offset(centroid, mid);
                let cross = facing.0 * north - facing.1 * east;
                if cross > 0.0 {
                    EdgeType::SideLeft
                } else {
                    EdgeType::SideRight
                }
            };

            trace!(edge_bearing, diff, edge_type = %edge_type, "Edge classified");

            BoundaryEdge {
                edge_type,
                start_point: start,
                end_point: end,
                length: haversine_distance(start, end),
            }
        })
        .collect()
}

/// Distance angulaire symétrique entre deux azimuts, dans [0, 180]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    ((a - b + 540.0).rem_euclid(360.0) - 180.0).abs()
}

/// Longueur totale de façade sur voie, en mètres
pub fn frontage_length(edges: &[BoundaryEdge]) -> f64 {
    edges
        .iter()
        .filter(|e| e.edge_type == EdgeType::Front)
        .map(|e| e.length)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};

    /// Parcelle carrée d'environ 80 m de côté, sommets dans le sens direct
    fn square() -> Geometry {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (5.7240, 45.1880),
                (5.7250, 45.1880),
                (5.7250, 45.1890),
                (5.7240, 45.1890),
                (5.7240, 45.1880),
            ]),
            vec![],
        ))
    }

    fn edge_type_at(edges: &[BoundaryEdge], index: usize) -> EdgeType {
        edges[index].edge_type
    }

    #[test]
    fn test_edge_count_matches_vertices() {
        let edges = classify_boundary_edges(&square(), DEFAULT_ROAD_BEARING);
        assert_eq!(edges.len(), 4);

        let pentagon = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (0.001, 0.0),
                (0.0015, 0.0008),
                (0.0005, 0.0012),
                (-0.0003, 0.0007),
                (0.0, 0.0),
            ]),
            vec![],
        ));
        assert_eq!(classify_boundary_edges(&pentagon, 90.0).len(), 5);
    }

    #[test]
    fn test_square_with_road_to_the_south() {
        let edges = classify_boundary_edges(&square(), 180.0);

        // Ordre: sud, est, nord, ouest
        assert_eq!(edge_type_at(&edges, 0), EdgeType::Front);
        assert_eq!(edge_type_at(&edges, 2), EdgeType::Rear);
        assert_eq!(edge_type_at(&edges, 1), EdgeType::SideRight);
        assert_eq!(edge_type_at(&edges, 3), EdgeType::SideLeft);
    }

    #[test]
    fn test_square_with_road_to_the_east() {
        let edges = classify_boundary_edges(&square(), 90.0);

        assert_eq!(edge_type_at(&edges, 1), EdgeType::Front);
        assert_eq!(edge_type_at(&edges, 3), EdgeType::Rear);
        assert!(edge_type_at(&edges, 0).is_side());
        assert!(edge_type_at(&edges, 2).is_side());
        assert_ne!(edge_type_at(&edges, 0), edge_type_at(&edges, 2));
    }

    #[test]
    fn test_sides_independent_of_ring_orientation() {
        let clockwise = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (5.7240, 45.1880),
                (5.7240, 45.1890),
                (5.7250, 45.1890),
                (5.7250, 45.1880),
                (5.7240, 45.1880),
            ]),
            vec![],
        ));
        let edges = classify_boundary_edges(&clockwise, 180.0);

        // Ordre: ouest, nord, est, sud
        assert_eq!(edge_type_at(&edges, 0), EdgeType::SideLeft);
        assert_eq!(edge_type_at(&edges, 1), EdgeType::Rear);
        assert_eq!(edge_type_at(&edges, 2), EdgeType::SideRight);
        assert_eq!(edge_type_at(&edges, 3), EdgeType::Front);
    }

    #[test]
    fn test_edge_lengths() {
        let edges = classify_boundary_edges(&square(), 180.0);
        let south = haversine_distance(
            Coord { x: 5.7240, y: 45.1880 },
            Coord { x: 5.7250, y: 45.1880 },
        );
        assert!((edges[0].length - south).abs() < 1e-9);
        assert!((edges[1].length - 111.19).abs() < 0.1, "len={}", edges[1].length);
        assert!((frontage_length(&edges) - south).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_geometries() {
        let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![]));
        assert!(classify_boundary_edges(&multi, 180.0).is_empty());

        let degenerate = Geometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            vec![],
        ));
        assert!(classify_boundary_edges(&degenerate, 180.0).is_empty());
    }

    #[test]
    fn test_angular_distance() {
        assert_eq!(angular_distance(180.0, 180.0), 0.0);
        assert_eq!(angular_distance(0.0, 180.0), 180.0);
        assert_eq!(angular_distance(-170.0, 170.0), 20.0);
        assert_eq!(angular_distance(90.0, 180.0), 90.0);
        assert_eq!(angular_distance(-90.0, 180.0), 90.0);
    }
}
