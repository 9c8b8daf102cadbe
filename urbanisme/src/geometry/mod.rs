//! Primitives géométriques planes (aire, longueur, distances)
//!
//! Toutes les fonctions travaillent dans l'unité de l'appelant (pixels de
//! canevas ou mètres). Pour des coordonnées géographiques, voir [`sphere`].

pub mod scale;
pub mod sphere;

pub use scale::Scale;
pub use sphere::{bearing, haversine_distance, EARTH_RADIUS_M};

use geo::Coord;

use crate::error::{Result, UrbanismeError};

/// Aire d'un polygone par la formule du lacet (shoelace)
///
/// L'orientation (horaire ou non) n'a pas d'effet, la valeur absolue est
/// retournée. Un point de fermeture dupliqué ne change rien au résultat.
///
/// # Errors
///
/// `InsufficientPoints` si moins de 3 points sont fournis: « pas de forme »
/// est distinct d'une forme d'aire nulle.
pub fn polygon_area(points: &[Coord]) -> Result<f64> {
    if points.len() < 3 {
        return Err(UrbanismeError::insufficient("polygon_area", 3, points.len()));
    }

    let n = points.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();

    Ok(twice_area.abs() / 2.0)
}

/// Longueur de chaque segment consécutif d'une polyligne
pub fn segment_lengths(points: &[Coord]) -> Result<Vec<f64>> {
    if points.len() < 2 {
        return Err(UrbanismeError::insufficient("segment_lengths", 2, points.len()));
    }

    Ok(points.windows(2).map(|w| distance(w[0], w[1])).collect())
}

/// Longueur totale d'une polyligne
pub fn polyline_length(points: &[Coord]) -> Result<f64> {
    if points.len() < 2 {
        return Err(UrbanismeError::insufficient("polyline_length", 2, points.len()));
    }

    Ok(points.windows(2).map(|w| distance(w[0], w[1])).sum())
}

/// Distance euclidienne entre deux points
pub fn distance(a: Coord, b: Coord) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Moyenne des sommets distincts d'un anneau (le point de fermeture est ignoré)
pub fn vertex_centroid(ring: &[Coord]) -> Option<Coord> {
    let len = if ring.len() > 1 && ring.first() == ring.last() {
        ring.len() - 1
    } else {
        ring.len()
    };

    if len == 0 {
        return None;
    }

    let (sx, sy) = ring[..len]
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));

    Some(Coord {
        x: sx / len as f64,
        y: sy / len as f64,
    })
}

/// Distance d'un point au segment [a, b]
pub fn point_segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;

    // Segment dégénéré
    if len2 == 0.0 {
        return distance(p, a);
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    distance(
        p,
        Coord {
            x: a.x + t * dx,
            y: a.y + t * dy,
        },
    )
}

/// Recul mesuré: plus petite distance entre les sommets d'une emprise et une
/// limite de parcelle [a, b]
///
/// Suffisant pour des emprises dont les sommets sont du même côté de la limite
/// (cas normal d'un plan de masse).
pub fn min_distance_to_segment(footprint: &[Coord], a: Coord, b: Coord) -> Result<f64> {
    if footprint.is_empty() {
        return Err(UrbanismeError::insufficient("min_distance_to_segment", 1, 0));
    }

    Ok(footprint
        .iter()
        .map(|&p| point_segment_distance(p, a, b))
        .fold(f64::INFINITY, f64::min))
}
