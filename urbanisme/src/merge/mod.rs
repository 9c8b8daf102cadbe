//! Fusion de parcelles cadastrales et classement des limites

pub mod boundary;
pub mod validity;

pub use boundary::{classify_boundary_edges, frontage_length, DEFAULT_ROAD_BEARING};

use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::{Area, BooleanOps, GeodesicArea, Geometry, Intersects, MultiPolygon};
use tracing::{debug, info, warn};

use crate::error::{Result, UrbanismeError};
use crate::types::{MergedParcel, MergedProperties, ParcelGeometry};

/// Tolérance relative sur l'aire lors du contrôle d'une union
const UNION_AREA_TOLERANCE: f64 = 1e-9;

/// Fusionne les géométries de plusieurs parcelles en une seule
///
/// Les parcelles sans géométrie (ou avec une géométrie mal formée) sont
/// écartées et comptées. Les unions sont faites de gauche à droite: l'union
/// d'une parcelle qui échoue est journalisée puis ignorée, l'accumulateur
/// précédent est conservé.
///
/// # Returns
///
/// `None` si aucune géométrie exploitable n'a été fournie.
pub fn merge_parcel_geometries(parcels: &[ParcelGeometry]) -> Option<MergedParcel> {
    merge_with(parcels, union_step)
}

/// Fusion avec une étape d'union donnée
fn merge_with<F>(parcels: &[ParcelGeometry], step: F) -> Option<MergedParcel>
where
    F: Fn(&MultiPolygon, &MultiPolygon, &str) -> Result<MultiPolygon>,
{
    let mut skipped = 0usize;

    let valid: Vec<(&ParcelGeometry, MultiPolygon)> = parcels
        .iter()
        .filter_map(|parcel| {
            let Some(geometry) = &parcel.geometry else {
                warn!(parcel_id = %parcel.id, "Parcel has no geometry, skipped");
                skipped += 1;
                return None;
            };
            match validity::to_multi_polygon(&parcel.id, geometry) {
                Ok(multi) => Some((parcel, multi)),
                Err(e) => {
                    warn!(parcel_id = %parcel.id, error = %e, "Invalid parcel geometry, skipped");
                    skipped += 1;
                    None
                }
            }
        })
        .collect();

    let mut valid = valid.into_iter();
    let Some((first, first_geometry)) = valid.next() else {
        warn!(requested = parcels.len(), "No valid parcel geometry to merge");
        return None;
    };

    let mut accumulator = first_geometry;
    let mut included = vec![first];

    for (parcel, geometry) in valid {
        match step(&accumulator, &geometry, &parcel.id) {
            Ok(union) => {
                debug!(
                    parcel_id = %parcel.id,
                    polygons = union.0.len(),
                    "Parcel merged into accumulator"
                );
                accumulator = union;
                included.push(parcel);
            }
            Err(e) => {
                warn!(parcel_id = %parcel.id, error = %e, "Union failed, parcel skipped");
                skipped += 1;
            }
        }
    }

    // Une seule parcelle retenue, qu'elle soit seule en entrée ou que toutes
    // les unions aient échoué
    if included.len() == 1 {
        return Some(single_parcel(first, accumulator, skipped));
    }

    let area = accumulator.geodesic_area_unsigned().round();

    info!(
        sources = included.len(),
        skipped = skipped,
        area_m2 = area,
        "Parcels merged"
    );

    let properties = MergedProperties {
        id: join_ids(&included),
        section: join_distinct(included.iter().map(|p| p.section.as_str())),
        number: "merged".to_string(),
        area,
        merged: true,
        source_parcel_ids: included.iter().map(|p| p.id.clone()).collect(),
        source_count: included.len(),
        skipped_count: skipped,
        commune: join_distinct(included.iter().map(|p| p.commune.as_str())),
    };

    Some(MergedParcel {
        geometry: into_geometry(accumulator),
        properties,
    })
}

/// Cas d'une seule géométrie retenue: renvoyée telle quelle
fn single_parcel(parcel: &ParcelGeometry, multi: MultiPolygon, skipped: usize) -> MergedParcel {
    let area = parcel
        .area
        .unwrap_or_else(|| multi.geodesic_area_unsigned())
        .round();

    MergedParcel {
        geometry: parcel
            .geometry
            .clone()
            .unwrap_or_else(|| Geometry::MultiPolygon(multi)),
        properties: MergedProperties {
            id: parcel.id.clone(),
            section: parcel.section.clone(),
            number: parcel.number.clone(),
            area,
            merged: false,
            source_parcel_ids: vec![parcel.id.clone()],
            source_count: 1,
            skipped_count: skipped,
            commune: parcel.commune.clone(),
        },
    }
}

/// Une étape de l'union progressive
fn union_step(
    accumulator: &MultiPolygon,
    next: &MultiPolygon,
    entity_id: &str,
) -> Result<MultiPolygon> {
    let union = guarded(entity_id, || accumulator.union(next))?;
    check_union(accumulator, next, union, entity_id)
}

/// Les opérations booléennes de `geo` peuvent paniquer sur une topologie
/// invalide: la panique devient une erreur pour cette seule étape
fn guarded<F>(entity_id: &str, operation: F) -> Result<MultiPolygon>
where
    F: FnOnce() -> MultiPolygon,
{
    catch_unwind(AssertUnwindSafe(operation))
        .map_err(|_| UrbanismeError::union_failed(entity_id, "boolean operation panicked"))
}

/// Rejette un résultat d'union vide ou plus petit qu'une de ses opérandes
fn check_union(
    accumulator: &MultiPolygon,
    next: &MultiPolygon,
    union: MultiPolygon,
    entity_id: &str,
) -> Result<MultiPolygon> {
    if union.0.is_empty() {
        return Err(UrbanismeError::union_failed(entity_id, "empty union result"));
    }

    let floor = accumulator.unsigned_area().max(next.unsigned_area());
    if union.unsigned_area() < floor * (1.0 - UNION_AREA_TOLERANCE) {
        return Err(UrbanismeError::union_failed(
            entity_id,
            "union area smaller than an operand",
        ));
    }

    Ok(union)
}

fn into_geometry(mut multi: MultiPolygon) -> Geometry {
    if multi.0.len() == 1 {
        Geometry::Polygon(multi.0.remove(0))
    } else {
        Geometry::MultiPolygon(multi)
    }
}

fn join_ids(parcels: &[&ParcelGeometry]) -> String {
    parcels
        .iter()
        .map(|p| p.id.as_str())
        .collect::<Vec<_>>()
        .join("+")
}

/// Joint les valeurs non vides distinctes, dans l'ordre d'apparition
fn join_distinct<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for value in values.filter(|v| !v.is_empty()) {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    distinct.join("+")
}

/// Somme des contenances déclarées (estimation rapide, sans retrait des
/// recouvrements)
///
/// Une parcelle sans contenance compte pour l'aire géodésique de sa géométrie,
/// ou 0 si elle n'en a pas.
pub fn compute_total_area(parcels: &[ParcelGeometry]) -> f64 {
    parcels
        .iter()
        .map(|p| {
            p.area
                .or_else(|| p.geometry.as_ref().and_then(geodesic_area))
                .unwrap_or(0.0)
        })
        .sum()
}

/// Vrai si les deux parcelles se touchent ou se recouvrent
///
/// Faux (et non une erreur) si l'une des deux n'a pas de géométrie exploitable.
pub fn are_adjacent(a: &ParcelGeometry, b: &ParcelGeometry) -> bool {
    let (Some(ga), Some(gb)) = (&a.geometry, &b.geometry) else {
        return false;
    };
    let (Ok(ma), Ok(mb)) = (
        validity::to_multi_polygon(&a.id, ga),
        validity::to_multi_polygon(&b.id, gb),
    ) else {
        return false;
    };

    ma.0.iter()
        .any(|pa| mb.0.iter().any(|pb| pa.intersects(pb)))
}

/// Aire géodésique en m² d'une géométrie surfacique `[lon, lat]`
pub fn geodesic_area(geometry: &Geometry) -> Option<f64> {
    match geometry {
        Geometry::Polygon(p) => Some(p.geodesic_area_unsigned()),
        Geometry::MultiPolygon(mp) => Some(mp.geodesic_area_unsigned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};

    /// Rectangle `[lon, lat]` entre les longitudes x0..x1 et latitudes 45.0..45.001
    fn rect(x0: f64, x1: f64) -> Geometry {
        let (y0, y1) = (45.0, 45.001);
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        ))
    }

    fn parcel(id: &str, section: &str, geometry: Option<Geometry>) -> ParcelGeometry {
        ParcelGeometry::new(id, geometry).with_reference(section, id)
    }

    #[test]
    fn test_merge_empty_returns_none() {
        assert!(merge_parcel_geometries(&[]).is_none());
        assert!(merge_parcel_geometries(&[parcel("a", "AB", None)]).is_none());
    }

    #[test]
    fn test_merge_single_parcel_unchanged() {
        let geometry = rect(5.0, 5.001);
        let p = parcel("381850000AB0001", "AB", Some(geometry.clone())).with_area(850.0);

        let merged = merge_parcel_geometries(&[p]).unwrap();
        assert_eq!(merged.geometry, geometry);
        assert_eq!(merged.properties.source_count, 1);
        assert!(!merged.properties.merged);
        assert_eq!(merged.properties.area, 850.0);
        assert_eq!(merged.properties.number, "381850000AB0001");
    }

    #[test]
    fn test_merge_adjacent_parcels_adds_areas() {
        let a = rect(5.0, 5.001);
        let b = rect(5.001, 5.002);
        let area_a = geodesic_area(&a).unwrap();
        let area_b = geodesic_area(&b).unwrap();

        let merged = merge_parcel_geometries(&[
            parcel("a", "AB", Some(a)),
            parcel("b", "AC", Some(b)),
        ])
        .unwrap();

        assert!(merged.properties.merged);
        assert_eq!(merged.properties.id, "a+b");
        assert_eq!(merged.properties.section, "AB+AC");
        assert_eq!(merged.properties.number, "merged");
        assert_eq!(merged.properties.source_count, 2);
        assert!(
            (merged.properties.area - (area_a + area_b)).abs() <= 1.0,
            "merged={} expected={}",
            merged.properties.area,
            area_a + area_b
        );
        assert!(matches!(merged.geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn test_merge_overlapping_parcels_smaller_than_sum() {
        let a = rect(5.0, 5.001);
        let b = rect(5.0005, 5.0015);
        let sum = geodesic_area(&a).unwrap() + geodesic_area(&b).unwrap();

        let merged =
            merge_parcel_geometries(&[parcel("a", "AB", Some(a)), parcel("b", "AB", Some(b))])
                .unwrap();

        assert!(merged.properties.area < sum - 1.0);
        assert_eq!(merged.properties.section, "AB");
    }

    fn multi(geometry: &Geometry) -> MultiPolygon {
        validity::to_multi_polygon("test", geometry).unwrap()
    }

    /// Union réelle, sauf pour la parcelle `failing`
    fn failing_for(
        failing: &'static str,
    ) -> impl Fn(&MultiPolygon, &MultiPolygon, &str) -> Result<MultiPolygon> {
        move |accumulator: &MultiPolygon, next: &MultiPolygon, entity_id: &str| {
            if entity_id == failing {
                Err(UrbanismeError::union_failed(entity_id, "forced failure"))
            } else {
                union_step(accumulator, next, entity_id)
            }
        }
    }

    #[test]
    fn test_failed_union_keeps_accumulator() {
        let a = rect(5.0, 5.001);
        let b = rect(5.001, 5.002);
        let c = rect(4.999, 5.0);
        let expected = geodesic_area(&a).unwrap() + geodesic_area(&c).unwrap();

        let merged = merge_with(
            &[
                parcel("a", "AB", Some(a)),
                parcel("b", "AB", Some(b)),
                parcel("c", "AC", Some(c)),
            ],
            failing_for("b"),
        )
        .unwrap();

        let props = &merged.properties;
        assert!(props.merged);
        assert_eq!(props.source_parcel_ids, vec!["a", "c"]);
        assert_eq!(props.id, "a+c");
        assert_eq!(props.source_count, 2);
        assert_eq!(props.skipped_count, 1);
        assert!(
            (props.area - expected).abs() <= 1.0,
            "merged={} expected={}",
            props.area,
            expected
        );
    }

    #[test]
    fn test_all_unions_failed_reports_single_parcel() {
        let a = rect(5.0, 5.001);
        let first = parcel("a", "AB", Some(a.clone())).with_area(850.0);

        let merged = merge_with(
            &[first, parcel("b", "AB", Some(rect(5.001, 5.002)))],
            failing_for("b"),
        )
        .unwrap();

        assert!(!merged.properties.merged);
        assert_eq!(merged.properties.area, 850.0);
        assert_eq!(merged.properties.number, "a");
        assert_eq!(merged.properties.skipped_count, 1);
        assert_eq!(merged.geometry, a);
    }

    #[test]
    fn test_union_smaller_than_operand_rejected() {
        let big = multi(&rect(5.0, 5.002));
        let small = multi(&rect(5.0, 5.001));

        let err = check_union(&big, &small, small.clone(), "b").unwrap_err();
        assert!(matches!(err, UrbanismeError::UnionFailed { .. }));
        assert!(err.to_string().contains("smaller than an operand"));

        let err = check_union(&big, &small, MultiPolygon::new(vec![]), "b").unwrap_err();
        assert!(err.to_string().contains("empty union result"));

        assert!(check_union(&big, &small, big.clone(), "b").is_ok());
    }

    #[test]
    fn test_union_panic_becomes_error() {
        let err = guarded("b", || panic!("topology exception")).unwrap_err();
        assert!(matches!(err, UrbanismeError::UnionFailed { .. }));
        assert!(err.to_string().contains("panicked"));
    }

    #[test]
    fn test_merge_skips_missing_and_invalid() {
        let a = rect(5.0, 5.001);
        let b = rect(5.001, 5.002);
        let parcels = vec![
            parcel("a", "AB", Some(a)),
            parcel("missing", "AB", None),
            parcel("point", "AB", Some(Geometry::Point(Point::new(5.0, 45.0)))),
            parcel("b", "AB", Some(b)),
        ];

        let merged = merge_parcel_geometries(&parcels).unwrap();
        assert_eq!(merged.properties.source_parcel_ids, vec!["a", "b"]);
        assert_eq!(merged.properties.skipped_count, 2);
    }

    #[test]
    fn test_merge_disjoint_parcels_multipolygon() {
        let a = rect(5.0, 5.001);
        let b = rect(5.01, 5.011);

        let merged =
            merge_parcel_geometries(&[parcel("a", "AB", Some(a)), parcel("b", "AB", Some(b))])
                .unwrap();

        assert!(matches!(merged.geometry, Geometry::MultiPolygon(ref mp) if mp.0.len() == 2));
    }

    #[test]
    fn test_compute_total_area() {
        let parcels = vec![
            parcel("a", "AB", None).with_area(500.0),
            parcel("b", "AB", None).with_area(320.5),
            parcel("c", "AB", None),
        ];
        assert_eq!(compute_total_area(&parcels), 820.5);
    }

    #[test]
    fn test_compute_total_area_falls_back_to_geometry() {
        let geometry = rect(5.0, 5.001);
        let expected = geodesic_area(&geometry).unwrap();
        let total = compute_total_area(&[parcel("a", "AB", Some(geometry))]);
        assert!((total - expected).abs() < 1e-6);
    }

    #[test]
    fn test_are_adjacent() {
        let a = parcel("a", "AB", Some(rect(5.0, 5.001)));
        let b = parcel("b", "AB", Some(rect(5.001, 5.002)));
        let far = parcel("c", "AB", Some(rect(5.1, 5.101)));
        let none = parcel("d", "AB", None);

        assert!(are_adjacent(&a, &b));
        assert!(!are_adjacent(&a, &far));
        assert!(!are_adjacent(&a, &none));
    }
}
