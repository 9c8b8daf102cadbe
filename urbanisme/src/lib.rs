//! # urbanisme
//!
//! Moteur de calcul pour les dossiers d'autorisation d'urbanisme: géométrie des
//! parcelles cadastrales et détermination du type d'autorisation (DP / PC).
//!
//! ## Features
//!
//! - Primitives géométriques (aire, longueurs, haversine, échelle de plan)
//! - Fusion de parcelles par unions successives, tolérante aux échecs partiels
//! - Classement des limites de parcelle (façade, latérales, fond)
//! - Table de règles par type de construction résolue avec le PLU
//! - Détermination DP / PC / architecte obligatoire, avec justification
//! - Rapport réglementaire prêt à être mis en page
//!
//! Toutes les fonctions sont pures et synchrones: aucune I/O, aucun état
//! partagé.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use urbanisme::{calculate_dp_pc, classify_boundary_edges, merge_parcel_geometries};
//! use urbanisme::{DpPcInput, ProjectType, DEFAULT_ROAD_BEARING};
//!
//! let parcels = urbanisme::parcels_from_geojson(&document)?;
//! if let Some(merged) = merge_parcel_geometries(&parcels) {
//!     let edges = classify_boundary_edges(&merged.geometry, DEFAULT_ROAD_BEARING);
//!     println!("{} m², {} limites", merged.properties.area, edges.len());
//! }
//!
//! let input = DpPcInput::new(ProjectType::ExistingExtension, 32.0).with_existing(95.0);
//! println!("{}", calculate_dp_pc(&input)?.explanation);
//! ```

pub mod determination;
pub mod error;
pub mod geometry;
pub mod idu;
pub mod merge;
pub mod parcel;
pub mod report;
pub mod rules;
pub mod types;

pub use determination::{calculate_dp_pc, Determination, DpPcInput, DpPcResult, ProjectType};
pub use error::{ErrorBody, Result, UrbanismeError};
pub use geometry::{haversine_distance, polygon_area, polyline_length, Scale};
pub use idu::Idu;
pub use merge::{
    are_adjacent, classify_boundary_edges, compute_total_area, merge_parcel_geometries,
    DEFAULT_ROAD_BEARING,
};
pub use parcel::parcels_from_geojson;
pub use report::{build_report, build_report_from_analysis, ComplianceResult, RegulatoryReport};
pub use rules::{
    resolve_max_height, resolve_setback, resolve_setbacks, ConstructionType, SetbackDimension,
    ZoneRules,
};
pub use types::{BoundaryEdge, EdgeType, MergedParcel, MergedProperties, ParcelGeometry};
