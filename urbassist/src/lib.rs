//! # urbassist
//!
//! Interface en ligne de commande du moteur `urbanisme`.
//!
//! ## Features
//!
//! - Fusion de parcelles GeoJSON et classement des limites
//! - Règles par type de construction, zones du PLU en presets ou fichier JSON
//! - Détermination DP / PC unitaire ou par lot (parallèle)
//! - Rapport réglementaire JSON
//!
//! ## Usage CLI
//!
//! ```bash
//! # Fusion de parcelles
//! urbassist merge --input ./parcelles.geojson
//!
//! # Limites, voie à l'est
//! urbassist edges --input ./parcelles.geojson --road-bearing 90
//!
//! # Détermination
//! urbassist dpc --project-type existing-extension --created 32 --existing 95
//! urbassist batch --input ./projets.json --report ./rapport.json
//! ```

pub mod cli;
pub mod config;
pub mod io;
pub mod summary;

pub use config::Config;
pub use summary::{evaluate_batch, BatchEntry, BatchReport, BatchStatus};
