//! Définition et implémentation des commandes CLI
//!
//! - `merge`: parcelles GeoJSON → parcelle fusionnée
//! - `edges`: classement des limites (façade, latérales, fond)
//! - `area`: aire ou longueur d'un tracé sur canevas
//! - `rules`: règles effectives d'un type de construction dans une zone
//! - `dpc`: détermination DP / PC d'un projet
//! - `batch`: détermination d'un lot de projets
//! - `report`: rapport réglementaire

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use geo::{Coord, Geometry};
use serde::Serialize;
use tracing::{info, warn};
use urbanisme::merge::frontage_length;
use urbanisme::report::Situation;
use urbanisme::rules::{permit_for_element, EffectiveRules, PermitKind};
use urbanisme::{
    build_report, calculate_dp_pc, classify_boundary_edges, compute_total_area,
    merge_parcel_geometries, parcels_from_geojson, resolve_setbacks, ComplianceResult,
    ConstructionType, DpPcInput, ParcelGeometry, ProjectType, Scale, DEFAULT_ROAD_BEARING,
};

use crate::config::Config;
use crate::io::{read_input, read_json, write_json};
use crate::summary::{evaluate_batch, BatchEntry};

/// Azimut de la voie par défaut (degrés)
pub const ROAD_BEARING_ENV: &str = "URBASSIST_ROAD_BEARING";

/// Échelle du canevas par défaut (px/m)
pub const SCALE_ENV: &str = "URBASSIST_SCALE";

#[derive(Subcommand)]
pub enum Commands {
    /// Merge cadastral parcels into a single unit
    Merge {
        /// GeoJSON file (FeatureCollection, Feature or Geometry), `-` for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify parcel boundary edges relative to the road
    Edges {
        /// GeoJSON file; several parcels are merged first
        #[arg(short, long)]
        input: PathBuf,

        /// Road bearing in degrees, 0 = north (défaut : env URBASSIST_ROAD_BEARING / 180)
        #[arg(long, allow_hyphen_values = true)]
        road_bearing: Option<f64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Area (or length) of a shape drawn on the canvas
    Area {
        /// Canvas point as `x,y` in pixels, repeated
        #[arg(short, long = "point", value_parser = parse_point, allow_hyphen_values = true)]
        points: Vec<Coord>,

        /// Pixels per meter (défaut : env URBASSIST_SCALE / 100)
        #[arg(long)]
        scale: Option<f64>,

        /// Measure an open polyline instead of a polygon
        #[arg(long)]
        polyline: bool,
    },

    /// Effective rules of a construction type in a zone
    Rules {
        /// Construction type (main_house, extension, shed, carport, pool, annex)
        #[arg(short = 't', long = "type")]
        construction_type: ConstructionType,

        /// Zone code (UA, UB, ...)
        #[arg(short, long)]
        zone: String,

        /// Config preset name (standard/rural) or path to a JSON config (défaut : env URBASSIST_ZONE_CONFIG / standard)
        #[arg(long)]
        config: Option<String>,

        /// Element area in m², to check the permit it requires on its own
        #[arg(long)]
        area: Option<f64>,
    },

    /// Determine the authorization (DP / PC / architect) of a project
    Dpc {
        /// JSON project file; overrides the flags below
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ProjectKind::NewConstruction)]
        project_type: ProjectKind,

        /// Floor area created (m²)
        #[arg(long, default_value_t = 0.0)]
        created: f64,

        /// Existing floor area (m²)
        #[arg(long, default_value_t = 0.0)]
        existing: f64,

        /// Ground footprint of the extension (m²)
        #[arg(long)]
        ground: Option<f64>,

        /// Change of use or facade modification
        #[arg(long)]
        change_of_use: bool,

        /// Parcel outside an urban zone of the PLU
        #[arg(long)]
        outside_urban_zone: bool,
    },

    /// Determine the authorization of every project in a JSON array
    Batch {
        #[arg(short, long)]
        input: PathBuf,

        /// Save the JSON batch report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Maximum number of worker threads
        #[arg(long, alias = "threads")]
        jobs: Option<usize>,
    },

    /// Build the regulatory report from compliance results
    Report {
        /// JSON array of compliance results
        #[arg(long)]
        results: PathBuf,

        #[arg(long)]
        address: String,

        #[arg(long)]
        zone: String,

        /// Applicable document (PLU, PLUi, RNU...)
        #[arg(long, default_value = "PLU")]
        regulation_type: String,

        #[arg(long)]
        subdivision: bool,

        #[arg(long)]
        heritage: bool,

        /// JSON project file; its determination fixes the file type
        #[arg(long)]
        project: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Nature du projet côté ligne de commande
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectKind {
    NewConstruction,
    ExistingExtension,
    Outdoor,
}

impl From<ProjectKind> for ProjectType {
    fn from(kind: ProjectKind) -> Self {
        match kind {
            ProjectKind::NewConstruction => ProjectType::NewConstruction,
            ProjectKind::ExistingExtension => ProjectType::ExistingExtension,
            ProjectKind::Outdoor => ProjectType::Outdoor,
        }
    }
}

/// Exécute une sous-commande
pub fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Merge { input, output } => cmd_merge(&input, output.as_deref()),
        Commands::Edges {
            input,
            road_bearing,
            output,
        } => cmd_edges(&input, road_bearing, output.as_deref()),
        Commands::Area {
            points,
            scale,
            polyline,
        } => cmd_area(&points, scale, polyline),
        Commands::Rules {
            construction_type,
            zone,
            config,
            area,
        } => cmd_rules(construction_type, &zone, config.as_deref(), area),
        Commands::Dpc {
            input,
            project_type,
            created,
            existing,
            ground,
            change_of_use,
            outside_urban_zone,
        } => {
            let project = match input {
                Some(path) => read_json(&path)?,
                None => {
                    let mut project = DpPcInput::new(project_type.into(), created)
                        .with_existing(existing)
                        .with_change_of_use(change_of_use)
                        .with_urban_zone(!outside_urban_zone);
                    if let Some(ground) = ground {
                        project = project.with_ground_area_extension(ground);
                    }
                    project
                }
            };
            cmd_dpc(&project)
        }
        Commands::Batch {
            input,
            report,
            jobs,
        } => cmd_batch(&input, report.as_deref(), jobs),
        Commands::Report {
            results,
            address,
            zone,
            regulation_type,
            subdivision,
            heritage,
            project,
            output,
        } => {
            let situation = Situation {
                regulation_type,
                in_subdivision: subdivision,
                heritage_zone: heritage,
                ..Situation::new(address, zone)
            };
            cmd_report(&results, situation, project.as_deref(), output.as_deref())
        }
    }
}

/// Parcelle fusionnée
pub fn cmd_merge(input: &Path, output: Option<&Path>) -> Result<()> {
    let parcels = load_parcels(input)?;
    let total_area = compute_total_area(&parcels);

    let merged = merge_parcel_geometries(&parcels)
        .with_context(|| format!("No valid parcel geometry in {}", input.display()))?;

    info!(
        parcels = parcels.len(),
        merged = merged.properties.source_count,
        skipped = merged.properties.skipped_count,
        cadastral_area = total_area,
        area = merged.properties.area,
        "Parcels merged"
    );

    write_json(&merged.to_feature(), output)
}

/// Limites classées de l'unité foncière
pub fn cmd_edges(input: &Path, road_bearing: Option<f64>, output: Option<&Path>) -> Result<()> {
    let parcels = load_parcels(input)?;
    let geometry = unit_geometry(&parcels)
        .with_context(|| format!("No valid parcel geometry in {}", input.display()))?;

    let road_bearing = match road_bearing {
        Some(b) => b,
        None => env_f64(ROAD_BEARING_ENV)?.unwrap_or(DEFAULT_ROAD_BEARING),
    };

    let edges = classify_boundary_edges(&geometry, road_bearing);
    if edges.is_empty() {
        anyhow::bail!(
            "Cannot classify edges of {}: the merged unit is not a single polygon",
            input.display()
        );
    }

    info!(
        road_bearing,
        edges = edges.len(),
        frontage_m = frontage_length(&edges),
        "Boundary edges classified"
    );

    write_json(&edges, output)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Measure {
    pixels_per_meter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    area_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length_m: Option<f64>,
}

/// Aire ou longueur d'un tracé; les entrées insuffisantes donnent `{ "error": ... }`
pub fn cmd_area(points: &[Coord], scale: Option<f64>, polyline: bool) -> Result<()> {
    let scale = match scale {
        Some(s) => s,
        None => env_f64(SCALE_ENV)?.unwrap_or(Scale::CANVAS_DEFAULT.pixels_per_meter()),
    };
    let scale = Scale::new(scale)?;

    let measured = if polyline {
        scale.polyline_length_m(points)
    } else {
        scale.polygon_area_m2(points)
    };

    match measured {
        Ok(value) => {
            let measure = Measure {
                pixels_per_meter: scale.pixels_per_meter(),
                area_m2: (!polyline).then_some(value),
                length_m: polyline.then_some(value),
            };
            write_json(&measure, None)
        }
        Err(e) if e.is_insufficient_input() => {
            warn!(points = points.len(), "Insufficient input");
            write_json(&e.to_body(), None)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RulesOutput<'a> {
    zone: &'a str,
    #[serde(flatten)]
    rules: EffectiveRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_ces: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_area_m2: Option<f64>,
    /// `None` quand l'élément est dispensé de formalité
    #[serde(skip_serializing_if = "Option::is_none")]
    element_permit: Option<Option<PermitKind>>,
}

/// Règles effectives d'un type de construction
pub fn cmd_rules(
    construction_type: ConstructionType,
    zone: &str,
    config: Option<&str>,
    area: Option<f64>,
) -> Result<()> {
    let config = Config::resolve(config)?;
    let zone_rules = config.zone(zone)?;
    let rules = resolve_setbacks(construction_type, zone_rules);

    let output = RulesOutput {
        zone,
        rules,
        max_ces: zone_rules.max_ces,
        element_area_m2: area,
        element_permit: area.map(|a| permit_for_element(construction_type, a)),
    };

    write_json(&output, None)
}

/// Détermination d'un projet
pub fn cmd_dpc(project: &DpPcInput) -> Result<()> {
    let result = calculate_dp_pc(project).context("Invalid project")?;
    info!(determination = %result.determination, "Authorization determined");
    write_json(&result, None)
}

/// Détermination d'un lot de projets
pub fn cmd_batch(input: &Path, report_path: Option<&Path>, jobs: Option<usize>) -> Result<()> {
    let entries: Vec<BatchEntry> = read_json(input)?;
    info!(projects = entries.len(), "Evaluating batch");

    let source = input.display().to_string();
    let report = match jobs {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("Failed to build thread pool")?;
            pool.install(|| evaluate_batch(&source, &entries))
        }
        None => evaluate_batch(&source, &entries),
    };

    report.display();
    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }
    info!("{}", report.summary());

    Ok(())
}

/// Rapport réglementaire
pub fn cmd_report(
    results_path: &Path,
    situation: Situation,
    project: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let results: Vec<ComplianceResult> = read_json(results_path)?;

    let determination = match project {
        Some(path) => {
            let input: DpPcInput = read_json(path)?;
            Some(calculate_dp_pc(&input).context("Invalid project")?.determination)
        }
        None => None,
    };

    let report = build_report(&results, situation, determination);
    info!(
        results = results.len(),
        type_dossier = %report.conclusion.type_dossier,
        conforme = report.conclusion.conforme,
        "Regulatory report built"
    );

    write_json(&report, output)
}

fn load_parcels(input: &Path) -> Result<Vec<ParcelGeometry>> {
    let document = read_input(input)?;
    parcels_from_geojson(&document)
        .with_context(|| format!("Failed to read parcels from {}", input.display()))
}

/// Géométrie de l'unité foncière: la parcelle seule, ou la fusion
fn unit_geometry(parcels: &[ParcelGeometry]) -> Option<Geometry> {
    merge_parcel_geometries(parcels).map(|merged| merged.geometry)
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid {}: {}", name, raw)),
        Err(_) => Ok(None),
    }
}

/// Lit un point `x,y`
fn parse_point(raw: &str) -> std::result::Result<Coord, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{}'", raw))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", v, e))
    };
    Ok(Coord {
        x: parse(x)?,
        y: parse(y)?,
    })
}
