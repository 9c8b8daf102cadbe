//! Détermination du type d'autorisation d'urbanisme (DP / PC / architecte)
//!
//! Les règles sont évaluées dans l'ordre de [`RULES`]; la première qui
//! s'applique fixe le résultat. Les seuils suivent le code de l'urbanisme
//! dans sa lecture la plus courante; ce sont des heuristiques, pas un avis
//! juridique opposable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UrbanismeError};

/// En dessous de cette surface créée, une construction neuve relève de la DP
pub const NEW_CONSTRUCTION_DP_LIMIT_M2: f64 = 20.0;

/// Au-delà de cette surface, une extension relève du PC
pub const EXTENSION_PC_THRESHOLD_M2: f64 = 40.0;

/// Au-delà de cette surface totale, le recours à un architecte est obligatoire
pub const ARCHITECT_THRESHOLD_M2: f64 = 150.0;

/// Nature du projet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    NewConstruction,
    ExistingExtension,
    Outdoor,
}

/// Autorisation déterminée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Determination {
    #[serde(rename = "DP")]
    Dp,
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "ARCHITECT_REQUIRED")]
    ArchitectRequired,
    #[serde(rename = "REVIEW")]
    Review,
}

impl Determination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dp => "DP",
            Self::Pc => "PC",
            Self::ArchitectRequired => "ARCHITECT_REQUIRED",
            Self::Review => "REVIEW",
        }
    }
}

impl std::fmt::Display for Determination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Données du projet nécessaires à la détermination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DpPcInput {
    pub project_type: ProjectType,

    /// Surface de plancher créée (m²), fournie par l'appelant
    pub floor_area_created: f64,

    /// Surface de plancher existante (m²)
    #[serde(default)]
    pub existing_floor_area: f64,

    /// Emprise au sol de l'extension (m²), si connue
    #[serde(default)]
    pub ground_area_extension: Option<f64>,

    #[serde(default)]
    pub change_of_use_or_facade: bool,

    #[serde(default = "default_in_urban_zone")]
    pub in_urban_zone: bool,
}

fn default_in_urban_zone() -> bool {
    true
}

impl DpPcInput {
    pub fn new(project_type: ProjectType, floor_area_created: f64) -> Self {
        Self {
            project_type,
            floor_area_created,
            existing_floor_area: 0.0,
            ground_area_extension: None,
            change_of_use_or_facade: false,
            in_urban_zone: true,
        }
    }

    pub fn with_existing(mut self, existing_floor_area: f64) -> Self {
        self.existing_floor_area = existing_floor_area;
        self
    }

    pub fn with_ground_area_extension(mut self, area: f64) -> Self {
        self.ground_area_extension = Some(area);
        self
    }

    pub fn with_change_of_use(mut self, value: bool) -> Self {
        self.change_of_use_or_facade = value;
        self
    }

    pub fn with_urban_zone(mut self, value: bool) -> Self {
        self.in_urban_zone = value;
        self
    }

    fn validate(&self) -> Result<()> {
        check_area("floorAreaCreated", self.floor_area_created)?;
        check_area("existingFloorArea", self.existing_floor_area)?;
        if let Some(ground) = self.ground_area_extension {
            check_area("groundAreaExtension", ground)?;
        }
        Ok(())
    }
}

fn check_area(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(UrbanismeError::InvalidInput(format!(
            "{name} must be a positive surface, got {value}"
        )))
    }
}

/// Résultat de la détermination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpPcResult {
    pub determination: Determination,

    /// Texte destiné à l'utilisateur, à afficher tel quel
    pub explanation: String,

    /// Code de la règle appliquée
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Faits dérivés de l'entrée, calculés une seule fois
struct Facts<'a> {
    input: &'a DpPcInput,
    total: f64,
    ground_over_40: bool,
    created_over_40_urban: bool,
    total_over_150: bool,
}

impl<'a> Facts<'a> {
    fn new(input: &'a DpPcInput) -> Self {
        let total = input.existing_floor_area + input.floor_area_created;
        Self {
            input,
            total,
            ground_over_40: input
                .ground_area_extension
                .is_some_and(|g| g > EXTENSION_PC_THRESHOLD_M2),
            created_over_40_urban: input.in_urban_zone
                && input.floor_area_created > EXTENSION_PC_THRESHOLD_M2,
            total_over_150: total > ARCHITECT_THRESHOLD_M2,
        }
    }

    fn is(&self, project_type: ProjectType) -> bool {
        self.input.project_type == project_type
    }

    fn extension_over_40(&self) -> bool {
        self.ground_over_40 || self.created_over_40_urban
    }

    /// Rappel chiffré commun à toutes les explications
    fn areas(&self) -> String {
        format!(
            "surface créée {} m², surface existante {} m², total {} m²",
            fmt_area(self.input.floor_area_created),
            fmt_area(self.input.existing_floor_area),
            fmt_area(self.total)
        )
    }
}

/// Une règle de la cascade: garde et verdict
struct Rule {
    code: &'static str,
    applies: fn(&Facts) -> bool,
    decide: fn(&Facts) -> (Determination, String),
}

/// Cascade ordonnée: la première règle applicable l'emporte
const RULES: [Rule; 7] = [
    Rule {
        code: "change_of_use",
        applies: |f| f.input.change_of_use_or_facade,
        decide: |f| {
            (
                Determination::Pc,
                format!(
                    "Changement de destination ou modification de façade: un permis de \
                     construire est requis quelle que soit la surface ({}).",
                    f.areas()
                ),
            )
        },
    },
    Rule {
        code: "outdoor_review",
        applies: |f| f.is(ProjectType::Outdoor),
        decide: |f| {
            (
                Determination::Review,
                format!(
                    "Aménagement extérieur: l'autorisation dépend des règles locales et doit \
                     être vérifiée au cas par cas auprès de la mairie ({}).",
                    f.areas()
                ),
            )
        },
    },
    Rule {
        code: "new_under_20",
        applies: |f| {
            f.is(ProjectType::NewConstruction)
                && f.input.floor_area_created < NEW_CONSTRUCTION_DP_LIMIT_M2
        },
        decide: |f| {
            (
                Determination::Dp,
                format!(
                    "Construction nouvelle de moins de 20 m²: une déclaration préalable \
                     suffit ({}).",
                    f.areas()
                ),
            )
        },
    },
    Rule {
        code: "new_total_over_150",
        applies: |f| f.is(ProjectType::NewConstruction) && f.total_over_150,
        decide: |f| {
            (
                Determination::ArchitectRequired,
                format!(
                    "Construction nouvelle portant la surface totale au-delà de 150 m²: \
                     permis de construire avec recours obligatoire à un architecte ({}).",
                    f.areas()
                ),
            )
        },
    },
    Rule {
        code: "new_construction",
        applies: |f| f.is(ProjectType::NewConstruction),
        decide: |f| {
            (
                Determination::Pc,
                format!(
                    "Construction nouvelle de 20 m² ou plus: permis de construire requis, \
                     sans recours obligatoire à un architecte ({}).",
                    f.areas()
                ),
            )
        },
    },
    Rule {
        code: "extension_over_threshold",
        applies: |f| f.is(ProjectType::ExistingExtension) && (f.extension_over_40() || f.total_over_150),
        decide: decide_escalated_extension,
    },
    Rule {
        code: "extension_under_threshold",
        applies: |f| f.is(ProjectType::ExistingExtension),
        decide: |f| {
            (
                Determination::Dp,
                format!(
                    "Extension d'une construction existante: aucun seuil imposant un permis \
                     de construire n'est atteint, une déclaration préalable suffit ({}).",
                    f.areas()
                ),
            )
        },
    },
];

fn decide_escalated_extension(f: &Facts) -> (Determination, String) {
    let mut reasons = Vec::new();
    if f.ground_over_40 {
        reasons.push(format!(
            "emprise au sol de l'extension de {} m² supérieure à 40 m²",
            fmt_area(f.input.ground_area_extension.unwrap_or_default())
        ));
    }
    if f.created_over_40_urban {
        reasons.push(format!(
            "surface créée de {} m² supérieure à 40 m² en zone urbaine",
            fmt_area(f.input.floor_area_created)
        ));
    }
    if f.total_over_150 {
        reasons.push(format!(
            "surface totale de {} m² supérieure à 150 m²",
            fmt_area(f.total)
        ));
    }

    let mut explanation = format!(
        "Extension d'une construction existante: permis de construire requis ({}; {}).",
        reasons.join(" et "),
        f.areas()
    );

    if f.total_over_150 {
        explanation.push_str(" Le recours à un architecte est obligatoire.");
        (Determination::ArchitectRequired, explanation)
    } else {
        (Determination::Pc, explanation)
    }
}

/// Détermine l'autorisation requise pour un projet
///
/// La surface de plancher créée n'est pas estimée ici; voir
/// [`crate::rules::estimate_floor_area`].
///
/// # Errors
///
/// `InvalidInput` si une surface est négative ou non finie.
pub fn calculate_dp_pc(input: &DpPcInput) -> Result<DpPcResult> {
    input.validate()?;

    let facts = Facts::new(input);

    // Chaque type de projet a une règle sans condition de surface
    let rule = RULES
        .iter()
        .find(|rule| (rule.applies)(&facts))
        .expect("every project type has an unconditional rule");

    let (determination, explanation) = (rule.decide)(&facts);

    debug!(
        rule = rule.code,
        determination = %determination,
        total = facts.total,
        "DP/PC determined"
    );

    Ok(DpPcResult {
        determination,
        explanation,
        detail: Some(rule.code.to_string()),
    })
}

/// Surface lisible en français: au plus 3 décimales, virgule décimale
fn fmt_area(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}", rounded).replace('.', ",")
}
