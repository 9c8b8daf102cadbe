//! Rapport réglementaire assemblé à partir des contrôles de conformité
//!
//! Les contrôles eux-mêmes (lecture du règlement de zone, analyse du plan)
//! sont faits en amont; ce module ne fait que les classer et conclure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::determination::Determination;

/// Statut d'un contrôle de conformité amont
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Compliant,
    Info,
    Violation,
    #[serde(other)]
    Unknown,
}

/// Un contrôle de conformité fourni par l'analyse amont
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    /// Rubrique du règlement (hauteur, stationnement, ...)
    pub category: String,

    /// Règle contrôlée
    #[serde(alias = "regulation")]
    pub rule: String,

    pub status: CheckStatus,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Conformité affichée dans le rapport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Conformite {
    #[serde(rename = "OUI")]
    Oui,
    #[serde(rename = "NON")]
    Non,
    #[serde(rename = "NON VÉRIFIÉ")]
    NonVerifie,
}

impl From<CheckStatus> for Conformite {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Compliant | CheckStatus::Info => Self::Oui,
            CheckStatus::Violation => Self::Non,
            CheckStatus::Unknown => Self::NonVerifie,
        }
    }
}

/// Ligne d'une rubrique du rapport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub regulation: String,
    pub conformite: Conformite,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommandations: Option<String>,
}

/// Situation du terrain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Situation {
    pub address: String,
    pub zone_name: String,

    /// Document applicable (PLU, PLUi, carte communale, RNU)
    #[serde(default = "default_regulation_type")]
    pub regulation_type: String,

    /// Terrain situé dans un lotissement
    #[serde(default)]
    pub in_subdivision: bool,

    /// Terrain situé dans un périmètre patrimonial (abords de monument, SPR)
    #[serde(default)]
    pub heritage_zone: bool,
}

fn default_regulation_type() -> String {
    "PLU".to_string()
}

impl Situation {
    pub fn new(address: impl Into<String>, zone_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            zone_name: zone_name.into(),
            regulation_type: default_regulation_type(),
            in_subdivision: false,
            heritage_zone: false,
        }
    }
}

/// Conclusion du rapport
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conclusion {
    pub conforme: bool,
    pub message: String,
    pub recommandation: String,
    pub type_dossier: Determination,
    pub justification: String,
}

/// Rapport réglementaire complet, prêt à être mis en page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryReport {
    pub situation: Situation,
    pub caracteristiques: Vec<ReportRow>,
    pub implantation: Vec<ReportRow>,
    pub stationnement: Vec<ReportRow>,
    pub espaces_verts: Vec<ReportRow>,
    pub aspect_exterieur: Vec<ReportRow>,
    pub conclusion: Conclusion,
}

/// Rubrique du rapport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    Caracteristiques,
    Implantation,
    Stationnement,
    EspacesVerts,
    AspectExterieur,
}

impl ReportSection {
    pub const ALL: [ReportSection; 5] = [
        Self::Caracteristiques,
        Self::Implantation,
        Self::Stationnement,
        Self::EspacesVerts,
        Self::AspectExterieur,
    ];

    /// Rubrique d'une catégorie amont; les catégories inconnues vont dans
    /// les caractéristiques
    pub fn for_category(category: &str) -> Self {
        let normalized = category.to_lowercase().replace(['_', '-'], " ");
        let has = |keywords: &[&str]| keywords.iter().any(|k| normalized.contains(k));

        if has(&["stationnement", "parking"]) {
            Self::Stationnement
        } else if has(&[
            "espace vert",
            "espaces vert",
            "végétal",
            "vegetal",
            "plantation",
            "pleine terre",
            "environnement",
            "environmental",
            "green",
        ]) {
            Self::EspacesVerts
        } else if has(&["aspect", "façade", "facade", "toiture", "roof", "clôture", "cloture"]) {
            Self::AspectExterieur
        } else if has(&["implantation", "recul", "setback", "limite", "alignement"]) {
            Self::Implantation
        } else {
            Self::Caracteristiques
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Caracteristiques => "caractéristiques du projet",
            Self::Implantation => "implantation",
            Self::Stationnement => "stationnement",
            Self::EspacesVerts => "espaces verts",
            Self::AspectExterieur => "aspect extérieur",
        }
    }
}

/// Construit le rapport avec une situation minimale (adresse et zone)
pub fn build_report_from_analysis(
    results: &[ComplianceResult],
    address: &str,
    zone_name: &str,
    determination: Option<Determination>,
) -> RegulatoryReport {
    build_report(results, Situation::new(address, zone_name), determination)
}

/// Construit le rapport réglementaire
///
/// Si `determination` est fourni il fixe toujours le type de dossier; sinon
/// le dossier est un PC dès qu'une non-conformité est relevée, une DP sinon.
pub fn build_report(
    results: &[ComplianceResult],
    situation: Situation,
    determination: Option<Determination>,
) -> RegulatoryReport {
    let analysed = !results.is_empty();
    let mut buckets: [Vec<ReportRow>; 5] = Default::default();

    for result in results {
        let section = ReportSection::for_category(&result.category);
        buckets[section_index(section)].push(to_row(result));
    }

    for section in ReportSection::ALL {
        let bucket = &mut buckets[section_index(section)];
        if bucket.is_empty() {
            bucket.push(placeholder_row(section, analysed, &situation));
        }
    }

    let conclusion = conclude(results, &situation, determination);

    debug!(
        results = results.len(),
        type_dossier = %conclusion.type_dossier,
        conforme = conclusion.conforme,
        "Regulatory report built"
    );

    let [caracteristiques, implantation, stationnement, espaces_verts, aspect_exterieur] = buckets;

    RegulatoryReport {
        situation,
        caracteristiques,
        implantation,
        stationnement,
        espaces_verts,
        aspect_exterieur,
        conclusion,
    }
}

fn section_index(section: ReportSection) -> usize {
    match section {
        ReportSection::Caracteristiques => 0,
        ReportSection::Implantation => 1,
        ReportSection::Stationnement => 2,
        ReportSection::EspacesVerts => 3,
        ReportSection::AspectExterieur => 4,
    }
}

fn to_row(result: &ComplianceResult) -> ReportRow {
    let regulation = match result.message.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => format!("{}: {}", result.rule, message),
        None => result.rule.clone(),
    };

    ReportRow {
        regulation,
        conformite: result.status.into(),
        recommandations: result.recommendation.clone().filter(|r| !r.is_empty()),
    }
}

/// Ligne de remplacement d'une rubrique vide
fn placeholder_row(section: ReportSection, analysed: bool, situation: &Situation) -> ReportRow {
    let regulation = if analysed {
        format!(
            "Rubrique {}: non réglementée par le {} pour la zone {}",
            section.label(),
            situation.regulation_type,
            situation.zone_name
        )
    } else {
        format!("Rubrique {}: non encore analysée", section.label())
    };

    ReportRow {
        regulation,
        conformite: Conformite::NonVerifie,
        recommandations: None,
    }
}

fn conclude(
    results: &[ComplianceResult],
    situation: &Situation,
    determination: Option<Determination>,
) -> Conclusion {
    let violations = count(results, CheckStatus::Violation);
    let unverified = count(results, CheckStatus::Unknown);

    let type_dossier = determination.unwrap_or(if violations > 0 {
        Determination::Pc
    } else {
        Determination::Dp
    });

    let message = if results.is_empty() {
        "Aucune analyse réglementaire disponible pour ce projet.".to_string()
    } else if violations > 0 {
        format!("{violations} point(s) de non-conformité relevé(s).")
    } else if unverified > 0 {
        format!("Aucune non-conformité relevée, {unverified} point(s) restant à vérifier.")
    } else {
        "Le projet respecte les règles analysées.".to_string()
    };

    let mut recommandation = if violations > 0 {
        "Modifier le projet sur les points non conformes avant le dépôt du dossier.".to_string()
    } else if unverified > 0 || results.is_empty() {
        "Faire confirmer les points non vérifiés par le service urbanisme de la commune."
            .to_string()
    } else {
        format!("Constituer le dossier ({}).", dossier_label(type_dossier))
    };
    if situation.heritage_zone {
        recommandation.push_str(" Terrain en périmètre protégé: avis de l'Architecte des Bâtiments de France requis.");
    }
    if situation.in_subdivision {
        recommandation.push_str(" Vérifier également le règlement du lotissement.");
    }

    let mut justification = justification_for(type_dossier).to_string();
    if determination.is_none() {
        justification.push_str(" Type de dossier déduit de l'analyse de conformité, à confirmer par le calcul des surfaces.");
    }

    Conclusion {
        conforme: !results.is_empty() && violations == 0,
        message,
        recommandation,
        type_dossier,
        justification,
    }
}

fn count(results: &[ComplianceResult], status: CheckStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}

fn dossier_label(determination: Determination) -> &'static str {
    match determination {
        Determination::Dp => "déclaration préalable",
        Determination::Pc => "permis de construire",
        Determination::ArchitectRequired => "permis de construire avec architecte",
        Determination::Review => "type d'autorisation à confirmer",
    }
}

fn justification_for(determination: Determination) -> &'static str {
    match determination {
        Determination::Dp => {
            "Projet de faible importance: une déclaration préalable de travaux suffit."
        }
        Determination::Pc => "Le projet relève d'un permis de construire.",
        Determination::ArchitectRequired => {
            "Permis de construire avec recours obligatoire à un architecte \
             (surface totale supérieure à 150 m²)."
        }
        Determination::Review => {
            "Type d'autorisation à confirmer auprès du service urbanisme de la commune."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(category: &str, rule: &str, status: CheckStatus) -> ComplianceResult {
        ComplianceResult {
            category: category.to_string(),
            rule: rule.to_string(),
            status,
            message: None,
            recommendation: None,
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Conformite::from(CheckStatus::Compliant), Conformite::Oui);
        assert_eq!(Conformite::from(CheckStatus::Info), Conformite::Oui);
        assert_eq!(Conformite::from(CheckStatus::Violation), Conformite::Non);
        assert_eq!(Conformite::from(CheckStatus::Unknown), Conformite::NonVerifie);
    }

    #[test]
    fn test_unknown_status_deserializes() {
        let result: ComplianceResult = serde_json::from_str(
            r#"{"category":"hauteur","regulation":"Hauteur max 9 m","status":"warning"}"#,
        )
        .unwrap();
        assert_eq!(result.status, CheckStatus::Unknown);
        assert_eq!(result.rule, "Hauteur max 9 m");
    }

    #[test]
    fn test_section_bucketing() {
        assert_eq!(ReportSection::for_category("stationnement"), ReportSection::Stationnement);
        assert_eq!(ReportSection::for_category("espaces_verts"), ReportSection::EspacesVerts);
        assert_eq!(ReportSection::for_category("Environmental"), ReportSection::EspacesVerts);
        assert_eq!(ReportSection::for_category("aspect-exterieur"), ReportSection::AspectExterieur);
        assert_eq!(ReportSection::for_category("recul_limites"), ReportSection::Implantation);
        assert_eq!(ReportSection::for_category("hauteur"), ReportSection::Caracteristiques);
        assert_eq!(ReportSection::for_category(""), ReportSection::Caracteristiques);
    }

    #[test]
    fn test_no_section_left_empty() {
        let results = vec![check("hauteur", "Hauteur max 9 m", CheckStatus::Compliant)];
        let report = build_report_from_analysis(&results, "1 rue de la Paix", "UB", None);

        assert_eq!(report.caracteristiques.len(), 1);
        assert_eq!(report.caracteristiques[0].conformite, Conformite::Oui);
        for rows in [
            &report.implantation,
            &report.stationnement,
            &report.espaces_verts,
            &report.aspect_exterieur,
        ] {
            assert_eq!(rows.len(), 1);
            assert!(rows[0].regulation.contains("non réglementée"));
            assert!(rows[0].regulation.contains("UB"));
        }
    }

    #[test]
    fn test_placeholder_when_not_analysed() {
        let report = build_report_from_analysis(&[], "1 rue de la Paix", "UA", None);
        assert!(report.stationnement[0].regulation.contains("non encore analysée"));
        assert!(!report.conclusion.conforme);
        assert_eq!(report.conclusion.type_dossier, Determination::Dp);
    }

    #[test]
    fn test_violation_infers_pc() {
        let results = vec![
            check("hauteur", "Hauteur max 9 m", CheckStatus::Violation),
            check("stationnement", "2 places", CheckStatus::Compliant),
        ];
        let report = build_report_from_analysis(&results, "adresse", "UB", None);

        assert!(!report.conclusion.conforme);
        assert_eq!(report.conclusion.type_dossier, Determination::Pc);
        assert!(report.conclusion.message.contains("1 point(s)"));
        assert!(report.conclusion.justification.contains("déduit"));
    }

    #[test]
    fn test_explicit_determination_wins() {
        let results = vec![check("hauteur", "Hauteur max 9 m", CheckStatus::Violation)];
        let report =
            build_report_from_analysis(&results, "adresse", "UB", Some(Determination::Dp));

        assert_eq!(report.conclusion.type_dossier, Determination::Dp);
        assert!(!report.conclusion.justification.contains("déduit"));
    }

    #[test]
    fn test_row_content_and_flags() {
        let results = vec![ComplianceResult {
            category: "toiture".to_string(),
            rule: "Pente de toit".to_string(),
            status: CheckStatus::Info,
            message: Some("35° minimum".to_string()),
            recommendation: Some("Prévoir des tuiles canal".to_string()),
        }];
        let mut situation = Situation::new("adresse", "UA");
        situation.heritage_zone = true;
        situation.in_subdivision = true;

        let report = build_report(&results, situation, Some(Determination::Pc));
        let row = &report.aspect_exterieur[0];
        assert_eq!(row.regulation, "Pente de toit: 35° minimum");
        assert_eq!(row.recommandations.as_deref(), Some("Prévoir des tuiles canal"));
        assert!(report.conclusion.conforme);
        assert!(report.conclusion.recommandation.contains("Bâtiments de France"));
        assert!(report.conclusion.recommandation.contains("lotissement"));
    }

    #[test]
    fn test_report_json_shape() {
        let report = build_report_from_analysis(&[], "adresse", "N", Some(Determination::Review));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["situation"]["zoneName"], "N");
        assert_eq!(json["situation"]["regulationType"], "PLU");
        assert_eq!(json["espacesVerts"][0]["conformite"], "NON VÉRIFIÉ");
        assert_eq!(json["conclusion"]["typeDossier"], "REVIEW");
        assert!(json["espacesVerts"][0].get("recommandations").is_none());
    }
}
