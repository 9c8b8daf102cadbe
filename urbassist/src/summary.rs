//! Rapport de détermination par lot
//!
//! Chaque projet est évalué indépendamment; un projet en erreur est
//! consigné dans le rapport sans interrompre le lot.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use urbanisme::{calculate_dp_pc, DpPcInput, DpPcResult};

/// Statut global du lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchStatus {
    /// Tous les projets évalués
    Success,
    /// Certains projets rejetés
    PartialSuccess,
    /// Aucun projet évalué
    Failed,
}

/// Un projet du lot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchEntry {
    /// Libellé libre (référence du dossier, adresse...)
    #[serde(default)]
    pub label: Option<String>,

    /// Données du projet, au même niveau que le libellé dans le JSON
    #[serde(flatten)]
    pub input: DpPcInput,
}

/// Projet évalué
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// Rang du projet dans le fichier source (à partir de 0)
    pub index: usize,
    /// Libellé du projet (optionnel)
    pub label: Option<String>,
    /// Autorisation déterminée et sa justification
    pub result: DpPcResult,
}

/// Projet rejeté
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    /// Rang du projet dans le fichier source (à partir de 0)
    pub index: usize,
    /// Libellé du projet (optionnel)
    pub label: Option<String>,
    /// Message d'erreur
    pub message: String,
}

/// Rapport complet d'un lot
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Fichier source
    pub source: String,
    /// Durée de l'évaluation
    pub duration_secs: f64,
    /// Statut global
    pub status: BatchStatus,

    // Compteurs globaux
    /// Nombre de projets évalués
    pub evaluated: usize,
    /// Nombre de projets rejetés
    pub rejected: usize,

    /// Nombre de projets par autorisation
    pub by_determination: BTreeMap<String, usize>,

    /// Résultats, dans l'ordre du fichier source
    pub results: Vec<BatchItem>,
    /// Liste des erreurs
    pub errors: Vec<BatchError>,
}

impl BatchReport {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            duration_secs: 0.0,
            status: BatchStatus::Success,
            evaluated: 0,
            rejected: 0,
            by_determination: BTreeMap::new(),
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_result(&mut self, item: BatchItem) {
        self.evaluated += 1;
        *self
            .by_determination
            .entry(item.result.determination.to_string())
            .or_default() += 1;
        self.results.push(item);
    }

    pub fn record_error(&mut self, error: BatchError) {
        self.rejected += 1;
        self.errors.push(error);
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = match (self.evaluated, self.rejected) {
            (_, 0) => BatchStatus::Success,
            (0, _) => BatchStatus::Failed,
            _ => BatchStatus::PartialSuccess,
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("BATCH REPORT - {}", self.source);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!("Projects: {} evaluated, {} rejected", self.evaluated, self.rejected);

        if !self.by_determination.is_empty() {
            println!("\n--- BY DETERMINATION ---");
            for (determination, count) in &self.by_determination {
                println!("  {}: {}", determination, count);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                let location = match &e.label {
                    Some(label) => format!("[#{} {}]", e.index, label),
                    None => format!("[#{}]", e.index),
                };
                println!("  {} {}", location, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        let counts: Vec<String> = self
            .by_determination
            .iter()
            .map(|(k, v)| format!("{} {}", v, k))
            .collect();
        format!(
            "{}: {} evaluated ({}), {} rejected",
            self.source,
            self.evaluated,
            counts.join(", "),
            self.rejected
        )
    }
}

/// Évalue un lot de projets en parallèle; l'ordre des résultats suit l'entrée
pub fn evaluate_batch(source: &str, entries: &[BatchEntry]) -> BatchReport {
    let start = Instant::now();

    let outcomes: Vec<_> = entries
        .par_iter()
        .enumerate()
        .map(|(index, entry)| (index, entry, calculate_dp_pc(&entry.input)))
        .collect();

    let mut report = BatchReport::new(source);
    for (index, entry, outcome) in outcomes {
        match outcome {
            Ok(result) => report.record_result(BatchItem {
                index,
                label: entry.label.clone(),
                result,
            }),
            Err(e) => {
                warn!(index, label = ?entry.label, error = %e, "Project rejected");
                report.record_error(BatchError {
                    index,
                    label: entry.label.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    report.set_duration(start.elapsed());
    report.finalize();
    info!(
        evaluated = report.evaluated,
        rejected = report.rejected,
        "Batch evaluated"
    );
    report
}
