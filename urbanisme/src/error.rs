//! Types d'erreurs pour le crate urbanisme

use serde::Serialize;
use thiserror::Error;

/// Erreurs pouvant survenir lors des calculs géométriques et réglementaires
#[derive(Debug, Error)]
pub enum UrbanismeError {
    /// Pas assez de points pour l'opération demandée
    #[error("Insufficient input for {operation}: {required} points required, got {actual}")]
    InsufficientPoints {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    /// Facteur d'échelle (pixels par mètre) invalide
    #[error("Invalid scale: {0} px/m (must be finite and strictly positive)")]
    InvalidScale(f64),

    /// Géométrie invalide
    #[error("Invalid geometry for {entity_id}: {reason}")]
    InvalidGeometry { entity_id: String, reason: String },

    /// Échec d'une union entre deux géométries
    #[error("Union failed for {entity_id}: {reason}")]
    UnionFailed { entity_id: String, reason: String },

    /// Paramètre métier invalide (surface négative, etc.)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identifiant cadastral (IDU) mal formé
    #[error("Invalid IDU '{value}': {reason}")]
    InvalidIdu { value: String, reason: String },

    /// Erreur de lecture GeoJSON
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl UrbanismeError {
    /// Crée une erreur de points insuffisants
    pub fn insufficient(operation: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientPoints {
            operation,
            required,
            actual,
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(entity_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            entity_id: entity_id.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur d'union
    pub fn union_failed(entity_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnionFailed {
            entity_id: entity_id.into(),
            reason: reason.into(),
        }
    }

    /// Vrai pour les erreurs « données insuffisantes », que l'appelant peut
    /// renvoyer telles quelles sous forme `{ "error": ... }`
    pub fn is_insufficient_input(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPoints { .. } | Self::InvalidGeometry { .. }
        )
    }

    /// Corps de réponse structuré pour les appelants HTTP
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

/// Résultat structuré `{ "error": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type Result<T> = std::result::Result<T, UrbanismeError>;
