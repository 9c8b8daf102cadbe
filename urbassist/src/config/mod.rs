//! Configuration des zones du PLU
//!
//! Une configuration associe un code de zone (UA, UB, ...) à ses règles de
//! base. Elle provient d'un preset embarqué ou d'un fichier JSON.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use urbanisme::ZoneRules;

/// Presets embarqués dans le binaire
pub const PRESETS: [&str; 2] = ["standard", "rural"];

/// Variable d'environnement désignant la configuration par défaut
pub const ZONE_CONFIG_ENV: &str = "URBASSIST_ZONE_CONFIG";

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(flatten)]
    pub zones: BTreeMap<String, ZoneRules>,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "standard" => Self::load_embedded(include_str!("presets/standard.json")),
            "rural" => Self::load_embedded(include_str!("presets/rural.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    /// Nom de preset ou chemin de fichier; `None` retombe sur l'environnement
    /// puis sur le preset `standard`
    pub fn resolve(spec: Option<&str>) -> Result<Self> {
        let spec = match spec {
            Some(s) => s.to_string(),
            None => std::env::var(ZONE_CONFIG_ENV).unwrap_or_else(|_| "standard".to_string()),
        };

        if PRESETS.contains(&spec.as_str()) {
            Self::from_preset(&spec)
        } else {
            Self::load(Path::new(&spec))
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Règles d'une zone; la casse du code est ignorée
    pub fn zone(&self, code: &str) -> Result<&ZoneRules> {
        let key = code.trim().to_ascii_uppercase();
        self.zones.get(&key).with_context(|| {
            let known: Vec<&str> = self.zones.keys().map(String::as_str).collect();
            format!("Unknown zone: {}. Known zones: {}", code, known.join(", "))
        })
    }
}
