//! Identifiant unique de parcelle (IDU) du cadastre
//!
//! Format sur 14 caractères: département (2) + commune (3) + préfixe (3)
//! + section (2) + numéro (4), ex: `38185000AB0123`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, UrbanismeError};

fn idu_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}|2[AB])(\d{3})(\d{3})([0-9A-Z]{2})(\d{4})$").expect("static IDU pattern")
    })
}

/// IDU décomposé
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Idu {
    pub departement: String,
    pub commune: String,
    pub prefix: String,
    pub section: String,
    pub number: String,
}

impl Idu {
    /// Décompose un IDU; les espaces sont ignorés et la casse normalisée
    pub fn parse(value: &str) -> Result<Self> {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        let caps = idu_regex().captures(&compact).ok_or_else(|| UrbanismeError::InvalidIdu {
            value: value.to_string(),
            reason: "expected 14 characters: dep(2) commune(3) prefix(3) section(2) number(4)"
                .to_string(),
        })?;

        Ok(Self {
            departement: caps[1].to_string(),
            commune: caps[2].to_string(),
            prefix: caps[3].to_string(),
            section: caps[4].to_string(),
            number: caps[5].to_string(),
        })
    }

    /// Code INSEE de la commune (5 caractères)
    pub fn commune_insee(&self) -> String {
        format!("{}{}", self.departement, self.commune)
    }

    /// Section sans le zéro de remplissage (`0A` → `A`)
    pub fn section_label(&self) -> &str {
        self.section.strip_prefix('0').unwrap_or(&self.section)
    }
}

impl FromStr for Idu {
    type Err = UrbanismeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Idu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.departement, self.commune, self.prefix, self.section, self.number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_idu() {
        let idu = Idu::parse("38185000AB0123").unwrap();
        assert_eq!(idu.departement, "38");
        assert_eq!(idu.commune, "185");
        assert_eq!(idu.prefix, "000");
        assert_eq!(idu.section, "AB");
        assert_eq!(idu.number, "0123");
        assert_eq!(idu.commune_insee(), "38185");
        assert_eq!(idu.to_string(), "38185000AB0123");
    }

    #[test]
    fn test_parse_corsica_and_padded_section() {
        let idu: Idu = "2a004000 0c0012".parse().unwrap();
        assert_eq!(idu.departement, "2A");
        assert_eq!(idu.section, "0C");
        assert_eq!(idu.section_label(), "C");
        assert_eq!(idu.commune_insee(), "2A004");
    }

    #[test]
    fn test_parse_overseas() {
        let idu = Idu::parse("97411000BK0456").unwrap();
        assert_eq!(idu.commune_insee(), "97411");
    }

    #[test]
    fn test_invalid_idu() {
        assert!(Idu::parse("").is_err());
        assert!(Idu::parse("38185000AB012").is_err());
        assert!(Idu::parse("3818500AB01234").is_err());
        assert!(Idu::parse("38185000AB01234").is_err());
    }
}
