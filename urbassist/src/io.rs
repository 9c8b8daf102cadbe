//! Lecture des entrées et écriture des sorties JSON

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Lit un fichier, ou l'entrée standard si le chemin vaut `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read standard input")?;
        return Ok(buf);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Lit et désérialise un document JSON
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_input(path)?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// Écrit une valeur en JSON indenté dans un fichier, ou sur la sortie standard
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_json() {
        let path = std::env::temp_dir().join(format!("urbassist-io-{}.json", std::process::id()));
        let value = serde_json::json!({"zone": "UB", "maxHeight": 9.0});

        write_json(&value, Some(&path)).unwrap();
        let back: serde_json::Value = read_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back, value);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_input(Path::new("/nonexistent/parcels.geojson")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
