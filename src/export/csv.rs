use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::TARGET_EXPORT;

/// A flat table with a fixed header, written with every field quoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        CsvTable {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing trailing cells are left empty and extra cells
    /// are dropped so every row matches the header.
    pub fn push(&mut self, mut row: Vec<String>) {
        row.resize(self.header.len(), String::new());
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv_string(&self) -> String {
        let mut text = String::new();
        for line in std::iter::once(&self.header).chain(&self.rows) {
            let fields: Vec<String> = line.iter().map(|field| quote(field)).collect();
            text.push_str(&fields.join(","));
            text.push('\n');
        }
        text
    }

    /// Writes the table, creating the parent folder if needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create folder {}", parent.display()))?;
        }
        fs::write(path, self.to_csv_string())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(target: TARGET_EXPORT, "Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Quotes a field, doubling inner quotes and flattening line breaks.
fn quote(field: &str) -> String {
    let flat = field.replace(['\r', '\n'], " ");
    format!("\"{}\"", flat.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quoting() {
        let mut table = CsvTable::new(["Title", "Notes"]);
        table.push(vec!["Le \"Monde\"".to_string(), "line\nbreak".to_string()]);
        table.push(vec!["short".to_string()]);
        assert_eq!(
            table.to_csv_string(),
            "\"Title\",\"Notes\"\n\"Le \"\"Monde\"\"\",\"line break\"\n\"short\",\"\"\n"
        );
    }

    #[test]
    fn test_write_creates_folder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("web").join("1_articles_raw.csv");
        let mut table = CsvTable::new(["Key"]);
        table.push(vec!["a".to_string()]);
        table.write(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "\"Key\"\n\"a\"\n");
    }
}
