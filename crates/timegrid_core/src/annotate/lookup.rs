//! Precomputed annotations keyed by exact cell text.
//!
//! Used when the recognizer runs out of process and its output is handed over
//! as a JSON object `{ "<cell text>": [ {text, label, start_char, end_char} ] }`.
//! Texts missing from the table annotate to an empty list.

use crate::annotate::EntityAnnotator;
use crate::model::entity::ExtractedEntity;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug)]
pub enum LookupLoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for LookupLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read annotation table: {err}"),
            Self::Json(err) => write!(f, "invalid annotation table: {err}"),
        }
    }
}

impl Error for LookupLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LookupLoadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for LookupLoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Table-backed `EntityAnnotator`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupAnnotator {
    table: HashMap<String, Vec<ExtractedEntity>>,
}

impl LookupAnnotator {
    pub fn new(table: HashMap<String, Vec<ExtractedEntity>>) -> Self {
        Self { table }
    }

    /// Adds or replaces the annotation for `text`.
    pub fn insert(&mut self, text: impl Into<String>, entities: Vec<ExtractedEntity>) {
        self.table.insert(text.into(), entities);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LookupLoadError> {
        let table = serde_json::from_reader(reader)?;
        Ok(Self { table })
    }

    pub fn load(path: &Path) -> Result<Self, LookupLoadError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl EntityAnnotator for LookupAnnotator {
    fn annotate(&self, text: &str) -> Vec<ExtractedEntity> {
        self.table.get(text).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::LookupAnnotator;
    use crate::annotate::EntityAnnotator;
    use crate::model::entity::EntityLabel;

    #[test]
    fn reads_table_and_defaults_to_empty() {
        let json = r#"{ "Jan": [ { "text": "Jan", "label": "DATE", "start_char": 0, "end_char": 3 } ] }"#;
        let annotator = LookupAnnotator::from_reader(json.as_bytes()).expect("valid table");

        let entities = annotator.annotate("Jan");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].label, EntityLabel::Date);
        assert!(annotator.annotate("Salsa night").is_empty());
    }
}
