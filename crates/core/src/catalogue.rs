//! Exercise catalogue: categories of exercises and their documents.
//!
//! The catalogue is static data. It is parsed once and never mutated;
//! fetching the documents it points at belongs to the host.

use crate::TaskviewError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One study exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Display name, unique within the catalogue.
    pub name: String,
    /// Path of the markdown explanation, relative to the content root.
    #[serde(alias = "mdFile")]
    pub document: String,
    /// Optional downloadable data file, relative to the content root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
}

/// A labelled, ordered group of exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category label, e.g. "Type 26".
    #[serde(alias = "type")]
    pub label: String,
    /// Exercises in display order.
    #[serde(alias = "tasks")]
    pub exercises: Vec<Exercise>,
}

/// Ordered categories of exercises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalogue {
    categories: Vec<Category>,
}

impl Catalogue {
    /// Builds a catalogue, rejecting empty labels and duplicate exercise names.
    pub fn new(categories: Vec<Category>) -> Result<Self, TaskviewError> {
        check_categories(&categories)?;
        Ok(Self { categories })
    }

    /// Parses a catalogue from JSON.
    ///
    /// Accepts both the field names used here and the `type`/`tasks`/`mdFile`/`dataFile`
    /// names used by the web front end.
    pub fn from_json(json: &str) -> Result<Self, TaskviewError> {
        let categories: Vec<Category> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    /// Reads and parses a catalogue file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaskviewError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All exercises, category by category.
    pub fn exercises(&self) -> impl Iterator<Item = (&Category, &Exercise)> {
        self.categories
            .iter()
            .flat_map(|category| category.exercises.iter().map(move |e| (category, e)))
    }

    /// Finds an exercise by name.
    pub fn find(&self, name: &str) -> Option<&Exercise> {
        self.exercises().find(|(_, e)| e.name == name).map(|(_, e)| e)
    }

    /// The category containing the named exercise.
    pub fn category_of(&self, name: &str) -> Option<&Category> {
        self.exercises().find(|(_, e)| e.name == name).map(|(c, _)| c)
    }

    /// Whether the catalogue has no exercises at all.
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.exercises.is_empty())
    }
}

fn check_categories(categories: &[Category]) -> Result<(), TaskviewError> {
    let mut seen = HashSet::new();
    for category in categories {
        if category.label.trim().is_empty() {
            return Err(TaskviewError::InvalidCatalogue(
                "category label is empty".to_string(),
            ));
        }
        for exercise in &category.exercises {
            if !seen.insert(exercise.name.as_str()) {
                return Err(TaskviewError::InvalidCatalogue(format!(
                    "duplicate exercise name '{}'",
                    exercise.name
                )));
            }
        }
    }
    Ok(())
}
