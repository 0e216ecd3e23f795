//! AI prompt templates
//!
//! Templates are kept in their own collection, separate from the concept
//! tree, and are persisted and backed up alongside it. A template body may
//! reference the selected concept through `{{name}}`, `{{description}}` and
//! `{{path}}` placeholders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::generate_node_id;
use crate::models::{Node, ValidationError};

/// Separator used when rendering the `{{path}}` placeholder
pub const PATH_SEPARATOR: &str = " > ";

/// A reusable prompt with concept placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl PromptTemplate {
    pub fn new(title: &str, body: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: generate_node_id(),
            title: normalize_title(title)?,
            body: body.into(),
            updated_at: Utc::now(),
        })
    }

    /// Fill the placeholders from `node`
    ///
    /// `path` is the chain of nodes from the root down to `node` inclusive,
    /// as returned by `HierarchyStore::ancestors`.
    pub fn render(&self, node: &Node, path: &[&Node]) -> String {
        let path_text = path
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR);

        self.body
            .replace("{{name}}", &node.name)
            .replace("{{description}}", &node.description)
            .replace("{{path}}", &path_text)
    }
}

fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Ordered collection of prompt templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptLibrary {
    templates: Vec<PromptTemplate>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_templates(templates: Vec<PromptTemplate>) -> Self {
        Self { templates }
    }

    /// Append a new template and return a copy of it
    pub fn add(&mut self, title: &str, body: &str) -> Result<PromptTemplate, ValidationError> {
        let template = PromptTemplate::new(title, body)?;
        self.templates.push(template.clone());
        Ok(template)
    }

    /// Replace title and body of an existing template
    ///
    /// Returns `Ok(false)` when no template has that id.
    pub fn update(&mut self, id: &str, title: &str, body: &str) -> Result<bool, ValidationError> {
        let title = normalize_title(title)?;
        match self.templates.iter_mut().find(|t| t.id == id) {
            Some(template) => {
                template.title = title;
                template.body = body.to_string();
                template.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a template; returns it if it existed
    pub fn remove(&mut self, id: &str) -> Option<PromptTemplate> {
        let pos = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptTemplate> {
        self.templates.iter()
    }

    pub fn templates(&self) -> &[PromptTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
