//! Ticket categories and their intake defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::ticket::Priority;

/// A category tickets are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name.
    pub name: String,
    /// What belongs in this category.
    #[serde(default)]
    pub description: String,
    /// Priority given to new tickets that did not ask for one.
    #[serde(default)]
    pub default_priority: Option<Priority>,
    /// Agent new tickets are routed to.
    #[serde(default)]
    pub default_assignee: Option<String>,
}

impl Category {
    /// Creates a category with no defaults.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::InvalidTicket` if the name is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeskError::InvalidTicket(
                "category name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            description: String::new(),
            default_priority: None,
            default_assignee: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the default priority.
    #[must_use]
    pub const fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = Some(priority);
        self
    }

    /// Sets the default assignee.
    #[must_use]
    pub fn with_default_assignee(mut self, agent: impl Into<String>) -> Self {
        self.default_assignee = Some(agent.into());
        self
    }
}

/// Categories keyed by case-insensitive name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategoryRegistry {
    categories: BTreeMap<String, Category>,
}

impl From<Vec<Category>> for CategoryRegistry {
    fn from(categories: Vec<Category>) -> Self {
        let mut registry = Self::new();
        for category in categories {
            registry.insert(category);
        }
        registry
    }
}

impl From<CategoryRegistry> for Vec<Category> {
    fn from(registry: CategoryRegistry) -> Self {
        registry.categories.into_values().collect()
    }
}

impl CategoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Adds or replaces a category.
    pub fn insert(&mut self, category: Category) {
        self.categories.insert(Self::key(&category.name), category);
    }

    /// Looks a category up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.get(&Self::key(name))
    }

    /// Looks a category up by name, failing when it is not registered.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::CategoryNotFound` if there is no such category.
    pub fn require(&self, name: &str) -> Result<&Category> {
        self.get(name)
            .ok_or_else(|| DeskError::CategoryNotFound(name.to_string()))
    }

    /// Removes a category; returns true if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.categories.remove(&Self::key(name)).is_some()
    }

    /// All categories ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if no categories are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
