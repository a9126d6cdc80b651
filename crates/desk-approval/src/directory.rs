//! Organisation directory used to route approvals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who works where, who reports to whom, and how to reach them.
///
/// Loaded from JSON:
///
/// ```json
/// {
///   "departments": { "alice": "Finance" },
///   "line_managers": { "alice": "bob" },
///   "heads": { "Finance": "carol" },
///   "emails": { "bob": "bob@example.com" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgDirectory {
    /// User to department.
    pub departments: BTreeMap<String, String>,
    /// User to line manager.
    pub line_managers: BTreeMap<String, String>,
    /// Department to head of department.
    pub heads: BTreeMap<String, String>,
    /// User to e-mail address.
    pub emails: BTreeMap<String, String>,
}

impl OrgDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a directory from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::Serialization` on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds a user with their department and line manager.
    #[must_use]
    pub fn with_user(
        mut self,
        user: impl Into<String>,
        department: impl Into<String>,
        line_manager: impl Into<String>,
    ) -> Self {
        let user = user.into();
        self.departments.insert(user.clone(), department.into());
        self.line_managers.insert(user, line_manager.into());
        self
    }

    /// Sets the head of a department.
    #[must_use]
    pub fn with_head(mut self, department: impl Into<String>, head: impl Into<String>) -> Self {
        self.heads.insert(department.into(), head.into());
        self
    }

    /// Sets a user's e-mail address.
    #[must_use]
    pub fn with_email(mut self, user: impl Into<String>, email: impl Into<String>) -> Self {
        self.emails.insert(user.into(), email.into());
        self
    }

    /// The user's department.
    pub fn department_of(&self, user: &str) -> Option<&str> {
        lookup(&self.departments, user)
    }

    /// The user's line manager.
    pub fn line_manager_of(&self, user: &str) -> Option<&str> {
        lookup(&self.line_managers, user)
    }

    /// The head of a department; department names compare case-insensitively.
    pub fn head_of(&self, department: &str) -> Option<&str> {
        let department = department.trim();
        self.heads
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(department))
            .map(|(_, head)| head.as_str())
            .filter(|head| !head.trim().is_empty())
    }

    /// The user's e-mail address.
    pub fn email_of(&self, user: &str) -> Option<&str> {
        lookup(&self.emails, user)
    }

    /// Where to send a user's notifications: their address, or their name
    /// for channels with an address book.
    pub fn contact(&self, user: &str) -> String {
        self.email_of(user).unwrap_or(user).to_string()
    }

    /// The user to address map for e-mail channels.
    #[must_use]
    pub fn address_book(&self) -> BTreeMap<String, String> {
        self.emails.clone()
    }

    /// Number of users with a department or a line manager.
    #[must_use]
    pub fn user_count(&self) -> usize {
        let mut users: Vec<&String> = self
            .departments
            .keys()
            .chain(self.line_managers.keys())
            .collect();
        users.sort();
        users.dedup();
        users.len()
    }
}

fn lookup<'a>(map: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key.trim())
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
}
