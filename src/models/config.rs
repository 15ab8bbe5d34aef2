//! Configuration model loaded from external sources.

use serde::Deserialize;
use validator::Validate;

use crate::directory::DirectoryScope;
use crate::domain::group::DepartmentOption;
use crate::domain::types::{GroupId, PageSize, TypeConstraintError};
use crate::graph::client::GraphSettings;

fn default_title() -> String {
    "Staff Directory".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_session_idle_minutes() -> i64 {
    30
}

/// Directory presentation settings.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct DirectorySettings {
    #[serde(default = "default_title")]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 20))]
    pub page_size: usize,
    #[serde(default)]
    pub departments: Vec<DepartmentOption>,
    #[serde(default)]
    pub show_department_filter: bool,
    /// Offers every tenant group on the page; needs `Group.Read.All`.
    #[serde(default)]
    pub show_group_selector: bool,
    /// Group whose members are listed; empty lists every user.
    #[serde(default)]
    pub group: String,
    #[serde(default = "default_session_idle_minutes")]
    #[validate(range(min = 1))]
    pub session_idle_minutes: i64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            page_size: default_page_size(),
            departments: Vec::new(),
            show_department_filter: false,
            show_group_selector: false,
            group: String::new(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}

impl DirectorySettings {
    /// Scope every new directory session starts with.
    pub fn scope(&self) -> Result<DirectoryScope, TypeConstraintError> {
        Ok(DirectoryScope {
            group: GroupId::parse_optional(&self.group)?,
            page_size: PageSize::new(self.page_size)?,
        })
    }

    /// Whether `key` is empty or one of the configured departments.
    pub fn is_known_department(&self, key: &str) -> bool {
        key.is_empty() || self.departments.iter().any(|option| option.key == key)
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub templates_dir: String,
    /// Cookie signing key, at least 64 bytes.
    #[validate(length(min = 64))]
    pub secret: String,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    #[validate(nested)]
    pub directory: DirectorySettings,
}
