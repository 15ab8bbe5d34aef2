use serde::{Deserialize, Serialize};

/// Azure AD group offered by the group selector.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Group {
    /// Text shown in the selector, falling back to the id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Department entry configured for the department dropdown.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepartmentOption {
    /// Department value as stored in the directory.
    pub key: String,
    /// Display text shown in the dropdown.
    pub text: String,
}
