//! People listed by the directory.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::types::PersonId;

/// Fields requested for every person through `$select`.
pub const PERSON_FIELDS: [&str; 7] = [
    "id",
    "displayName",
    "department",
    "jobTitle",
    "businessPhones",
    "mail",
    "userPrincipalName",
];

/// Directory user as projected by [`PERSON_FIELDS`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub business_phones: Vec<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    /// Base64-encoded JPEG filled in after the batch photo fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Person {
    /// Creates a person carrying only an identifier.
    pub fn new(id: PersonId) -> Self {
        Self {
            id,
            display_name: None,
            department: None,
            job_title: None,
            business_phones: Vec::new(),
            mail: None,
            user_principal_name: None,
            picture: None,
        }
    }

    /// Name shown in listings, falling back to the sign-in name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.user_principal_name.as_deref())
            .unwrap_or(self.id.as_str())
    }

    /// Decodes the photo payload into raw JPEG bytes.
    pub fn photo_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        self.picture
            .as_deref()
            .filter(|data| !data.is_empty())
            .map(|data| STANDARD.decode(data))
            .transpose()
    }

    /// Inline image source of the fetched photo.
    pub fn photo_data_uri(&self) -> Option<String> {
        self.picture
            .as_deref()
            .filter(|data| !data.is_empty())
            .map(|data| format!("data:image/jpeg;base64,{data}"))
    }
}

/// Graph sends `null` for unset collection properties.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ODataPage;
    use serde_json::json;

    #[test]
    fn deserializes_graph_projection() {
        let person: Person = serde_json::from_value(json!({
            "id": "u1",
            "displayName": "Alice Smith",
            "department": "Engineering",
            "jobTitle": "Developer",
            "businessPhones": ["+1 555 0100"],
            "mail": "alice@contoso.com",
            "userPrincipalName": "alice@contoso.com"
        }))
        .expect("valid person");

        assert_eq!(person.id.as_str(), "u1");
        assert_eq!(person.label(), "Alice Smith");
        assert_eq!(person.business_phones, vec!["+1 555 0100"]);
        assert!(person.picture.is_none());
    }

    #[test]
    fn tolerates_missing_fields() {
        let person: Person =
            serde_json::from_value(json!({"id": "u2", "userPrincipalName": "bob@contoso.com"}))
                .expect("valid person");
        assert_eq!(person.label(), "bob@contoso.com");
        assert!(person.business_phones.is_empty());
    }

    #[test]
    fn null_properties_do_not_break_a_page() {
        let page: ODataPage<Person> = serde_json::from_value(json!({
            "value": [
                {"id": "u1", "businessPhones": ["1"]},
                {"id": "u2", "businessPhones": null, "department": null, "displayName": null}
            ]
        }))
        .expect("valid page");

        assert_eq!(page.value.len(), 2);
        assert_eq!(page.value[0].business_phones, vec!["1"]);
        assert!(page.value[1].business_phones.is_empty());
        assert_eq!(page.value[1].department, None);
        assert_eq!(page.value[1].label(), "u2");
    }

    #[test]
    fn decodes_photo_payload() {
        let mut person = Person::new(PersonId::new("u1").expect("valid id"));
        assert_eq!(person.photo_bytes(), Ok(None));

        person.picture = Some(STANDARD.encode([0xFF, 0xD8, 0xFF]));
        assert_eq!(person.photo_bytes(), Ok(Some(vec![0xFF, 0xD8, 0xFF])));
        assert_eq!(
            person.photo_data_uri().as_deref(),
            Some("data:image/jpeg;base64,/9j/")
        );

        person.picture = Some("not base64!".to_string());
        assert!(person.photo_bytes().is_err());
    }
}
