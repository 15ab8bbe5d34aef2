use serde::Serialize;

use crate::directory::DirectoryView;
use crate::domain::group::Group;
use crate::domain::person::Person;
use crate::dto::directory::PersonCard;

/// Person card with the photo inlined for API clients.
#[derive(Debug, Serialize)]
pub struct PersonEntry {
    #[serde(flatten)]
    pub card: PersonCard,
    /// `data:` URI of the fetched photo.
    pub photo: Option<String>,
}

impl From<&Person> for PersonEntry {
    fn from(person: &Person) -> Self {
        Self {
            card: PersonCard::from(person),
            photo: person.photo_data_uri(),
        }
    }
}

/// Response body of `GET /api/v1/people`.
#[derive(Debug, Serialize)]
pub struct PeopleResponse {
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub people: Vec<PersonEntry>,
}

impl From<DirectoryView> for PeopleResponse {
    fn from(view: DirectoryView) -> Self {
        Self {
            total: view.total,
            page: view.pager.page,
            total_pages: view.pager.total_pages,
            page_size: view.page_size,
            loading: view.loading,
            error: view.error,
            people: view.people.iter().map(PersonEntry::from).collect(),
        }
    }
}

/// Entry of the group selector.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GroupOption {
    pub key: String,
    pub text: String,
}

impl From<&Group> for GroupOption {
    fn from(group: &Group) -> Self {
        Self {
            key: group.id.clone(),
            text: group.label().to_string(),
        }
    }
}
