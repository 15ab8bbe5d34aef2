use serde::Serialize;

use crate::directory::DirectoryView;
use crate::domain::group::DepartmentOption;
use crate::domain::person::Person;
use crate::dto::api::GroupOption;
use crate::forms::directory::MAX_QUERY_LENGTH;
use crate::models::config::DirectorySettings;
use crate::pagination::PagerView;

/// Page sizes offered next to the pager.
pub const PAGE_SIZE_CHOICES: [usize; 4] = [5, 10, 15, 20];

/// Person as rendered by the result list.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PersonCard {
    pub id: String,
    pub name: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub mail: Option<String>,
    pub phone: Option<String>,
    /// Route serving the decoded photo, when one was fetched.
    pub photo_url: Option<String>,
}

impl From<&Person> for PersonCard {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.to_string(),
            name: person.label().to_string(),
            job_title: person.job_title.clone(),
            department: person.department.clone(),
            mail: person.mail.clone(),
            phone: person.business_phones.first().cloned(),
            photo_url: person
                .picture
                .as_ref()
                .map(|_| format!("/people/{}/photo", person.id)),
        }
    }
}

/// Data required to render the directory template.
#[derive(Debug, Serialize)]
pub struct DirectoryPageData {
    pub title: String,
    /// Department options including the leading "All departments" entry.
    pub departments: Vec<DepartmentOption>,
    pub show_department_filter: bool,
    /// Group options including "All users"; empty hides the selector.
    pub groups: Vec<GroupOption>,
    pub selected_group: String,
    pub page_size: usize,
    pub page_sizes: Vec<usize>,
    pub max_query_length: u64,
    pub query_text: String,
    pub selected_department: String,
    pub people: Vec<PersonCard>,
    pub pager: PagerView,
    pub summary: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl DirectoryPageData {
    pub fn new(settings: &DirectorySettings, groups: Vec<GroupOption>, view: DirectoryView) -> Self {
        let mut departments = vec![DepartmentOption {
            key: String::new(),
            text: "All departments".to_string(),
        }];
        departments.extend(settings.departments.iter().cloned());

        let mut page_sizes = PAGE_SIZE_CHOICES.to_vec();
        if !page_sizes.contains(&view.page_size) {
            page_sizes.push(view.page_size);
            page_sizes.sort_unstable();
        }

        Self {
            title: settings.title.clone(),
            departments,
            show_department_filter: settings.show_department_filter,
            groups,
            selected_group: view.group.map(|group| group.to_string()).unwrap_or_default(),
            page_size: view.page_size,
            page_sizes,
            max_query_length: MAX_QUERY_LENGTH,
            query_text: view.query_text,
            selected_department: view.selected_department,
            people: view.people.iter().map(PersonCard::from).collect(),
            pager: view.pager,
            summary: view.summary,
            loading: view.loading,
            error: view.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PersonId;
    use crate::pagination::Pager;

    fn view(page_size: usize) -> DirectoryView {
        let pager = Pager::new(0, page_size).view();
        DirectoryView {
            query_text: String::new(),
            selected_department: String::new(),
            group: Some(
                "02bd9fd6-8f93-4758-87c3-1fb73740a315"
                    .parse()
                    .expect("valid group"),
            ),
            page_size,
            people: Vec::new(),
            summary: pager.summary(),
            pager,
            total: 0,
            loading: false,
            error: None,
        }
    }

    #[test]
    fn page_data_offers_current_page_size_and_group() {
        let data = DirectoryPageData::new(&DirectorySettings::default(), Vec::new(), view(7));

        assert_eq!(data.page_sizes, vec![5, 7, 10, 15, 20]);
        assert_eq!(data.page_size, 7);
        assert_eq!(data.selected_group, "02bd9fd6-8f93-4758-87c3-1fb73740a315");
        assert_eq!(data.departments.len(), 1);
        assert!(data.groups.is_empty());

        let data = DirectoryPageData::new(&DirectorySettings::default(), Vec::new(), view(10));
        assert_eq!(data.page_sizes, PAGE_SIZE_CHOICES.to_vec());
    }

    #[test]
    fn card_links_photo_only_when_fetched() {
        let mut person = Person::new(PersonId::new("u1").unwrap());
        person.display_name = Some("Alice".to_string());
        person.business_phones = vec!["+1 555".to_string(), "+1 556".to_string()];

        let card = PersonCard::from(&person);
        assert_eq!(card.name, "Alice");
        assert_eq!(card.phone.as_deref(), Some("+1 555"));
        assert_eq!(card.photo_url, None);

        person.picture = Some("QUJD".to_string());
        assert_eq!(
            PersonCard::from(&person).photo_url.as_deref(),
            Some("/people/u1/photo")
        );
    }
}
