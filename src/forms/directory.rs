//! Forms submitted by the directory page.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{GroupId, PageSize};
use crate::forms::FormError;

/// Longest search text forwarded to Graph.
pub const MAX_QUERY_LENGTH: u64 = 256;

#[derive(Debug, Default, Deserialize, Validate)]
/// Search box submission.
pub struct SearchForm {
    #[serde(default)]
    #[validate(length(max = MAX_QUERY_LENGTH))]
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
/// Department dropdown submission; empty selects every department.
pub struct DepartmentForm {
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Default, Deserialize)]
/// Group selector submission; empty lists every user.
pub struct GroupForm {
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PageSizeForm {
    #[validate(range(min = 1, max = 20))]
    pub page_size: usize,
}

/// Validated search text.
pub struct SearchPayload {
    pub query: String,
}

impl TryFrom<SearchForm> for SearchPayload {
    type Error = FormError;

    fn try_from(form: SearchForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            query: form.query.trim().to_string(),
        })
    }
}

/// Validated group selection.
pub struct GroupPayload {
    pub group: Option<GroupId>,
}

impl TryFrom<GroupForm> for GroupPayload {
    type Error = FormError;

    fn try_from(form: GroupForm) -> Result<Self, Self::Error> {
        let group = GroupId::parse_optional(&form.group)?;
        Ok(Self { group })
    }
}

impl TryFrom<PageSizeForm> for PageSize {
    type Error = FormError;

    fn try_from(form: PageSizeForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(PageSize::new(form.page_size)?)
    }
}
