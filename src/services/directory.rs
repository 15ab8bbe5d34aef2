//! Services driving one session's directory.

use std::sync::Arc;

use uuid::Uuid;

use crate::directory::DirectoryController;
use crate::domain::types::PageSize;
use crate::dto::api::PeopleResponse;
use crate::dto::directory::DirectoryPageData;
use crate::forms::FormError;
use crate::forms::directory::{
    DepartmentForm, GroupForm, GroupPayload, PageSizeForm, SearchForm, SearchPayload,
};
use crate::models::config::DirectorySettings;
use crate::services::groups::list_group_options;
use crate::services::{ServiceError, ServiceResult};
use crate::sessions::DirectorySessions;

/// Looks up the session's controller, reporting an unresolved Graph client
/// as [`ServiceError::Unavailable`].
pub async fn session_controller(
    sessions: &DirectorySessions,
    session_id: Uuid,
) -> ServiceResult<Arc<DirectoryController>> {
    sessions.controller(session_id).await.map_err(|err| {
        log::error!("Directory unavailable for session {session_id}: {err}");
        ServiceError::Unavailable(err.to_string())
    })
}

async fn loaded_controller(
    sessions: &DirectorySessions,
    session_id: Uuid,
) -> ServiceResult<Arc<DirectoryController>> {
    let controller = session_controller(sessions, session_id).await?;
    if let Err(err) = controller.initial_load().await {
        log::error!("Failed to load directory: {err}");
    }
    Ok(controller)
}

/// Loads the data for the directory page, fetching the first page on the
/// session's first visit. Listing failures are reported inside the page; a
/// failed group listing only hides the group selector.
pub async fn load_directory_page(
    sessions: &DirectorySessions,
    settings: &DirectorySettings,
    session_id: Uuid,
) -> ServiceResult<DirectoryPageData> {
    let controller = loaded_controller(sessions, session_id).await?;

    let groups = if settings.show_group_selector {
        list_group_options(sessions, session_id)
            .await
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(DirectoryPageData::new(settings, groups, controller.view()))
}

/// Current page of people for the JSON API.
pub async fn load_people(
    sessions: &DirectorySessions,
    session_id: Uuid,
) -> ServiceResult<PeopleResponse> {
    let controller = loaded_controller(sessions, session_id).await?;
    Ok(PeopleResponse::from(controller.view()))
}

pub async fn search_directory(
    sessions: &DirectorySessions,
    session_id: Uuid,
    form: SearchForm,
) -> ServiceResult<()> {
    let payload = SearchPayload::try_from(form).map_err(|err| {
        log::error!("Failed to validate search form: {err}");
        err
    })?;

    let controller = session_controller(sessions, session_id).await?;
    controller.submit_search(&payload.query).await.map_err(|err| {
        log::error!("Failed to search directory: {err}");
        ServiceError::from(err)
    })
}

pub async fn select_department(
    sessions: &DirectorySessions,
    settings: &DirectorySettings,
    session_id: Uuid,
    form: DepartmentForm,
) -> ServiceResult<()> {
    let department = form.department.trim();
    if !settings.is_known_department(department) {
        log::error!("Rejected unknown department {department:?}");
        return Err(FormError::UnknownDepartment.into());
    }

    let controller = session_controller(sessions, session_id).await?;
    controller.select_department(department).await.map_err(|err| {
        log::error!("Failed to filter directory by department: {err}");
        ServiceError::from(err)
    })
}

pub async fn change_group(
    sessions: &DirectorySessions,
    session_id: Uuid,
    form: GroupForm,
) -> ServiceResult<()> {
    let payload = GroupPayload::try_from(form)?;

    let controller = session_controller(sessions, session_id).await?;
    controller.change_group(payload.group).await.map_err(|err| {
        log::error!("Failed to switch directory group: {err}");
        ServiceError::from(err)
    })
}

pub async fn change_page_size(
    sessions: &DirectorySessions,
    session_id: Uuid,
    form: PageSizeForm,
) -> ServiceResult<()> {
    let page_size = PageSize::try_from(form)?;

    let controller = session_controller(sessions, session_id).await?;
    controller.set_page_size(page_size).await.map_err(|err| {
        log::error!("Failed to change page size: {err}");
        ServiceError::from(err)
    })
}

pub async fn go_to_page(
    sessions: &DirectorySessions,
    session_id: Uuid,
    page: usize,
) -> ServiceResult<()> {
    let controller = loaded_controller(sessions, session_id).await?;
    controller.go_to_page(page).await.map_err(|err| {
        log::error!("Failed to load page {page}: {err}");
        ServiceError::from(err)
    })
}

/// JPEG bytes of a person fetched by this session.
pub async fn person_photo(
    sessions: &DirectorySessions,
    session_id: Uuid,
    person_id: &str,
) -> ServiceResult<Vec<u8>> {
    let controller = session_controller(sessions, session_id).await?;
    let person = controller
        .state()
        .accumulated_results
        .into_iter()
        .find(|person| person.id.as_str() == person_id)
        .ok_or(ServiceError::NotFound)?;

    match person.photo_bytes() {
        Ok(Some(bytes)) => Ok(bytes),
        Ok(None) => Err(ServiceError::NotFound),
        Err(err) => {
            log::error!("Failed to decode photo of {person_id}: {err}");
            Err(ServiceError::Internal)
        }
    }
}
