use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::{Context, Tera};

use crate::forms::directory::{DepartmentForm, GroupForm, PageSizeForm, SearchForm};
use crate::models::config::ServerConfig;
use crate::routes::{
    alerts, directory_session, error_status, redirect_with_outcome, render_template,
};
use crate::services::ServiceError;
use crate::services::directory as directory_service;
use crate::sessions::DirectorySessions;

#[get("/")]
pub async fn show_directory(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let session_id = directory_session(&session);
    let settings = &server_config.directory;

    let mut context = Context::new();
    context.insert("alerts", &alerts(&flash_messages));
    context.insert("title", &settings.title);

    match directory_service::load_directory_page(&sessions, settings, session_id).await {
        Ok(data) => {
            context.insert("directory", &data);
            render_template(&tera, "directory/index.html", &context)
        }
        Err(ServiceError::Unavailable(message)) => {
            context.insert("unavailable", &message);
            let mut response = render_template(&tera, "directory/index.html", &context);
            *response.status_mut() = error_status(&ServiceError::Unavailable(message));
            response
        }
        Err(err) => HttpResponse::build(error_status(&err)).finish(),
    }
}

#[post("/search")]
pub async fn search(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    web::Form(form): web::Form<SearchForm>,
) -> impl Responder {
    let session_id = directory_session(&session);
    redirect_with_outcome(directory_service::search_directory(&sessions, session_id, form).await)
}

#[post("/department")]
pub async fn department(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<DepartmentForm>,
) -> impl Responder {
    let session_id = directory_session(&session);
    redirect_with_outcome(
        directory_service::select_department(&sessions, &server_config.directory, session_id, form)
            .await,
    )
}

#[post("/group")]
pub async fn group(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    web::Form(form): web::Form<GroupForm>,
) -> impl Responder {
    let session_id = directory_session(&session);
    redirect_with_outcome(directory_service::change_group(&sessions, session_id, form).await)
}

#[post("/page-size")]
pub async fn page_size(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    web::Form(form): web::Form<PageSizeForm>,
) -> impl Responder {
    let session_id = directory_session(&session);
    redirect_with_outcome(directory_service::change_page_size(&sessions, session_id, form).await)
}

#[get("/page/{page}")]
pub async fn page(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    path: web::Path<usize>,
) -> impl Responder {
    let session_id = directory_session(&session);
    let page = path.into_inner();
    redirect_with_outcome(directory_service::go_to_page(&sessions, session_id, page).await)
}
