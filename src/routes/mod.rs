//! HTTP handlers and the helpers they share.

use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use tera::{Context, Tera};
use uuid::Uuid;

use crate::services::{ServiceError, ServiceResult};

pub mod api;
pub mod main;
pub mod photo;

/// Session key holding the id of the session's directory.
pub const DIRECTORY_SESSION_KEY: &str = "directory_session";

/// Registers every directory route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(api::api_v1_people)
            .service(api::api_v1_groups),
    )
    .service(main::show_directory)
    .service(main::search)
    .service(main::department)
    .service(main::group)
    .service(main::page_size)
    .service(main::page)
    .service(photo::person_photo);
}

/// Maps a flash message level to the matching Bootstrap alert class.
pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

pub fn alerts(flash_messages: &IncomingFlashMessages) -> Vec<(&str, &'static str)> {
    flash_messages
        .iter()
        .map(|f| (f.content(), alert_level_to_str(&f.level())))
        .collect()
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Status code reported for a failed service call.
pub fn error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Form(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Graph(_) => StatusCode::BAD_GATEWAY,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Flashes the error of a failed form submission and redirects home.
pub fn redirect_with_outcome(result: ServiceResult<()>) -> HttpResponse {
    if let Err(err) = result {
        FlashMessage::error(err.to_string()).send();
    }
    redirect("/")
}

/// Directory id stored in the session cookie, minted on first use.
pub fn directory_session(session: &Session) -> Uuid {
    match session.get::<Uuid>(DIRECTORY_SESSION_KEY) {
        Ok(Some(id)) => return id,
        Ok(None) => {}
        Err(err) => log::warn!("Discarding unreadable directory session: {err}"),
    }

    let id = Uuid::new_v4();
    if let Err(err) = session.insert(DIRECTORY_SESSION_KEY, id) {
        log::error!("Failed to store directory session: {err}");
    }
    id
}
