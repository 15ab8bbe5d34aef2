use actix_session::Session;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{HttpResponse, Responder, get, web};

use crate::routes::{directory_session, error_status};
use crate::services::directory as directory_service;
use crate::sessions::DirectorySessions;

/// Serves a photo fetched by the session's last listing.
#[get("/people/{id}/photo")]
pub async fn person_photo(
    session: Session,
    sessions: web::Data<DirectorySessions>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = directory_session(&session);
    let person_id = path.into_inner();

    match directory_service::person_photo(&sessions, session_id, &person_id).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("image/jpeg")
            .insert_header(CacheControl(vec![
                CacheDirective::Private,
                CacheDirective::MaxAge(300),
            ]))
            .body(bytes),
        Err(err) => HttpResponse::build(error_status(&err)).finish(),
    }
}
