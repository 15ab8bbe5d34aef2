use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use crate::routes::{directory_session, error_status};
use crate::services::directory as directory_service;
use crate::services::groups as groups_service;
use crate::sessions::DirectorySessions;

#[get("/v1/people")]
pub async fn api_v1_people(
    session: Session,
    sessions: web::Data<DirectorySessions>,
) -> impl Responder {
    let session_id = directory_session(&session);

    match directory_service::load_people(&sessions, session_id).await {
        Ok(people) => HttpResponse::Ok().json(people),
        Err(err) => HttpResponse::build(error_status(&err)).json(json!({"error": err.to_string()})),
    }
}

#[get("/v1/groups")]
pub async fn api_v1_groups(
    session: Session,
    sessions: web::Data<DirectorySessions>,
) -> impl Responder {
    let session_id = directory_session(&session);

    match groups_service::list_group_options(&sessions, session_id).await {
        Ok(groups) => HttpResponse::Ok().json(groups),
        Err(err) => HttpResponse::build(error_status(&err)).json(json!({"error": err.to_string()})),
    }
}
