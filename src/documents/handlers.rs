use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::auth::middleware::authenticated_user;
use crate::generation::GeneratedDocument;
use crate::{AppState, ErrorResponse};

/// List the documents generated by the current user, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "Documents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Generated documents", body = Vec<GeneratedDocument>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_documents(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let owner_id = match authenticated_user(&req, &state.jwt, state.users.as_ref()).await {
        Ok(user) => user.id,
        Err(e) => return e.error_response(),
    };

    match state.documents.list_for_owner(owner_id).await {
        Ok(documents) => HttpResponse::Ok().json(documents),
        Err(e) => {
            log::error!("Failed to list documents for {}: {}", owner_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to list documents"))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documents").route(web::get().to(list_my_documents)));
}
