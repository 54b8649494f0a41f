use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::{Map, Value};

use super::models::{
    GenerateQuery, GenerateResponse, UploadResourceResponse, UploadSchemaResponse,
};
use super::upload::{parse_upload, UploadError};
use crate::auth::middleware::authenticated_user;
use crate::generation::dispatch::dispatch;
use crate::generation::schema::is_valid_template_id;
use crate::generation::{GenerationError, GenerationRequest, OutputFormat, TemplateSchema};
use crate::{AppState, ErrorResponse};

const SCHEMA_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Upload a template schema
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    security(("bearer_auth" = [])),
    request_body(content = inline(super::models::UploadSchemaRequest), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Schema stored", body = UploadSchemaResponse),
        (status = 400, description = "Invalid template id or schema", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn upload_schema(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> impl Responder {
    if let Err(e) = authenticated_user(&req, &state.jwt, state.users.as_ref()).await {
        return e.error_response();
    }

    let mut form = match parse_upload(payload).await {
        Ok(form) => form,
        Err(e) => return HttpResponse::from(e),
    };

    let template_id = match form.field("template_id") {
        Ok(id) => id.to_string(),
        Err(e) => return HttpResponse::from(e),
    };
    if !is_valid_template_id(&template_id) {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "template_id may only contain letters, digits, '-' and '_'",
        ));
    }

    let file = match form.take_file() {
        Ok(file) => file,
        Err(e) => return HttpResponse::from(e),
    };
    let extension = file.extension();
    if !SCHEMA_EXTENSIONS.contains(&extension.as_str()) {
        return HttpResponse::from(UploadError::UnsupportedFileType(file.file_name));
    }
    let source = match file.into_text() {
        Ok(source) => source,
        Err(e) => return HttpResponse::from(e),
    };

    let schema = match TemplateSchema::parse(&template_id, &source) {
        Ok(schema) => schema,
        Err(GenerationError::InvalidSchema { reason, .. }) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request(&format!("Invalid schema: {reason}")));
        }
        Err(e) => return HttpResponse::from(e),
    };

    if let Err(e) = state.templates.put_schema(&template_id, &source).await {
        return HttpResponse::from(UploadError::Io(e));
    }

    log::info!(
        "Stored schema '{}' ({} parameters)",
        template_id,
        schema.parameters.len()
    );
    HttpResponse::Created().json(UploadSchemaResponse {
        template_id,
        template_name: schema.template_resource_name,
        parameter_count: schema.parameters.len(),
    })
}

/// Upload a template resource (.docx, .md or .html)
#[utoipa::path(
    post,
    path = "/api/templates/resources",
    tag = "Templates",
    security(("bearer_auth" = [])),
    request_body(content = inline(super::models::UploadResourceRequest), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Template resource stored", body = UploadResourceResponse),
        (status = 400, description = "Unsupported template format", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn upload_template_resource(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> impl Responder {
    if let Err(e) = authenticated_user(&req, &state.jwt, state.users.as_ref()).await {
        return e.error_response();
    }

    let file = match parse_upload(payload).await.and_then(|mut form| form.take_file()) {
        Ok(file) => file,
        Err(e) => return HttpResponse::from(e),
    };

    // Same extension rule the generator uses, so an accepted upload is renderable.
    if let Err(e) = dispatch(&file.file_name, OutputFormat::Native) {
        return HttpResponse::from(e);
    }

    if let Err(e) = state
        .templates
        .put_template_resource(&file.file_name, &file.bytes)
        .await
    {
        return HttpResponse::from(UploadError::Io(e));
    }

    log::info!(
        "Stored template resource '{}' ({} bytes)",
        file.file_name,
        file.bytes.len()
    );
    HttpResponse::Created().json(UploadResourceResponse {
        file_name: file.file_name,
    })
}

/// List the parameters a template expects
#[utoipa::path(
    get,
    path = "/api/templates/{template_id}/parameters",
    tag = "Templates",
    params(("template_id" = String, Path, description = "Template id")),
    responses(
        (status = 200, description = "Declared parameters", body = Vec<crate::generation::ParameterSpec>),
        (status = 404, description = "Unknown template", body = ErrorResponse)
    )
)]
pub async fn get_template_parameters(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    match state.pipeline.parameters(&path.into_inner()).await {
        Ok(parameters) => HttpResponse::Ok().json(parameters),
        Err(e) => HttpResponse::from(e),
    }
}

/// Generate a document from a template
///
/// The JSON body holds the template parameters. An optional `format` key
/// (`native` or `pdf`) selects the output format and is not passed to the
/// template.
#[utoipa::path(
    post,
    path = "/api/templates/{template_id}/generate",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(
        ("template_id" = String, Path, description = "Template id"),
        GenerateQuery
    ),
    request_body(content = Object, description = "Template parameters plus optional 'format'"),
    responses(
        (status = 201, description = "Document generated", body = GenerateResponse),
        (status = 400, description = "Validation failed or unsupported format", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown template or missing template resource", body = ErrorResponse),
        (status = 500, description = "Rendering or conversion failed", body = ErrorResponse)
    )
)]
pub async fn generate_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<GenerateQuery>,
    body: web::Json<Map<String, Value>>,
) -> impl Responder {
    let owner_id = match authenticated_user(&req, &state.jwt, state.users.as_ref()).await {
        Ok(user) => user.id,
        Err(e) => return e.error_response(),
    };
    let template_id = path.into_inner();

    let request = match GenerationRequest::from_body(body.into_inner(), query.public.unwrap_or(false))
    {
        Ok(request) => request,
        Err(e) => return HttpResponse::from(e),
    };

    match state.pipeline.generate(&template_id, request, owner_id).await {
        Ok(outcome) => HttpResponse::Created().json(GenerateResponse::from(outcome)),
        Err(e) => {
            log::warn!("Generation of '{}' failed: {}", template_id, e);
            HttpResponse::from(e)
        }
    }
}

/// Configure template routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/templates").route(web::post().to(upload_schema)))
        .service(
            web::resource("/templates/resources").route(web::post().to(upload_template_resource)),
        )
        .service(
            web::resource("/templates/{template_id}/parameters")
                .route(web::get().to(get_template_parameters)),
        )
        .service(
            web::resource("/templates/{template_id}/generate")
                .route(web::post().to(generate_document)),
        );
}
